//! Next-purchase prediction for a single item.

use crate::dates::{days_between, future_date_from};
use crate::item::Item;
use chrono::{DateTime, Utc};

/// The replenishment formula: previous interval, days since the last
/// purchase (or creation) and the new purchase count in, days until the
/// next purchase out. Must be deterministic.
pub trait IntervalEstimator: Send + Sync {
    fn estimate(
        &self,
        last_estimated_interval: i64,
        days_since_last_transaction: i64,
        total_purchases: i64,
    ) -> i64;
}

impl<F> IntervalEstimator for F
where
    F: Fn(i64, i64, i64) -> i64 + Send + Sync,
{
    fn estimate(
        &self,
        last_estimated_interval: i64,
        days_since_last_transaction: i64,
        total_purchases: i64,
    ) -> i64 {
        self(
            last_estimated_interval,
            days_since_last_transaction,
            total_purchases,
        )
    }
}

/// Running mean of the observed purchase intervals, seeded with the
/// user's original guess. Never predicts less than one day.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedAverageEstimator;

impl IntervalEstimator for WeightedAverageEstimator {
    fn estimate(
        &self,
        last_estimated_interval: i64,
        days_since_last_transaction: i64,
        total_purchases: i64,
    ) -> i64 {
        if total_purchases <= 0 {
            return last_estimated_interval.max(1);
        }
        let n = total_purchases as f64;
        let blended = (last_estimated_interval as f64 * (n - 1.0)
            + days_since_last_transaction as f64)
            / n;
        (blended.round() as i64).max(1)
    }
}

/// The three values handed to the estimator for one purchase event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateInputs {
    pub last_estimated_interval: i64,
    pub days_since_last_transaction: i64,
    pub new_total_purchases: i64,
}

impl EstimateInputs {
    /// Inputs for a purchase of `item` happening at `now`.
    ///
    /// The reference point is the previous purchase, or the creation date
    /// when the item has never been bought.
    pub fn for_purchase(item: &Item, now: DateTime<Utc>) -> Self {
        let reference = item.date_last_purchased.unwrap_or(item.date_created);
        Self {
            last_estimated_interval: days_between(item.date_next_purchased, reference),
            days_since_last_transaction: days_between(now, reference),
            new_total_purchases: i64::from(item.total_purchases) + 1,
        }
    }
}

/// Result of running the estimator for one purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseEstimate {
    pub inputs: EstimateInputs,
    pub days_until_next_purchase: i64,
    pub date_next_purchased: DateTime<Utc>,
}

pub fn estimate_next_purchase(
    estimator: &dyn IntervalEstimator,
    item: &Item,
    now: DateTime<Utc>,
) -> PurchaseEstimate {
    let inputs = EstimateInputs::for_purchase(item, now);
    let days_until_next_purchase = estimator.estimate(
        inputs.last_estimated_interval,
        inputs.days_since_last_transaction,
        inputs.new_total_purchases,
    );

    PurchaseEstimate {
        inputs,
        days_until_next_purchase,
        date_next_purchased: future_date_from(now, days_until_next_purchase as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_first_purchase_uses_creation_date() {
        let item = Item::new("Milk", created(), created() + Duration::days(7), false);
        let now = created() + Duration::days(10);

        let inputs = EstimateInputs::for_purchase(&item, now);
        assert_eq!(
            inputs,
            EstimateInputs {
                last_estimated_interval: 7,
                days_since_last_transaction: 10,
                new_total_purchases: 1,
            }
        );
    }

    #[test]
    fn test_later_purchase_uses_previous_purchase_date() {
        let mut item = Item::new("Milk", created(), created() + Duration::days(20), false);
        item.date_last_purchased = Some(created() + Duration::days(12));
        item.total_purchases = 3;
        let now = created() + Duration::days(19);

        let inputs = EstimateInputs::for_purchase(&item, now);
        assert_eq!(inputs.last_estimated_interval, 8);
        assert_eq!(inputs.days_since_last_transaction, 7);
        assert_eq!(inputs.new_total_purchases, 4);
    }

    #[test]
    fn test_estimate_feeds_future_date() {
        let item = Item::new("Eggs", created(), created() + Duration::days(7), false);
        let now = created() + Duration::days(10);
        let stub = |_: i64, _: i64, _: i64| 5;

        let estimate = estimate_next_purchase(&stub, &item, now);
        assert_eq!(estimate.days_until_next_purchase, 5);
        assert_eq!(estimate.date_next_purchased, now + Duration::days(5));
    }

    #[test]
    fn test_weighted_average() {
        let estimator = WeightedAverageEstimator;
        assert_eq!(estimator.estimate(7, 10, 1), 10);
        assert_eq!(estimator.estimate(10, 4, 2), 7);
        assert_eq!(estimator.estimate(3, 0, 1), 1);
        assert_eq!(estimator.estimate(14, 30, 0), 14);
    }
}
