//! Writes against a list: add, purchase, remove, refresh and list creation.

use crate::dates::{future_date_from, Clock, SystemClock};
use crate::error::{ListError, StoreError};
use crate::estimate::{
    estimate_next_purchase, IntervalEstimator, PurchaseEstimate, WeightedAverageEstimator,
};
use crate::item::{timestamp, Item};
use crate::store::{DocumentStore, Fields, ListMeta};
use crate::sync::collection_has_documents;
use crate::token::ListToken;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the hidden document that carries the refresh trigger.
pub const PLACEHOLDER_NAME: &str = "placeholder";

const CREATE_LIST_ATTEMPTS: usize = 5;

/// Outcome of [`ItemLifecycle::add_item`]. Store failures land here instead
/// of in an `Err` so callers can show them inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddItemOutcome {
    Added { id: String },
    Failed { error: String },
}

impl AddItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AddItemOutcome::Added { .. })
    }
}

/// What [`ItemLifecycle::force_refresh`] found and touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForceRefreshOutcome {
    Touched { id: String },
    NoPlaceholder,
    Ambiguous { touched: String, found: usize },
}

#[derive(Clone)]
pub struct ItemLifecycle {
    store: Arc<dyn DocumentStore>,
    estimator: Arc<dyn IntervalEstimator>,
    clock: Arc<dyn Clock>,
    refresh_period: std::time::Duration,
}

impl ItemLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            estimator: Arc::new(WeightedAverageEstimator),
            clock: Arc::new(SystemClock),
            refresh_period: std::time::Duration::from_secs(24 * 60 * 60),
        }
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn IntervalEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_refresh_period(mut self, period: std::time::Duration) -> Self {
        self.refresh_period = period;
        self
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn refresh_period(&self) -> std::time::Duration {
        self.refresh_period
    }

    /// Add a never-purchased item due in `days_until_next_purchase` days.
    pub async fn add_item(
        &self,
        list: &ListToken,
        name: &str,
        days_until_next_purchase: i64,
        hidden: bool,
    ) -> Result<AddItemOutcome, ListError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ListError::EmptyName);
        }

        let now = self.clock.now();
        let item = Item::new(
            name,
            now,
            future_date_from(now, days_until_next_purchase as f64),
            hidden,
        );

        match self.store.create(list.as_str(), item.to_fields()).await {
            Ok(id) => {
                info!("Added {} to list {}", name, list);
                Ok(AddItemOutcome::Added { id })
            }
            Err(e) => {
                warn!("Failed to add {} to list {}: {}", name, list, e);
                Ok(AddItemOutcome::Failed {
                    error: e.to_string(),
                })
            }
        }
    }

    /// Record a purchase of `item` now and reschedule its next purchase.
    pub async fn record_purchase(
        &self,
        list: &ListToken,
        item: &Item,
    ) -> Result<PurchaseEstimate, ListError> {
        let now = self.clock.now();
        let estimate = estimate_next_purchase(self.estimator.as_ref(), item, now);

        let mut patch = Fields::new();
        patch.insert("dateLastPurchased".to_string(), timestamp(now));
        patch.insert(
            "totalPurchases".to_string(),
            Value::from(estimate.inputs.new_total_purchases),
        );
        patch.insert(
            "dateNextPurchased".to_string(),
            timestamp(estimate.date_next_purchased),
        );

        self.store.update(list.as_str(), &item.id, patch).await?;

        info!(
            "Recorded purchase of {} (#{}), next in {} days",
            item.name, estimate.inputs.new_total_purchases, estimate.days_until_next_purchase
        );
        debug!("Estimator inputs for {}: {:?}", item.id, estimate.inputs);
        Ok(estimate)
    }

    pub async fn remove_item(&self, list: &ListToken, id: &str) -> Result<(), ListError> {
        self.store.delete(list.as_str(), id).await?;
        info!("Removed item {} from list {}", id, list);
        Ok(())
    }

    /// Push the hidden placeholder's next-purchase date to tomorrow and
    /// stamp the list metadata, so every subscriber re-ranks.
    ///
    /// With no placeholder only the metadata is stamped. With several, the
    /// first one in store order is touched.
    pub async fn force_refresh(
        &self,
        list: &ListToken,
    ) -> Result<ForceRefreshOutcome, ListError> {
        let now = self.clock.now();
        let hidden = self
            .store
            .query_eq(list.as_str(), "hidden", &Value::Bool(true))
            .await?;

        let outcome = match hidden.as_slice() {
            [] => {
                warn!("List {} has no hidden placeholder; only stamping metadata", list);
                ForceRefreshOutcome::NoPlaceholder
            }
            [only] => {
                self.touch_placeholder(list, &only.id, now).await?;
                ForceRefreshOutcome::Touched {
                    id: only.id.clone(),
                }
            }
            [first, ..] => {
                warn!(
                    "List {} has {} hidden placeholders; refreshing {}",
                    list,
                    hidden.len(),
                    first.id
                );
                self.touch_placeholder(list, &first.id, now).await?;
                ForceRefreshOutcome::Ambiguous {
                    touched: first.id.clone(),
                    found: hidden.len(),
                }
            }
        };

        self.store
            .put_meta(
                list.as_str(),
                ListMeta {
                    last_refreshed: now,
                    next_refresh_due: self.next_refresh_due(now),
                },
            )
            .await?;

        info!("Refreshed list {}", list);
        Ok(outcome)
    }

    async fn touch_placeholder(
        &self,
        list: &ListToken,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut patch = Fields::new();
        patch.insert(
            "dateNextPurchased".to_string(),
            timestamp(future_date_from(now, 1.0)),
        );
        self.store.update(list.as_str(), id, patch).await
    }

    /// Start a new list under a fresh token, seeded with its hidden
    /// placeholder and refresh metadata.
    pub async fn create_list(&self) -> Result<ListToken, ListError> {
        let mut token = ListToken::generate();
        for _ in 1..CREATE_LIST_ATTEMPTS {
            if !collection_has_documents(self.store.as_ref(), &token).await? {
                break;
            }
            debug!("Token {} already in use, drawing another", token);
            token = ListToken::generate();
        }

        let now = self.clock.now();
        let placeholder = Item::new(PLACEHOLDER_NAME, now, future_date_from(now, 1.0), true);
        self.store
            .create(token.as_str(), placeholder.to_fields())
            .await?;
        self.store
            .put_meta(
                token.as_str(),
                ListMeta {
                    last_refreshed: now,
                    next_refresh_due: self.next_refresh_due(now),
                },
            )
            .await?;

        info!("Created list {}", token);
        Ok(token)
    }

    /// Join the configured list, or start a new one when that is allowed
    /// and there is no list to join.
    pub async fn open_list(
        &self,
        token: Option<&str>,
        create_if_missing: bool,
    ) -> Result<ListToken, ListError> {
        match token.filter(|t| !t.trim().is_empty()) {
            Some(raw) => match self.join_list(raw).await {
                Err(ListError::ListNotFound(missing)) if create_if_missing => {
                    warn!("List {} does not exist, creating a new one", missing);
                    self.create_list().await
                }
                joined => joined,
            },
            None if create_if_missing => self.create_list().await,
            None => Err(ListError::InvalidToken(
                "no list token configured".to_string(),
            )),
        }
    }

    /// Validate a token somebody shared and make sure the list exists.
    pub async fn join_list(&self, raw: &str) -> Result<ListToken, ListError> {
        let token = ListToken::parse(raw)?;
        if !collection_has_documents(self.store.as_ref(), &token).await? {
            return Err(ListError::ListNotFound(token.to_string()));
        }
        info!("Joined list {}", token);
        Ok(token)
    }

    /// `now` plus the refresh period, pinned to the latest representable
    /// time when the period is too large to add.
    fn next_refresh_due(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        Duration::from_std(self.refresh_period)
            .ok()
            .and_then(|period| now.checked_add_signed(period))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
