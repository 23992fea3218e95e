//! Ordering of list items by how soon they need buying.

use crate::item::Item;
use chrono::{DateTime, Utc};
use std::fmt;

/// Coarse urgency bucket shown next to each item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    Overdue,
    Soon,
    KindOfSoon,
    NotSoon,
    Inactive,
}

impl Urgency {
    pub fn of(item: &Item, now: DateTime<Utc>) -> Self {
        if !item.is_active(now) {
            return Urgency::Inactive;
        }
        match item.days_until_next_purchase(now) {
            d if d < 0 => Urgency::Overdue,
            d if d <= 7 => Urgency::Soon,
            d if d <= 30 => Urgency::KindOfSoon,
            _ => Urgency::NotSoon,
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Urgency::Overdue => "overdue",
            Urgency::Soon => "soon",
            Urgency::KindOfSoon => "kind of soon",
            Urgency::NotSoon => "not soon",
            Urgency::Inactive => "inactive",
        };
        f.write_str(label)
    }
}

/// Rank items by purchase urgency as of the current wall-clock time.
pub fn rank(items: Vec<Item>) -> Vec<Item> {
    rank_at(items, Utc::now())
}

/// Active items first, then inactive ones. Each group runs from fewest to
/// most days until the next purchase, ties by case-insensitive name.
pub fn rank_at(items: Vec<Item>, now: DateTime<Utc>) -> Vec<Item> {
    let (mut active, mut inactive): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(|item| item.is_active(now));

    sort_by_days_until_next_purchase(&mut active, now);
    sort_by_days_until_next_purchase(&mut inactive, now);

    active.extend(inactive);
    active
}

fn sort_by_days_until_next_purchase(items: &mut [Item], now: DateTime<Utc>) {
    items.sort_by_cached_key(|item| {
        (
            item.days_until_next_purchase(now),
            item.name.to_lowercase(),
        )
    });
}

/// Items whose name contains `query`, ignoring case. A blank query keeps
/// everything. Order is preserved.
pub fn filter_by_name<'a>(items: &'a [Item], query: &str) -> Vec<&'a Item> {
    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap()
    }

    fn item(name: &str, next_in: i64, last_bought_days_ago: Option<i64>) -> Item {
        let mut item = Item::new(
            name,
            now() - Duration::days(100),
            now() + Duration::days(next_in),
            false,
        );
        item.id = name.to_string();
        item.date_last_purchased = last_bought_days_ago.map(|d| now() - Duration::days(d));
        item.total_purchases = u32::from(last_bought_days_ago.is_some());
        item
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn test_inactive_items_rank_last() {
        let items = vec![
            item("A", 3, Some(2)),
            item("B", 1, None),
            item("C", 2, Some(90)),
        ];
        assert_eq!(names(&rank_at(items, now())), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_bought_just_under_sixty_days_ago_stays_active() {
        let mut nearly_stale = item("Nearly", 9, None);
        nearly_stale.date_last_purchased = Some(now() - Duration::days(59) - Duration::hours(13));
        let items = vec![item("Stale", -5, Some(60)), nearly_stale.clone()];

        assert_eq!(names(&rank_at(items, now())), vec!["Nearly", "Stale"]);
        assert_ne!(Urgency::of(&nearly_stale, now()), Urgency::Inactive);
    }

    #[test]
    fn test_ties_break_on_case_insensitive_name() {
        let items = vec![
            item("banana", 2, None),
            item("Apple", 2, None),
            item("cherry", 2, None),
            item("Zucchini", 1, None),
        ];
        assert_eq!(
            names(&rank_at(items, now())),
            vec!["Zucchini", "Apple", "banana", "cherry"]
        );
    }

    #[test]
    fn test_overdue_items_come_first() {
        let items = vec![item("Later", 5, Some(1)), item("Overdue", -3, Some(20))];
        assert_eq!(names(&rank_at(items, now())), vec!["Overdue", "Later"]);
    }

    #[test]
    fn test_inactive_group_is_sorted_too() {
        let items = vec![
            item("old-b", -10, Some(70)),
            item("fresh", 40, Some(1)),
            item("old-a", -20, Some(61)),
        ];
        assert_eq!(
            names(&rank_at(items, now())),
            vec!["fresh", "old-a", "old-b"]
        );
    }

    #[test]
    fn test_rank_is_idempotent() {
        let items = vec![
            item("d", 4, Some(65)),
            item("c", 0, None),
            item("b", 4, Some(3)),
            item("a", 4, Some(3)),
            item("e", -2, Some(100)),
        ];
        let once = rank_at(items, now());
        let twice = rank_at(once.clone(), now());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rank_does_not_change_contents() {
        let items = vec![item("x", 9, Some(3)), item("y", 1, None)];
        let mut ranked = rank_at(items.clone(), now());
        ranked.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(ranked, items);
    }

    #[test]
    fn test_urgency_buckets() {
        assert_eq!(Urgency::of(&item("a", -1, Some(3)), now()), Urgency::Overdue);
        assert_eq!(Urgency::of(&item("a", 7, None), now()), Urgency::Soon);
        assert_eq!(Urgency::of(&item("a", 8, None), now()), Urgency::KindOfSoon);
        assert_eq!(Urgency::of(&item("a", 31, None), now()), Urgency::NotSoon);
        assert_eq!(Urgency::of(&item("a", 1, Some(60)), now()), Urgency::Inactive);
        assert_eq!(Urgency::KindOfSoon.to_string(), "kind of soon");
    }

    #[test]
    fn test_filter_by_name() {
        let items = vec![
            item("Oat Milk", 1, None),
            item("Bread", 1, None),
            item("milk chocolate", 1, None),
        ];
        assert_eq!(filter_by_name(&items, "MILK").len(), 2);
        assert_eq!(filter_by_name(&items, "  ").len(), 3);
        assert!(filter_by_name(&items, "rice").is_empty());
    }
}
