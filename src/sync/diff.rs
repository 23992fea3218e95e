use crate::item::Item;
use std::collections::HashMap;

/// Represents a change between two consecutive snapshots of one list
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotChange {
    /// An item appeared
    ItemAdded { id: String, name: String },
    /// An item disappeared
    ItemRemoved { id: String, name: String },
    /// An item was bought at least once more
    ItemPurchased {
        id: String,
        name: String,
        total_purchases: u32,
    },
    /// An item was renamed
    ItemRenamed { id: String, old: String, new: String },
}

/// Detect changes between the previous and the current snapshot.
///
/// Only used for reporting; consumers always replace their view with the
/// current snapshot.
pub fn detect_changes(previous: &[Item], current: &[Item]) -> Vec<SnapshotChange> {
    let mut changes = Vec::new();

    let previous_map: HashMap<&str, &Item> =
        previous.iter().map(|item| (item.id.as_str(), item)).collect();
    let current_map: HashMap<&str, &Item> =
        current.iter().map(|item| (item.id.as_str(), item)).collect();

    for item in current {
        match previous_map.get(item.id.as_str()) {
            None => changes.push(SnapshotChange::ItemAdded {
                id: item.id.clone(),
                name: item.name.clone(),
            }),
            Some(before) => {
                if item.total_purchases > before.total_purchases {
                    changes.push(SnapshotChange::ItemPurchased {
                        id: item.id.clone(),
                        name: item.name.clone(),
                        total_purchases: item.total_purchases,
                    });
                }
                if item.name != before.name {
                    changes.push(SnapshotChange::ItemRenamed {
                        id: item.id.clone(),
                        old: before.name.clone(),
                        new: item.name.clone(),
                    });
                }
            }
        }
    }

    for item in previous {
        if !current_map.contains_key(item.id.as_str()) {
            changes.push(SnapshotChange::ItemRemoved {
                id: item.id.clone(),
                name: item.name.clone(),
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn create_item(id: &str, name: &str, total_purchases: u32) -> Item {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut item = Item::new(name, created, created, false);
        item.id = id.to_string();
        item.total_purchases = total_purchases;
        item
    }

    #[test]
    fn test_detect_added_item() {
        let changes = detect_changes(&[], &[create_item("item-1", "Milk", 0)]);

        assert_eq!(
            changes,
            vec![SnapshotChange::ItemAdded {
                id: "item-1".to_string(),
                name: "Milk".to_string()
            }]
        );
    }

    #[test]
    fn test_detect_removed_item() {
        let changes = detect_changes(&[create_item("item-1", "Milk", 0)], &[]);

        assert_eq!(changes.len(), 1);
        match &changes[0] {
            SnapshotChange::ItemRemoved { name, .. } => assert_eq!(name, "Milk"),
            _ => panic!("Expected ItemRemoved"),
        }
    }

    #[test]
    fn test_detect_purchase() {
        let changes = detect_changes(
            &[create_item("item-1", "Milk", 1)],
            &[create_item("item-1", "Milk", 2)],
        );

        assert_eq!(changes.len(), 1);
        match &changes[0] {
            SnapshotChange::ItemPurchased {
                total_purchases, ..
            } => assert_eq!(*total_purchases, 2),
            _ => panic!("Expected ItemPurchased"),
        }
    }

    #[test]
    fn test_detect_rename() {
        let changes = detect_changes(
            &[create_item("item-1", "Milk", 0)],
            &[create_item("item-1", "Oat milk", 0)],
        );

        assert_eq!(
            changes,
            vec![SnapshotChange::ItemRenamed {
                id: "item-1".to_string(),
                old: "Milk".to_string(),
                new: "Oat milk".to_string()
            }]
        );
    }

    #[test]
    fn test_no_changes() {
        let items = vec![create_item("item-1", "Milk", 0)];
        assert!(detect_changes(&items, &items).is_empty());
    }

    #[test]
    fn test_multiple_changes() {
        let previous = vec![
            create_item("item-1", "Milk", 0),
            create_item("item-2", "Bread", 0),
        ];
        let current = vec![
            create_item("item-1", "Milk", 1),  // purchased
            create_item("item-3", "Eggs", 0), // added
            // item-2 removed
        ];

        assert_eq!(detect_changes(&previous, &current).len(), 3);
    }
}
