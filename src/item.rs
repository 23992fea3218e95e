use crate::dates::days_between;
use crate::store::{Fields, RawDocument};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Items not bought for this many days drop to the bottom of the list.
pub const INACTIVE_AFTER_DAYS: i64 = 60;

/// One shopping-list entry as delivered by the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned document id. Not part of the document body.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub date_created: DateTime<Utc>,
    pub date_last_purchased: Option<DateTime<Utc>>,
    pub date_next_purchased: DateTime<Utc>,
    pub total_purchases: u32,
    #[serde(default)]
    pub hidden: bool,
}

impl Item {
    /// A never-purchased item as written by `add_item`.
    pub fn new(
        name: impl Into<String>,
        date_created: DateTime<Utc>,
        date_next_purchased: DateTime<Utc>,
        hidden: bool,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            date_created,
            date_last_purchased: None,
            date_next_purchased,
            total_purchases: 0,
            hidden,
        }
    }

    /// Decode a raw store document, attaching its id.
    pub fn from_document(doc: RawDocument) -> Result<Self, serde_json::Error> {
        let mut item: Item = serde_json::from_value(Value::Object(doc.fields))?;
        item.id = doc.id;
        Ok(item)
    }

    /// Document body for this item (everything except the id).
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), Value::String(self.name.clone()));
        fields.insert("dateCreated".to_string(), timestamp(self.date_created));
        fields.insert(
            "dateLastPurchased".to_string(),
            self.date_last_purchased.map_or(Value::Null, timestamp),
        );
        fields.insert(
            "dateNextPurchased".to_string(),
            timestamp(self.date_next_purchased),
        );
        fields.insert(
            "totalPurchases".to_string(),
            Value::from(self.total_purchases),
        );
        fields.insert("hidden".to_string(), Value::Bool(self.hidden));
        fields
    }

    /// Never purchased, or last purchased under [`INACTIVE_AFTER_DAYS`] ago.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.date_last_purchased.map_or(true, |last| {
            now.signed_duration_since(last) < Duration::days(INACTIVE_AFTER_DAYS)
        })
    }

    /// Whole days until the predicted next purchase; negative when overdue.
    pub fn days_until_next_purchase(&self, now: DateTime<Utc>) -> i64 {
        days_between(self.date_next_purchased, now)
    }

    /// Bought within the last 24 hours, i.e. still shown as checked off.
    pub fn is_recently_purchased(&self, now: DateTime<Utc>) -> bool {
        self.date_last_purchased.map_or(false, |last| {
            let since = now.signed_duration_since(last);
            since >= Duration::zero() && since < Duration::days(1)
        })
    }
}

/// Timestamp encoding used for every date field written to the store.
pub(crate) fn timestamp(value: DateTime<Utc>) -> Value {
    Value::String(value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_from_document_attaches_id() {
        let fields = json!({
            "name": "Milk",
            "dateCreated": "2024-01-01T12:00:00.000Z",
            "dateLastPurchased": null,
            "dateNextPurchased": "2024-01-08T12:00:00.000Z",
            "totalPurchases": 0,
            "hidden": false
        });
        let doc = RawDocument {
            id: "abc".to_string(),
            fields: fields.as_object().cloned().unwrap(),
        };

        let item = Item::from_document(doc).unwrap();
        assert_eq!(item.id, "abc");
        assert_eq!(item.name, "Milk");
        assert_eq!(item.date_last_purchased, None);
        assert_eq!(item.date_next_purchased, day(8));
    }

    #[test]
    fn test_missing_hidden_defaults_to_visible() {
        let fields = json!({
            "name": "Eggs",
            "dateCreated": "2024-01-01T12:00:00Z",
            "dateNextPurchased": "2024-01-02T12:00:00Z",
            "totalPurchases": 3
        });
        let doc = RawDocument {
            id: "e".to_string(),
            fields: fields.as_object().cloned().unwrap(),
        };

        let item = Item::from_document(doc).unwrap();
        assert!(!item.hidden);
        assert_eq!(item.total_purchases, 3);
    }

    #[test]
    fn test_malformed_document_is_rejected() {
        let doc = RawDocument {
            id: "bad".to_string(),
            fields: json!({"name": "Bread"}).as_object().cloned().unwrap(),
        };
        assert!(Item::from_document(doc).is_err());
    }

    #[test]
    fn test_fields_decode_back_to_item() {
        let mut item = Item::new("Coffee", day(1), day(15), false);
        item.date_last_purchased = Some(day(3));
        item.total_purchases = 2;

        let decoded = Item::from_document(RawDocument {
            id: "c".to_string(),
            fields: item.to_fields(),
        })
        .unwrap();

        item.id = "c".to_string();
        assert_eq!(decoded, item);
    }

    #[test]
    fn test_activity_window() {
        let mut item = Item::new("Flour", day(1), day(5), false);
        assert!(item.is_active(day(1) + Duration::days(365)));

        item.date_last_purchased = Some(day(1));
        assert!(item.is_active(day(1) + Duration::days(59)));
        assert!(!item.is_active(day(1) + Duration::days(60)));
    }

    #[test]
    fn test_activity_window_uses_exact_elapsed_time() {
        let mut item = Item::new("Rice", day(1), day(5), false);
        let bought = day(1);
        item.date_last_purchased = Some(bought);

        let just_under = bought + Duration::days(59) + Duration::hours(13);
        assert!(item.is_active(just_under));
        assert!(item.is_active(bought + Duration::days(59) + Duration::hours(23)));
        assert!(item.is_active(bought + Duration::days(60) - Duration::milliseconds(1)));
        assert!(!item.is_active(bought + Duration::days(60)));
    }

    #[test]
    fn test_recently_purchased_window() {
        let mut item = Item::new("Bananas", day(1), day(5), false);
        assert!(!item.is_recently_purchased(day(2)));

        item.date_last_purchased = Some(day(2));
        assert!(item.is_recently_purchased(day(2) + Duration::hours(23)));
        assert!(!item.is_recently_purchased(day(3)));
    }
}
