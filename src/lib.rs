//! Shared shopping list that predicts when each item will be needed again
//! and keeps a live, urgency-ranked view of the list.

pub mod config;
pub mod dates;
pub mod error;
pub mod estimate;
pub mod identity;
pub mod item;
pub mod lifecycle;
pub mod rank;
pub mod store;
pub mod sync;
pub mod token;

pub use dates::{days_between, future_date, Clock, FixedClock, SystemClock};
pub use error::{ListError, StoreError};
pub use estimate::{IntervalEstimator, PurchaseEstimate, WeightedAverageEstimator};
pub use identity::{bootstrap_identity, IdentityProvider};
pub use item::Item;
pub use lifecycle::{AddItemOutcome, ForceRefreshOutcome, ItemLifecycle};
pub use rank::{filter_by_name, rank, rank_at, Urgency};
pub use store::{DocumentStore, SqliteStore};
pub use sync::{collection_has_documents, ListSync, Subscription};
pub use token::ListToken;
