mod adapter;
pub mod diff;
mod refresher;

pub use adapter::{collection_has_documents, snapshot_items, ListSync, Subscription};
pub use refresher::StalenessRefresher;
