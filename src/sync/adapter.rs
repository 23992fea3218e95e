use super::refresher::StalenessRefresher;
use crate::error::StoreError;
use crate::item::Item;
use crate::lifecycle::ItemLifecycle;
use crate::store::{DocumentStore, RawDocument};
use crate::token::ListToken;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Whether any document exists under `list`. A brand-new token has none.
pub async fn collection_has_documents(
    store: &dyn DocumentStore,
    list: &ListToken,
) -> Result<bool, StoreError> {
    Ok(store.count(list.as_str()).await? > 0)
}

/// Decode a full snapshot into the visible items, dropping the hidden
/// placeholder and anything malformed.
pub fn snapshot_items(docs: Vec<RawDocument>) -> Vec<Item> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Item::from_document(doc) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping malformed document {}: {}", id, e);
                    None
                }
            }
        })
        .filter(|item| !item.hidden)
        .collect()
}

/// Live view of lists backed by the store's change stream.
#[derive(Clone)]
pub struct ListSync {
    lifecycle: ItemLifecycle,
}

impl ListSync {
    pub fn new(lifecycle: ItemLifecycle) -> Self {
        Self { lifecycle }
    }

    pub async fn collection_has_documents(&self, list: &ListToken) -> Result<bool, StoreError> {
        collection_has_documents(self.lifecycle.store().as_ref(), list).await
    }

    /// Deliver the current items of `list` to `on_change` now and after
    /// every change, until the returned subscription ends.
    ///
    /// Each delivery is the complete visible set, unordered, and replaces
    /// whatever the consumer held before.
    pub fn subscribe<F>(&self, list: ListToken, mut on_change: F) -> Subscription
    where
        F: FnMut(Vec<Item>) + Send + 'static,
    {
        let store = self.lifecycle.store().clone();
        // Subscribe before the first read so nothing slips in between.
        let mut changes = store.changes();
        let mut refresher = StalenessRefresher::new(self.lifecycle.clone(), list.clone());

        info!("Subscribing to list {}", list);
        let task = tokio::spawn(async move {
            loop {
                match store.get_all(list.as_str()).await {
                    Ok(docs) => {
                        let items = snapshot_items(docs);
                        debug!("Delivering {} items for list {}", items.len(), list);
                        on_change(items);
                        refresher.rearm();
                    }
                    Err(e) => error!("Failed to read list {}: {}", list, e),
                }

                loop {
                    match changes.recv().await {
                        Ok(collection) if collection == list.as_str() => break,
                        Ok(_) => continue,
                        Err(RecvError::Lagged(missed)) => {
                            debug!("Missed {} change notifications, re-reading", missed);
                            break;
                        }
                        Err(RecvError::Closed) => {
                            info!("Change stream for list {} closed", list);
                            return;
                        }
                    }
                }
            }
        });

        Subscription { task: Some(task) }
    }
}

/// Handle to a running list subscription. Dropping it unsubscribes.
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Stop delivery and the refresh timer. Safe to call more than once.
    pub fn unsubscribe(&mut self) {
        if let Some(task) = self.task.take() {
            // The refresher lives inside the task and is cancelled on drop.
            task.abort();
            debug!("Subscription ended");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
