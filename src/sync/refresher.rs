use crate::lifecycle::ItemLifecycle;
use crate::token::ListToken;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Timer that forces a list refresh after a full period without new data.
///
/// Owned by one subscription. Re-armed on every snapshot and cancelled when
/// dropped.
pub struct StalenessRefresher {
    lifecycle: ItemLifecycle,
    list: ListToken,
    timer: Option<JoinHandle<()>>,
}

impl StalenessRefresher {
    pub fn new(lifecycle: ItemLifecycle, list: ListToken) -> Self {
        Self {
            lifecycle,
            list,
            timer: None,
        }
    }

    /// Cancel any pending timer and start a fresh one.
    pub fn rearm(&mut self) {
        self.cancel();

        let lifecycle = self.lifecycle.clone();
        let list = self.list.clone();
        let period = lifecycle.refresh_period();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(period).await;
            debug!("List {} went {:?} without changes, refreshing", list, period);
            // Detached so re-arming on the resulting snapshot can't cancel
            // a refresh that is already writing.
            tokio::spawn(async move {
                if let Err(e) = lifecycle.force_refresh(&list).await {
                    error!("Scheduled refresh of list {} failed: {}", list, e);
                }
            });
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for StalenessRefresher {
    fn drop(&mut self) {
        self.cancel();
    }
}
