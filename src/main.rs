use anyhow::{Context, Result};
use smart_shopping_list::config::Config;
use smart_shopping_list::sync::diff::{detect_changes, SnapshotChange};
use smart_shopping_list::{
    bootstrap_identity, rank, Item, ItemLifecycle, ListSync, ListToken, SqliteStore, Urgency,
};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting smart shopping list watcher");
    info!("Database path: {}", config.store.database_path);

    let store = Arc::new(
        SqliteStore::new(&config.store.database_path)
            .await
            .context("Failed to open document store")?,
    );
    info!("Store opened");

    bootstrap_identity(store.as_ref()).await;

    let lifecycle =
        ItemLifecycle::new(store.clone()).with_refresh_period(config.refresh.interval());

    let list = lifecycle
        .open_list(config.list.token.as_deref(), config.list.create_if_missing)
        .await
        .context("Failed to open list")?;
    info!("Want to share your list? Your list token is: {}", list);

    let sync = ListSync::new(lifecycle);
    let mut previous: Vec<Item> = Vec::new();
    let watched = list.clone();
    let mut subscription = sync.subscribe(list, move |items| {
        report_snapshot(&watched, &previous, &items);
        previous = items;
    });

    info!("Watching for changes");
    info!("Press Ctrl+C to stop");

    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(err) => {
            error!("Unable to listen for shutdown signal: {}", err);
        }
    }

    subscription.unsubscribe();
    store.close().await;

    info!("Watcher stopped");
    Ok(())
}

/// Log what changed since the last snapshot and the freshly ranked list.
fn report_snapshot(list: &ListToken, previous: &[Item], current: &[Item]) {
    for change in detect_changes(previous, current) {
        match change {
            SnapshotChange::ItemAdded { name, .. } => info!("{} added", name),
            SnapshotChange::ItemRemoved { name, .. } => info!("{} removed", name),
            SnapshotChange::ItemPurchased {
                name,
                total_purchases,
                ..
            } => info!("{} purchased ({} total)", name, total_purchases),
            SnapshotChange::ItemRenamed { old, new, .. } => info!("{} renamed to {}", old, new),
        }
    }

    let now = chrono::Utc::now();
    let ranked = rank(current.to_vec());
    if ranked.is_empty() {
        info!("There are currently no items in list {}", list);
        return;
    }

    info!("List {} ({} items):", list, ranked.len());
    for item in &ranked {
        let check = if item.is_recently_purchased(now) { "x" } else { " " };
        info!(
            "[{}] {} - {} ({} days)",
            check,
            item.name,
            Urgency::of(item, now),
            item.days_until_next_purchase(now)
        );
        debug!("{:?}", item);
    }
}
