use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::error::{DeliveryError, RunError, StorageError};
use crate::models::{decode_snapshot, encode_snapshot, Listing, Snapshot};
use crate::notify::Notifier;
use crate::reconcile::reconcile;
use crate::scrapers::Fetcher;
use crate::store::StateStore;

/// A notification that could not be delivered
#[derive(Debug)]
pub struct DeliveryFailure {
    pub url: String,
    pub error: DeliveryError,
}

/// How a successful run ended
#[derive(Debug)]
pub enum RunOutcome {
    NoNewItems,
    Notified {
        new_items: usize,
        failures: Vec<DeliveryFailure>,
    },
}

/// Run one check cycle: load state, fetch, diff, notify, persist.
///
/// State is written only after every notification was attempted, so a crash
/// in between repeats alerts on the next run rather than losing them.
pub async fn run_once(
    config: &RunConfig,
    fetcher: &dyn Fetcher,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
) -> Result<RunOutcome, RunError> {
    let previous = load_previous(store, &config.state_object).await?;
    info!(count = previous.len(), object = %config.state_object, "Loaded previous snapshot");

    let current = fetcher.fetch(&config.search).await.map_err(|e| {
        error!(source = fetcher.source_name(), "Fetch failed, state left untouched: {e}");
        RunError::Fetch(e)
    })?;

    let changed = previous != current;
    let result = reconcile(&previous, current);

    if result.new_items.is_empty() {
        info!("No new items found");
        if changed {
            // ads vanished or were edited; keep the stored copy in step with the site
            persist(store, &config.state_object, &result.next_state, None).await?;
        }
        return Ok(RunOutcome::NoNewItems);
    }

    info!("{} new items found", result.new_items.len());

    let mut failures = Vec::new();
    for listing in &result.new_items {
        if let Err(e) = notifier.notify(listing, &config.target).await {
            warn!(url = %listing.url, "Notification failed: {e}");
            failures.push(DeliveryFailure {
                url: listing.url.clone(),
                error: e,
            });
        }
    }

    let delivered = result.new_items.len() - failures.len();
    if !failures.is_empty() {
        warn!(
            delivered,
            failed = failures.len(),
            "Partial delivery failure"
        );
    }

    persist(store, &config.state_object, &result.next_state, Some(delivered)).await?;

    info!(delivered, "Notified about {} new items", result.new_items.len());
    Ok(RunOutcome::Notified {
        new_items: result.new_items.len(),
        failures,
    })
}

async fn load_previous(store: &dyn StateStore, name: &str) -> Result<Snapshot, RunError> {
    match store.get(name).await {
        Ok(bytes) => decode_snapshot(&bytes).map_err(|e| {
            error!(object = %name, "Stored snapshot is unreadable: {e}");
            RunError::StateDecode(e)
        }),
        Err(StorageError::NotFound(_)) => {
            info!(object = %name, "No previous snapshot, treating as first run");
            Ok(Vec::new())
        }
        Err(e) => {
            error!(object = %name, "Storage read failed: {e}");
            Err(RunError::StateRead(e))
        }
    }
}

/// `notified` is `None` when the run sent nothing and only refreshes state.
async fn persist(
    store: &dyn StateStore,
    name: &str,
    snapshot: &[Listing],
    notified: Option<usize>,
) -> Result<(), RunError> {
    let bytes = encode_snapshot(snapshot).map_err(RunError::StateEncode)?;

    store.put(name, &bytes).await.map_err(|e| match notified {
        Some(notified) => {
            error!(
                object = %name,
                notified,
                "Storage write failed after notifying, next run may send duplicates: {e}"
            );
            RunError::StateWrite {
                notified,
                source: e,
            }
        }
        None => {
            error!(object = %name, "Storage write failed, no notifications were sent: {e}");
            RunError::StateRefresh(e)
        }
    })?;

    info!(count = snapshot.len(), object = %name, "Saved snapshot");
    Ok(())
}
