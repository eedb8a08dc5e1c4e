use std::collections::HashSet;

use crate::models::{Listing, Snapshot};

/// Result of comparing the current snapshot with the previously stored one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// Listings whose url was not in the previous snapshot, in current order
    pub new_items: Vec<Listing>,
    /// State to persist: the current snapshot, unmerged
    pub next_state: Snapshot,
}

/// Work out which listings are new since the previous run.
///
/// Only the url is compared, so a price or text edit on a known ad is not
/// reported. Ads that vanished from the site are dropped from the next state
/// and count as new again if they come back.
pub fn reconcile(previous: &[Listing], current: Snapshot) -> Reconciliation {
    let mut seen: HashSet<&str> = previous.iter().map(|l| l.url.as_str()).collect();

    let new_items = current
        .iter()
        .filter(|l| seen.insert(l.url.as_str()))
        .cloned()
        .collect();

    Reconciliation {
        new_items,
        next_state: current,
    }
}
