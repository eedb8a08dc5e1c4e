use serde::{Deserialize, Serialize};

/// One classified ad as it was shown on the site at scrape time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Listing {
    /// Permalink of the ad, unique within a snapshot
    pub url: String,
    pub title: String,
    pub description: String,
    /// Asking price in euros, `None` when the ad has no numeric price
    pub price: Option<u64>,
    /// Creation time as printed by the site
    pub created: String,
    /// Edit time, only present when the ad has been modified
    #[serde(default)]
    pub updated: Option<String>,
}

/// All ads matching the search at one point in time, in site order
pub type Snapshot = Vec<Listing>;

/// Decode a persisted snapshot blob
pub fn decode_snapshot(bytes: &[u8]) -> serde_json::Result<Snapshot> {
    serde_json::from_slice(bytes)
}

/// Encode a snapshot for persistence.
///
/// Goes through `serde_json::Value` so object keys come out sorted and the
/// stored blob is byte-stable for identical snapshots.
pub fn encode_snapshot(snapshot: &[Listing]) -> serde_json::Result<Vec<u8>> {
    let value = serde_json::to_value(snapshot)?;
    serde_json::to_vec(&value)
}
