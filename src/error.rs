//! Error types for the collaborators and the run-once job.

/// The listing source could not be read.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to listing source failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing source returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not parse listing page: {0}")]
    Parse(String),
}

/// The state store failed to read or write a blob.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The named object does not exist yet.
    #[error("state object {0} not found")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A notification could not be delivered.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Fatal outcome of a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to read previous state: {0}")]
    StateRead(#[source] StorageError),

    #[error("previous state is not a valid snapshot: {0}")]
    StateDecode(#[source] serde_json::Error),

    #[error("fetching current listings failed: {0}")]
    Fetch(#[from] FetchError),

    /// State refresh without any notifications failed.
    #[error("failed to write state: {0}")]
    StateRefresh(#[source] StorageError),

    #[error("failed to encode snapshot: {0}")]
    StateEncode(#[source] serde_json::Error),

    /// Notifications were already sent; the next run may repeat them.
    #[error("failed to write state after {notified} notification(s): {source}")]
    StateWrite {
        notified: usize,
        #[source]
        source: StorageError,
    },
}

impl RunError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Fetch(_) => 1,
            RunError::StateRead(_)
            | RunError::StateDecode(_)
            | RunError::StateEncode(_)
            | RunError::StateRefresh(_)
            | RunError::StateWrite { .. } => 2,
        }
    }
}
