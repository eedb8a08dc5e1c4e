//! Watches the muusikoiden.net tori for new ads and alerts over Telegram.

pub mod config;
pub mod error;
pub mod job;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod scrapers;
pub mod store;

pub use config::{Config, RunConfig};
pub use error::{DeliveryError, FetchError, RunError, StorageError};
pub use job::{run_once, DeliveryFailure, RunOutcome};
pub use models::{Listing, Snapshot};
pub use reconcile::{reconcile, Reconciliation};
