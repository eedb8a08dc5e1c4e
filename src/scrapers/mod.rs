pub mod tori;
pub mod traits;
pub mod types;

pub use tori::{parse_listings, ToriScraper};
pub use traits::Fetcher;
pub use types::SearchParams;
