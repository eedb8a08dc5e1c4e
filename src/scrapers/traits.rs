use crate::error::FetchError;
use crate::models::Listing;
use crate::scrapers::types::SearchParams;
use async_trait::async_trait;

/// Common trait for listing sources
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch every listing currently matching the search, in site order
    async fn fetch(&self, params: &SearchParams) -> Result<Vec<Listing>, FetchError>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
