// src/ingest/types.rs
use anyhow::Result;

use crate::model::RawUpdate;

/// Seam to the news-fetching collaborator. Production uses the RSS fetcher;
/// tests plug in fixtures or failing mocks.
#[async_trait::async_trait]
pub trait UpdateFetcher: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<RawUpdate>>;
    fn name(&self) -> &'static str;
}
