// src/metadata/mod.rs — Remote metadata sources

pub mod opensea;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::token::TokenContext;
use crate::core::types::Metadata;
use crate::infra::config::MetadataConfig;
use crate::infra::errors::EngineError;

pub use opensea::OpenSeaFetcher;

/// Fetches display metadata for a resolved token. Retry policy, if any,
/// belongs to the implementation.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch(&self, token: &TokenContext) -> Result<Metadata, EngineError>;
}

/// Build the configured metadata client.
pub fn build_metadata_fetcher(
    config: &MetadataConfig,
) -> Result<Arc<dyn MetadataFetcher>, EngineError> {
    let client = crate::repo::http_client(Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(OpenSeaFetcher::new(
        client,
        &config.base_url,
        &config.token_id,
        config.api_key.clone(),
    )))
}
