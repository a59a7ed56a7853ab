// src/metadata/opensea.rs — OpenSea-style asset API client

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Url;
use serde::Deserialize;

use super::MetadataFetcher;
use crate::core::token::TokenContext;
use crate::core::types::Metadata;
use crate::infra::errors::EngineError;

const SOURCE: &str = "opensea";

pub struct OpenSeaFetcher {
    client: reqwest::Client,
    base_url: String,
    token_id: String,
    api_key: Option<String>,
}

/// Subset of the asset payload the engine cares about.
#[derive(Debug, Deserialize)]
pub struct AssetResponse {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl AssetResponse {
    pub fn into_metadata(self) -> Result<Metadata, EngineError> {
        let name = non_empty(self.name)
            .ok_or_else(|| EngineError::fetch(SOURCE, "asset response has no name"))?;
        let image_url = non_empty(self.image_url)
            .ok_or_else(|| EngineError::fetch(SOURCE, "asset response has no image_url"))?;
        Ok(Metadata::new(name, image_url))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl OpenSeaFetcher {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        token_id: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            api_key,
        }
    }

    /// `{base}/asset/{contract}/{token_id}/` with each part as one encoded
    /// path segment.
    pub fn asset_url(&self, contract: &str) -> Result<Url, EngineError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            EngineError::Config(format!("invalid metadata base url '{}': {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                EngineError::Config(format!("'{}' cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(["asset", contract, self.token_id.as_str(), ""]);
        Ok(url)
    }
}

#[async_trait]
impl MetadataFetcher for OpenSeaFetcher {
    fn id(&self) -> &str {
        SOURCE
    }

    async fn fetch(&self, token: &TokenContext) -> Result<Metadata, EngineError> {
        let url = self.asset_url(token.id().as_str())?;
        tracing::debug!("Requesting metadata from {url}");

        let mut request = self.client.get(url.as_str()).header(ACCEPT, "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| EngineError::fetch(SOURCE, format!("Cannot reach {url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(EngineError::fetch(
                SOURCE,
                format!("{url} returned HTTP {status}: {snippet}"),
            ));
        }

        let asset: AssetResponse = resp
            .json()
            .await
            .map_err(|e| EngineError::fetch(SOURCE, format!("Invalid asset JSON: {e}")))?;
        tracing::debug!(
            token_id = asset.token_id.as_deref().unwrap_or("?"),
            "Asset metadata received"
        );
        asset.into_metadata()
    }
}
