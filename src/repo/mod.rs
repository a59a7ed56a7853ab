// src/repo/mod.rs — Remote definition sources

pub mod eth_rpc;
pub mod script_uri;
pub mod tokenscript_org;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::config::{RepoConfig, RpcConfig};
use crate::infra::errors::EngineError;

pub use eth_rpc::EthRpcClient;
pub use script_uri::ScriptUriSource;
pub use tokenscript_org::RepoServerSource;

/// Retrieves a definition blob from a remote origin.
#[async_trait]
pub trait DefinitionFetcher: Send + Sync {
    fn id(&self) -> &str;

    async fn fetch(&self, id: &Identifier) -> Result<DefinitionBlob, EngineError>;
}

/// Ordered list of sources; the first one that succeeds wins.
pub struct SourceChain {
    sources: Vec<Arc<dyn DefinitionFetcher>>,
}

impl SourceChain {
    pub fn new(sources: Vec<Arc<dyn DefinitionFetcher>>) -> Self {
        Self { sources }
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[async_trait]
impl DefinitionFetcher for SourceChain {
    fn id(&self) -> &str {
        "chain"
    }

    async fn fetch(&self, id: &Identifier) -> Result<DefinitionBlob, EngineError> {
        let mut attempts = Vec::new();
        for source in &self.sources {
            match source.fetch(id).await {
                Ok(blob) => {
                    tracing::info!(
                        source = source.id(),
                        bytes = blob.len(),
                        "Fetched definition for {id}"
                    );
                    return Ok(blob);
                }
                Err(e) => {
                    tracing::warn!(source = source.id(), "Source failed, trying next: {e}");
                    attempts.push(format!("{}: {e}", source.id()));
                }
            }
        }

        if attempts.is_empty() {
            attempts.push("no sources configured".into());
        }
        Err(EngineError::SourcesExhausted {
            id: id.to_string(),
            attempts: attempts.join("; "),
        })
    }
}

/// Shared HTTP client with the repo timeout applied.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, EngineError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("tsengine/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| EngineError::Config(format!("Cannot build HTTP client: {e}")))
}

/// Build the configured source chain. Unknown source names are a config error.
pub fn build_sources(repo: &RepoConfig, rpc: &RpcConfig) -> Result<SourceChain, EngineError> {
    let client = http_client(Duration::from_secs(repo.timeout_secs))?;
    let mut sources: Vec<Arc<dyn DefinitionFetcher>> = Vec::new();
    for name in &repo.sources {
        match name.as_str() {
            "tokenscript_org" => sources.push(Arc::new(RepoServerSource::new(
                client.clone(),
                &repo.server,
                &repo.schema,
            ))),
            "script_uri" => sources.push(Arc::new(ScriptUriSource::new(
                client.clone(),
                EthRpcClient::new(client.clone(), &rpc.url),
                &rpc.ipfs_gateway,
            ))),
            other => {
                return Err(EngineError::Config(format!(
                    "Unknown definition source '{other}' (expected tokenscript_org or script_uri)"
                )))
            }
        }
    }
    Ok(SourceChain::new(sources))
}

/// GET `url` and return the body, failing on non-success status or an empty body.
pub(crate) async fn download(
    client: &reqwest::Client,
    source: &str,
    url: &str,
) -> Result<DefinitionBlob, EngineError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| EngineError::fetch(source, format!("Cannot reach {url}: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(EngineError::fetch(source, format!("{url} returned HTTP {status}")));
    }

    let body = resp
        .bytes()
        .await
        .map_err(|e| EngineError::fetch(source, format!("Reading {url} failed: {e}")))?;
    if body.is_empty() {
        return Err(EngineError::fetch(source, format!("{url} returned an empty body")));
    }
    Ok(DefinitionBlob::from_bytes(body.to_vec()))
}
