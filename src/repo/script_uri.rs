// src/repo/script_uri.rs — Definition source that asks the token contract itself
//
// Calls `scriptURI()` on the contract named by the identifier, then downloads
// whatever the returned URI points at. `ipfs://` URIs go through a gateway.

use async_trait::async_trait;

use super::eth_rpc::EthRpcClient;
use super::{download, DefinitionFetcher};
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::errors::EngineError;

const SCRIPT_URI_SIGNATURE: &str = "scriptURI()";

pub struct ScriptUriSource {
    client: reqwest::Client,
    rpc: EthRpcClient,
    ipfs_gateway: String,
}

impl ScriptUriSource {
    pub fn new(client: reqwest::Client, rpc: EthRpcClient, ipfs_gateway: &str) -> Self {
        let mut gateway = ipfs_gateway.to_string();
        if !gateway.ends_with('/') {
            gateway.push('/');
        }
        Self {
            client,
            rpc,
            ipfs_gateway: gateway,
        }
    }

    /// Ask the contract where its definition lives.
    pub async fn script_uri(&self, contract: &str) -> Result<String, EngineError> {
        let uri = self.rpc.call_string(contract, SCRIPT_URI_SIGNATURE).await?;
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(EngineError::fetch(
                self.id(),
                format!("{contract} has no scriptURI set"),
            ));
        }
        Ok(ipfs_to_gateway(uri, &self.ipfs_gateway))
    }
}

#[async_trait]
impl DefinitionFetcher for ScriptUriSource {
    fn id(&self) -> &str {
        "script_uri"
    }

    async fn fetch(&self, id: &Identifier) -> Result<DefinitionBlob, EngineError> {
        if !is_contract_address(id.as_str()) {
            return Err(EngineError::fetch(
                self.id(),
                format!("'{id}' is not a contract address"),
            ));
        }
        let url = self.script_uri(id.as_str()).await?;
        tracing::debug!("Contract {id} points at {url}");
        download(&self.client, self.id(), &url).await
    }
}

/// Rewrite `ipfs://<cid>` to `<gateway><cid>`; other URIs pass through.
pub fn ipfs_to_gateway(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(rest) => {
            let rest = rest.strip_prefix("ipfs/").unwrap_or(rest);
            format!("{gateway}{rest}")
        }
        None => uri.to_string(),
    }
}

fn is_contract_address(raw: &str) -> bool {
    raw.strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
