// src/repo/tokenscript_org.rs — TokenScript repository server source

use async_trait::async_trait;
use reqwest::Url;

use super::{download, DefinitionFetcher};
use crate::core::types::{DefinitionBlob, Identifier};
use crate::infra::errors::EngineError;

/// Serves definitions from `{server}{schema}/{id}`.
pub struct RepoServerSource {
    client: reqwest::Client,
    server: String,
    schema: String,
}

impl RepoServerSource {
    pub fn new(client: reqwest::Client, server: &str, schema: &str) -> Self {
        Self {
            client,
            server: server.trim_end_matches('/').to_string(),
            schema: schema.trim_matches('/').to_string(),
        }
    }

    /// The identifier becomes a single path segment, so reserved characters
    /// in it are percent-encoded.
    pub fn definition_url(&self, id: &Identifier) -> Result<Url, EngineError> {
        let mut url = schema_base(&self.server, &self.schema)?;
        push_segments(&mut url, [id.as_str()])?;
        Ok(url)
    }
}

/// `{server}/{schema}` with exactly one separator between the parts.
pub fn schema_base(server: &str, schema: &str) -> Result<Url, EngineError> {
    let mut url = Url::parse(server)
        .map_err(|e| EngineError::Config(format!("invalid repo server '{server}': {e}")))?;
    push_segments(&mut url, schema.split('/').filter(|s| !s.is_empty()))?;
    Ok(url)
}

fn push_segments<'a>(
    url: &mut Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Result<(), EngineError> {
    let as_text = url.to_string();
    url.path_segments_mut()
        .map_err(|()| EngineError::Config(format!("'{as_text}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(())
}

#[async_trait]
impl DefinitionFetcher for RepoServerSource {
    fn id(&self) -> &str {
        "tokenscript_org"
    }

    async fn fetch(&self, id: &Identifier) -> Result<DefinitionBlob, EngineError> {
        let url = self.definition_url(id)?;
        tracing::debug!("Requesting definition from {url}");
        download(&self.client, self.id(), url.as_str()).await
    }
}
