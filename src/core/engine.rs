// src/core/engine.rs — Resolution pipeline: store-or-fetch, then hand out a TokenHandle

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::completion::{Callbacks, Continuation, Dispatcher, Outcome, Pending};
use crate::core::response::{ResponseContext, ResultSink};
use crate::core::token::{Origin, TokenContext, TokenHandle};
use crate::core::types::{DefinitionBlob, Identifier, Metadata};
use crate::infra::config::Config;
use crate::infra::errors::EngineError;
use crate::metadata::{build_metadata_fetcher, MetadataFetcher};
use crate::repo::{build_sources, DefinitionFetcher};
use crate::storage::{open_store, read_async, write_async, DefinitionStore};

/// Composes the definition store, the definition sources and the metadata
/// client. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DefinitionStore>,
    definitions: Arc<dyn DefinitionFetcher>,
    metadata: Arc<dyn MetadataFetcher>,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new(
        store: Arc<dyn DefinitionStore>,
        definitions: Arc<dyn DefinitionFetcher>,
        metadata: Arc<dyn MetadataFetcher>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            store,
            definitions,
            metadata,
            dispatcher,
        }
    }

    /// Wire up store, sources and metadata client from config. I/O runs on
    /// `workers`; completions are posted to `response`.
    pub fn from_config(
        config: &Config,
        workers: Handle,
        response: ResponseContext,
    ) -> Result<Self, EngineError> {
        let store = open_store(&config.store)?;
        let definitions = build_sources(&config.repo, &config.rpc)?;
        tracing::debug!(sources = ?definitions.source_ids(), "Definition sources configured");
        let metadata = build_metadata_fetcher(&config.metadata)?;
        Ok(Self::new(
            store,
            Arc::new(definitions),
            metadata,
            Dispatcher::new(workers, response),
        ))
    }

    pub fn store(&self) -> &Arc<dyn DefinitionStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Start resolving `id` on the worker runtime.
    pub fn resolve(&self, id: Identifier) -> Pending<TokenHandle> {
        let span = tracing::info_span!(
            "resolve",
            id = %id,
            request_id = %Uuid::new_v4()
        );
        let store = self.store.clone();
        let definitions = self.definitions.clone();
        let metadata = self.metadata.clone();
        let dispatcher = self.dispatcher.clone();

        self.dispatcher.spawn(
            "get_token_script",
            async move {
                let (blob, origin) = resolve_definition(store, definitions.as_ref(), &id).await?;
                let context = TokenContext::new(id, blob, origin);
                Ok(TokenHandle::new(context, dispatcher, metadata))
            }
            .instrument(span),
        )
    }

    /// Resolve `id`; exactly one of `on_ready` / `on_error` runs, later, on
    /// the response context.
    pub fn get_token_script<R, E>(&self, id: Identifier, on_ready: R, on_error: E)
    where
        R: FnOnce(TokenHandle) + Send + 'static,
        E: FnOnce(EngineError) + Send + 'static,
    {
        self.get_token_script_with(id, Callbacks::new(on_ready, on_error));
    }

    /// Resolve `id` and resume `continuation` once on the response context.
    pub fn get_token_script_with(
        &self,
        id: Identifier,
        continuation: impl Continuation<TokenHandle>,
    ) {
        self.dispatcher
            .deliver(self.resolve(id), Box::new(continuation));
    }

    pub async fn token_script(&self, id: Identifier) -> Outcome<TokenHandle> {
        self.resolve(id).await
    }

    /// Both stages back to back: resolve the definition, then fetch metadata
    /// with the resulting handle.
    pub fn load_metadata(&self, id: Identifier) -> Pending<Metadata> {
        let resolving = self.resolve(id);
        self.dispatcher.spawn("load_metadata", async move {
            let handle = resolving.await?;
            handle.metadata().await
        })
    }

    /// Run the full pipeline and hand `(name, image_url)` to `sink` on the
    /// response context. Failures of either stage go to `on_error` instead.
    pub fn present<E>(&self, id: Identifier, sink: Arc<dyn ResultSink>, on_error: E)
    where
        E: FnOnce(EngineError) + Send + 'static,
    {
        self.dispatcher.deliver(
            self.load_metadata(id),
            Box::new(Callbacks::new(
                move |metadata: Metadata| sink.deliver(&metadata.name, &metadata.image_url),
                on_error,
            )),
        );
    }
}

/// Store first; on a miss ask the sources and persist what they return.
async fn resolve_definition(
    store: Arc<dyn DefinitionStore>,
    definitions: &dyn DefinitionFetcher,
    id: &Identifier,
) -> Result<(DefinitionBlob, Origin), EngineError> {
    match read_async(store.clone(), id.clone()).await {
        Ok(Some(blob)) => {
            tracing::debug!(bytes = blob.len(), "Store hit");
            return Ok((blob, Origin::Store));
        }
        Ok(None) => tracing::debug!("Store miss"),
        Err(e) => tracing::warn!("Store read failed, fetching remotely: {e}"),
    }

    let blob = definitions.fetch(id).await?;

    match write_async(store.clone(), id.clone(), blob.clone()).await {
        Ok(()) => tracing::info!(
            backend = store.backend(),
            digest = %blob.digest(),
            "Persisted definition"
        ),
        Err(e) => tracing::warn!("Could not persist definition, using it anyway: {e}"),
    }
    Ok((blob, Origin::Remote))
}
