// src/core/token.rs — TokenHandle: a resolved definition plus its capabilities

use std::fmt;
use std::sync::Arc;

use crate::core::completion::{Callbacks, Continuation, Dispatcher, Outcome, Pending};
use crate::core::types::{DefinitionBlob, Identifier, Metadata};
use crate::infra::errors::EngineError;
use crate::metadata::MetadataFetcher;

/// Where a resolved definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Store,
    Remote,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Store => write!(f, "store"),
            Origin::Remote => write!(f, "remote"),
        }
    }
}

/// What a metadata fetcher gets to see of a token.
#[derive(Debug, Clone)]
pub struct TokenContext {
    id: Identifier,
    definition: DefinitionBlob,
    origin: Origin,
}

impl TokenContext {
    pub fn new(id: Identifier, definition: DefinitionBlob, origin: Origin) -> Self {
        Self {
            id,
            definition,
            origin,
        }
    }

    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn definition(&self) -> &DefinitionBlob {
        &self.definition
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }
}

/// Built once per successful resolution and handed to the caller.
#[derive(Clone)]
pub struct TokenHandle {
    context: TokenContext,
    dispatcher: Dispatcher,
    metadata: Arc<dyn MetadataFetcher>,
}

impl TokenHandle {
    pub(crate) fn new(
        context: TokenContext,
        dispatcher: Dispatcher,
        metadata: Arc<dyn MetadataFetcher>,
    ) -> Self {
        Self {
            context,
            dispatcher,
            metadata,
        }
    }

    pub fn id(&self) -> &Identifier {
        self.context.id()
    }

    pub fn definition(&self) -> &DefinitionBlob {
        self.context.definition()
    }

    pub fn origin(&self) -> Origin {
        self.context.origin()
    }

    pub fn context(&self) -> &TokenContext {
        &self.context
    }

    /// Start the metadata fetch on the worker runtime.
    pub fn fetch_metadata(&self) -> Pending<Metadata> {
        let context = self.context.clone();
        let fetcher = self.metadata.clone();
        self.dispatcher.spawn("fetch_metadata", async move {
            tracing::debug!(source = fetcher.id(), "Fetching metadata for {}", context.id());
            fetcher.fetch(&context).await
        })
    }

    /// Fetch metadata; exactly one of the two callbacks runs on the
    /// response context.
    pub fn test_http<S, E>(&self, on_success: S, on_error: E)
    where
        S: FnOnce(Metadata) + Send + 'static,
        E: FnOnce(EngineError) + Send + 'static,
    {
        self.test_http_with(Callbacks::new(on_success, on_error));
    }

    /// Fetch metadata; `continuation` is resumed once on the response context.
    pub fn test_http_with(&self, continuation: impl Continuation<Metadata>) {
        self.dispatcher
            .deliver(self.fetch_metadata(), Box::new(continuation));
    }

    pub async fn metadata(&self) -> Outcome<Metadata> {
        self.fetch_metadata().await
    }
}

impl fmt::Debug for TokenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenHandle")
            .field("id", self.context.id())
            .field("origin", &self.context.origin())
            .field("definition", self.context.definition())
            .field("metadata", &self.metadata.id())
            .finish()
    }
}
