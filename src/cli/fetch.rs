// src/cli/fetch.rs — `tsengine fetch`: the demonstration pipeline

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use super::FetchStyle;
use crate::core::completion::Outcome;
use crate::core::engine::Engine;
use crate::core::response::{ResponseContext, ResultSink};
use crate::core::token::TokenHandle;
use crate::core::types::{Identifier, Metadata};
use crate::infra::config::Config;
use crate::infra::errors::EngineError;

type Done = Arc<Mutex<Option<oneshot::Sender<Result<(), EngineError>>>>>;

/// Resolve `id`, fetch its metadata and print it. Callback styles are driven
/// by a response loop on the calling task.
pub async fn run_fetch(config: &Config, id: &str, style: FetchStyle) -> anyhow::Result<()> {
    let id = Identifier::parse(id)?;
    let (response, mut response_loop) = ResponseContext::channel("main");
    let engine = Engine::from_config(config, Handle::current(), response)
        .context("Cannot start the engine")?;
    let sink: Arc<dyn ResultSink> = Arc::new(print_metadata);

    let (tx, rx) = oneshot::channel();
    let done: Done = Arc::new(Mutex::new(Some(tx)));
    match style {
        FetchStyle::Callbacks => with_callbacks(&engine, id, sink, done),
        FetchStyle::Continuation => with_continuation(&engine, id, sink, done),
        FetchStyle::Await => {
            let handle = engine.token_script(id).await?;
            describe(&handle);
            let metadata = handle.metadata().await?;
            sink.deliver(&metadata.name, &metadata.image_url);
            return Ok(());
        }
    }

    match response_loop.run_until(rx).await {
        Some(Ok(result)) => Ok(result?),
        Some(Err(_)) => anyhow::bail!("pipeline finished without reporting a result"),
        None => anyhow::bail!("response loop closed before the pipeline finished"),
    }
}

fn with_callbacks(engine: &Engine, id: Identifier, sink: Arc<dyn ResultSink>, done: Done) {
    let failed = done.clone();
    engine.get_token_script(
        id,
        move |handle: TokenHandle| {
            describe(&handle);
            let failed = done.clone();
            handle.test_http(
                move |metadata: Metadata| {
                    sink.deliver(&metadata.name, &metadata.image_url);
                    finish(&done, Ok(()));
                },
                move |e: EngineError| finish(&failed, Err(e)),
            );
        },
        move |e: EngineError| finish(&failed, Err(e)),
    );
}

fn with_continuation(engine: &Engine, id: Identifier, sink: Arc<dyn ResultSink>, done: Done) {
    engine.get_token_script_with(id, move |outcome: Outcome<TokenHandle>| match outcome {
        Ok(handle) => {
            describe(&handle);
            handle.test_http_with(move |outcome: Outcome<Metadata>| {
                let result = outcome.map(|m| sink.deliver(&m.name, &m.image_url));
                finish(&done, result);
            });
        }
        Err(e) => finish(&done, Err(e)),
    });
}

fn finish(done: &Done, result: Result<(), EngineError>) {
    let sender = done
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    if let Some(tx) = sender {
        let _ = tx.send(result);
    }
}

fn describe(handle: &TokenHandle) {
    println!(
        "Definition for {} ({} bytes, from {})",
        handle.id(),
        handle.definition().len(),
        handle.origin()
    );
}

fn print_metadata(name: &str, image_url: &str) {
    println!("  Name:   {name}");
    println!("  Image:  {image_url}");
}
