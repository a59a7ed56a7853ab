// src/core/response.rs — Response execution context and result sinks
//
// Completions never run on the worker runtime. They are posted here and run
// by whoever drives the matching ResponseLoop: the caller's own thread
// (a UI or main thread) or a dedicated thread spawned for the purpose.

use std::future::Future;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc;

use crate::core::types::Metadata;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Cloneable handle that schedules jobs onto a response loop.
#[derive(Clone)]
pub struct ResponseContext {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Job>,
}

/// Receiving end of a [`ResponseContext`]. Runs posted jobs in order.
pub struct ResponseLoop {
    name: Arc<str>,
    rx: mpsc::UnboundedReceiver<Job>,
}

impl ResponseContext {
    /// Create a context whose loop the caller drives itself.
    pub fn channel(name: impl Into<String>) -> (ResponseContext, ResponseLoop) {
        let name: Arc<str> = Arc::from(name.into());
        let (tx, rx) = mpsc::unbounded_channel();
        (
            ResponseContext {
                name: name.clone(),
                tx,
            },
            ResponseLoop { name, rx },
        )
    }

    /// Create a context served by a dedicated, named OS thread. The thread
    /// exits once every clone of the returned context has been dropped.
    pub fn spawn_thread(
        name: impl Into<String>,
    ) -> std::io::Result<(ResponseContext, JoinHandle<()>)> {
        let (ctx, response_loop) = Self::channel(name);
        let handle = thread::Builder::new()
            .name(ctx.name.to_string())
            .spawn(move || response_loop.run_blocking())?;
        Ok((ctx, handle))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `job` on the loop. Returns false (and drops the job) when the
    /// loop is gone.
    pub fn post(&self, job: impl FnOnce() + Send + 'static) -> bool {
        if self.tx.send(Box::new(job)).is_err() {
            tracing::warn!(
                context = %self.name,
                "Response loop is gone, completion dropped"
            );
            return false;
        }
        true
    }

    /// True while a loop is still attached.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl ResponseLoop {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run jobs until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.rx.recv().await {
            job();
        }
        tracing::debug!(context = %self.name, "Response loop finished");
    }

    /// Run jobs on the current thread, blocking it. Must not be called from
    /// inside an async runtime.
    pub fn run_blocking(mut self) {
        while let Some(job) = self.rx.blocking_recv() {
            job();
        }
        tracing::debug!(context = %self.name, "Response loop finished");
    }

    /// Run jobs until `stop` resolves or every sender is dropped. Jobs
    /// already queued when `stop` resolves are still run.
    pub async fn run_until<F: Future>(&mut self, stop: F) -> Option<F::Output> {
        tokio::pin!(stop);
        let output = loop {
            tokio::select! {
                biased;
                maybe_job = self.rx.recv() => match maybe_job {
                    Some(job) => job(),
                    None => return None,
                },
                output = &mut stop => break output,
            }
        };
        self.run_pending();
        Some(output)
    }

    /// Wait for and run exactly one job. Returns false if the loop is closed.
    pub async fn turn(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run whatever is queued right now without waiting. Returns the number
    /// of jobs run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }
}

/// Presentation-side consumer of a finished metadata fetch. Only ever called
/// on a response context.
pub trait ResultSink: Send + Sync + 'static {
    fn deliver(&self, name: &str, image_url: &str);
}

impl<F> ResultSink for F
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    fn deliver(&self, name: &str, image_url: &str) {
        self(name, image_url)
    }
}

/// Collects delivered results; handy for tests and headless callers.
#[derive(Default, Clone)]
pub struct RecordingSink {
    delivered: Arc<std::sync::Mutex<Vec<(Metadata, thread::ThreadId)>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<Metadata> {
        self.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Thread each result was delivered on, in delivery order.
    pub fn threads(&self) -> Vec<thread::ThreadId> {
        self.lock().iter().map(|(_, t)| *t).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Metadata, thread::ThreadId)>> {
        self.delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultSink for RecordingSink {
    fn deliver(&self, name: &str, image_url: &str) {
        self.lock()
            .push((Metadata::new(name, image_url), thread::current().id()));
    }
}
