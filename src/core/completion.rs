// src/core/completion.rs — One completion primitive, two ways to consume it
//
// `Pending<T>` is the only asynchronous primitive in the engine: work runs on
// the worker runtime and its outcome is sent through a oneshot exactly once.
// If the worker dies before sending, the dropped sender turns into an
// `Abandoned` error, so a receiver always observes one terminal outcome.
//
// Consumers either `.await` it, hand it a single `Continuation`, or hand it a
// success/error pair through `Callbacks`. The latter two are posted to a
// ResponseContext and never run inside the caller's own stack frame.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::core::response::ResponseContext;
use crate::infra::errors::EngineError;

/// Tagged result of one asynchronous operation.
pub type Outcome<T> = Result<T, EngineError>;

/// Single-continuation completion: resumed exactly once with either the
/// value or the error.
pub trait Continuation<T>: Send + 'static {
    fn resume_with(self: Box<Self>, outcome: Outcome<T>);
}

impl<T, F> Continuation<T> for F
where
    F: FnOnce(Outcome<T>) + Send + 'static,
{
    fn resume_with(self: Box<Self>, outcome: Outcome<T>) {
        (*self)(outcome)
    }
}

/// Callback-pair completion: exactly one of the two functions runs.
pub struct Callbacks<S, E> {
    on_success: S,
    on_error: E,
}

impl<S, E> Callbacks<S, E> {
    pub fn new(on_success: S, on_error: E) -> Self {
        Self {
            on_success,
            on_error,
        }
    }
}

impl<T, S, E> Continuation<T> for Callbacks<S, E>
where
    S: FnOnce(T) + Send + 'static,
    E: FnOnce(EngineError) + Send + 'static,
{
    fn resume_with(self: Box<Self>, outcome: Outcome<T>) {
        let Callbacks {
            on_success,
            on_error,
        } = *self;
        match outcome {
            Ok(value) => on_success(value),
            Err(err) => on_error(err),
        }
    }
}

/// Where a [`Pending`] runs and where its continuations are delivered.
#[derive(Clone)]
pub struct Dispatcher {
    workers: Handle,
    response: ResponseContext,
}

impl Dispatcher {
    pub fn new(workers: Handle, response: ResponseContext) -> Self {
        Self { workers, response }
    }

    pub fn workers(&self) -> &Handle {
        &self.workers
    }

    pub fn response(&self) -> &ResponseContext {
        &self.response
    }

    /// Start `work` on the worker runtime.
    pub fn spawn<T, F>(&self, operation: &str, work: F) -> Pending<T>
    where
        T: Send + 'static,
        F: Future<Output = Outcome<T>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.workers.spawn(async move {
            // A closed receiver means the caller lost interest.
            let _ = tx.send(work.await);
        });
        Pending {
            operation: operation.to_string(),
            rx,
        }
    }

    /// Resolve `pending` on the worker runtime, then resume `continuation`
    /// on the response context.
    pub fn deliver<T>(&self, pending: Pending<T>, continuation: Box<dyn Continuation<T>>)
    where
        T: Send + 'static,
    {
        let response = self.response.clone();
        self.workers.spawn(async move {
            let outcome = pending.await;
            response.post(move || continuation.resume_with(outcome));
        });
    }
}

/// Outcome of work running on the worker runtime. Resolves exactly once.
#[must_use = "a Pending does nothing unless awaited or delivered"]
pub struct Pending<T> {
    operation: String,
    rx: oneshot::Receiver<Outcome<T>>,
}

impl<T> Pending<T> {
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl<T> Future for Pending<T> {
    type Output = Outcome<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(EngineError::abandoned(&self.operation))),
            Poll::Pending => Poll::Pending,
        }
    }
}
