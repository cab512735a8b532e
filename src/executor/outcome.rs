//! Async completion plumbing.
//!
//! # Responsibilities
//! - Carry the result of a queued request (completed, failed, cancelled)
//! - Deliver it to the caller's callback exactly once
//! - Let the caller cancel, await or block on a queued request

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::executor::blocking::block_in_context;
use crate::request::Response;

/// How a queued request ended.
#[derive(Debug)]
pub enum Outcome {
    /// The server answered; non-200 statuses land here too.
    Completed(Response),
    Failed(ClientError),
    /// Cancelled by the caller, or dropped by a transport teardown.
    Cancelled,
}

impl Outcome {
    pub fn response(&self) -> Option<&Response> {
        match self {
            Outcome::Completed(response) => Some(response),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }
}

/// Owns a callback until it has been invoked.
///
/// If the owning task is dropped before delivering, the drop hands the
/// callback `Outcome::Cancelled`.
pub(crate) struct Delivery<F: FnOnce(Outcome)> {
    callback: Option<F>,
}

impl<F: FnOnce(Outcome)> Delivery<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    pub(crate) fn deliver(mut self, outcome: Outcome) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl<F: FnOnce(Outcome)> Drop for Delivery<F> {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::debug!("Request dropped before completion");
            callback(Outcome::Cancelled);
        }
    }
}

/// Cancellation hook for one queued request.
#[derive(Debug)]
pub struct CancelHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl CancelHandle {
    pub(crate) fn new(tx: oneshot::Sender<()>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A handle for a request that already finished at submission.
    pub(crate) fn finished() -> Self {
        Self { tx: None }
    }

    /// Abort the request. Returns false if it had already finished.
    pub fn cancel(&mut self) -> bool {
        match self.tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// True once the outcome has been delivered.
    pub fn is_finished(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

/// A queued request whose outcome can be awaited or waited for.
///
/// Dropping it does not cancel the request; call [`PendingRequest::cancel`].
#[derive(Debug)]
pub struct PendingRequest {
    outcome: oneshot::Receiver<Outcome>,
    cancel: CancelHandle,
}

impl PendingRequest {
    pub(crate) fn new(outcome: oneshot::Receiver<Outcome>, cancel: CancelHandle) -> Self {
        Self { outcome, cancel }
    }

    pub fn cancel(&mut self) -> bool {
        self.cancel.cancel()
    }

    /// Block the calling thread until the outcome arrives.
    ///
    /// On a current-thread runtime this yields
    /// `Outcome::Failed(ClientError::BlockingInAsyncContext)` without waiting
    /// and the request is detached; `.await` it there instead.
    pub fn wait(self) -> Outcome {
        let outcome = self.outcome;
        match block_in_context(move || outcome.blocking_recv()) {
            Ok(received) => received.unwrap_or(Outcome::Cancelled),
            Err(e) => Outcome::Failed(e),
        }
    }
}

impl Future for PendingRequest {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|received| received.unwrap_or(Outcome::Cancelled))
    }
}
