//! Non-blocking request execution.
//!
//! # Design Decisions
//! - Requests are built and validated on the caller's thread; URL errors return immediately
//! - The exchange runs on the transport's I/O threads
//! - Completions for different requests arrive in no particular order

use reqwest::header::HeaderMap;
use tokio::sync::oneshot;

use crate::error::ClientError;
use crate::executor::outcome::{CancelHandle, Delivery, Outcome, PendingRequest};
use crate::executor::{form_request, get_request, text_request};
use crate::request::{Request, TextKind};
use crate::transport::pooled::PooledTransport;

/// Queues requests on the shared transport and returns at once.
#[derive(Debug, Clone, Copy)]
pub struct AsyncExecutor<'a> {
    transport: Option<&'a PooledTransport>,
}

impl<'a> AsyncExecutor<'a> {
    pub(crate) fn new(transport: Option<&'a PooledTransport>) -> Self {
        Self { transport }
    }

    /// Queue `request`; `callback` runs exactly once with its outcome.
    ///
    /// The callback runs on an I/O thread, or inline when the transport is
    /// unavailable.
    pub fn execute_with<F>(&self, request: Request, callback: F) -> CancelHandle
    where
        F: FnOnce(Outcome) + Send + 'static,
    {
        let delivery = Delivery::new(callback);
        let transport = match self.transport {
            Some(transport) if transport.is_open() => transport,
            _ => {
                delivery.deliver(Outcome::Failed(ClientError::Unavailable));
                return CancelHandle::finished();
            }
        };

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let exchange = transport.exchange(request);

        transport.spawn(async move {
            let cancelled = async move {
                // A dropped sender means "detached", not "cancelled".
                if cancel_rx.await.is_err() {
                    std::future::pending::<()>().await;
                }
            };

            tokio::select! {
                biased;
                _ = cancelled => {
                    tracing::debug!("Request cancelled by caller");
                    delivery.deliver(Outcome::Cancelled);
                }
                result = exchange => {
                    delivery.deliver(match result {
                        Ok(response) => Outcome::Completed(response),
                        Err(e) => Outcome::Failed(e),
                    });
                }
            }
        });

        CancelHandle::new(cancel_tx)
    }

    /// Queue `request` and get a handle to await, wait on or cancel.
    pub fn execute(&self, request: Request) -> PendingRequest {
        let (tx, rx) = oneshot::channel();
        let cancel = self.execute_with(request, move |outcome| {
            let _ = tx.send(outcome);
        });
        PendingRequest::new(rx, cancel)
    }

    pub fn get(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        query: &[(&str, &str)],
    ) -> Result<PendingRequest, ClientError> {
        Ok(self.execute(get_request(url, headers, query)?))
    }

    pub fn post(&self, url: &str, headers: Option<&HeaderMap>, body: &str) -> Result<PendingRequest, ClientError> {
        Ok(self.execute(text_request(url, headers, body, TextKind::Plain)?))
    }

    pub fn post_form(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        params: &[(&str, &str)],
    ) -> Result<PendingRequest, ClientError> {
        Ok(self.execute(form_request(url, headers, params)?))
    }

    pub fn post_xml(&self, url: &str, headers: Option<&HeaderMap>, xml: &str) -> Result<PendingRequest, ClientError> {
        Ok(self.execute(text_request(url, headers, xml, TextKind::Xml)?))
    }

    pub fn post_json(&self, url: &str, headers: Option<&HeaderMap>, json: &str) -> Result<PendingRequest, ClientError> {
        Ok(self.execute(text_request(url, headers, json, TextKind::Json)?))
    }
}
