//! Blocking request execution.

use reqwest::header::HeaderMap;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::error::ClientError;
use crate::executor::{form_request, get_request, text_request};
use crate::request::{Request, Response, TextKind};
use crate::transport::pooled::PooledTransport;

/// Run `f`, which blocks, from whatever thread the caller is on.
///
/// Outside a runtime `f` runs directly. On a multi-thread runtime (including the
/// transport's own I/O threads) the worker is handed off with `block_in_place`
/// first. A current-thread runtime cannot do that, so the call is refused.
pub(crate) fn block_in_context<R>(f: impl FnOnce() -> R) -> Result<R, ClientError> {
    match Handle::try_current() {
        Err(_) => Ok(f()),
        Ok(current) if current.runtime_flavor() == RuntimeFlavor::CurrentThread => {
            tracing::warn!("Blocking request refused on a current-thread runtime");
            Err(ClientError::BlockingInAsyncContext)
        }
        Ok(_) => Ok(tokio::task::block_in_place(f)),
    }
}

/// Runs each request to completion on the calling thread.
///
/// Inside a current-thread runtime every call fails with
/// `ClientError::BlockingInAsyncContext`; use [`AsyncExecutor`](crate::executor::AsyncExecutor) there.
#[derive(Debug, Clone, Copy)]
pub struct BlockingExecutor<'a> {
    transport: Option<&'a PooledTransport>,
}

impl<'a> BlockingExecutor<'a> {
    pub(crate) fn new(transport: Option<&'a PooledTransport>) -> Self {
        Self { transport }
    }

    /// Send a prepared request and wait for the response.
    pub fn execute(&self, request: Request) -> Result<Response, ClientError> {
        let transport = self.transport.ok_or(ClientError::Unavailable)?;
        transport.block_on(transport.exchange(request))?
    }

    pub fn get(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        query: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        self.execute(get_request(url, headers, query)?)
    }

    /// POST a plain text body.
    pub fn post(&self, url: &str, headers: Option<&HeaderMap>, body: &str) -> Result<Response, ClientError> {
        self.execute(text_request(url, headers, body, TextKind::Plain)?)
    }

    pub fn post_form(
        &self,
        url: &str,
        headers: Option<&HeaderMap>,
        params: &[(&str, &str)],
    ) -> Result<Response, ClientError> {
        self.execute(form_request(url, headers, params)?)
    }

    pub fn post_xml(&self, url: &str, headers: Option<&HeaderMap>, xml: &str) -> Result<Response, ClientError> {
        self.execute(text_request(url, headers, xml, TextKind::Xml)?)
    }

    pub fn post_json(&self, url: &str, headers: Option<&HeaderMap>, json: &str) -> Result<Response, ClientError> {
        self.execute(text_request(url, headers, json, TextKind::Json)?)
    }
}
