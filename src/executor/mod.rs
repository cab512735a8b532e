//! Request execution subsystem.
//!
//! # Data Flow
//! ```text
//! TransportHandle
//!     → blocking()    → BlockingExecutor → caller thread waits → Response
//!     → nonblocking() → AsyncExecutor    → I/O thread runs it  → Outcome
//!                                            → callback, or PendingRequest
//! ```
//!
//! Both executors borrow the handle, so neither can outlive the share of
//! the transport it runs on.

pub mod blocking;
pub mod nonblocking;
pub mod outcome;

pub use blocking::BlockingExecutor;
pub use nonblocking::AsyncExecutor;
pub use outcome::{CancelHandle, Outcome, PendingRequest};

use reqwest::header::HeaderMap;

use crate::error::ClientError;
use crate::request::body::FORM_CONTENT_TYPE;
use crate::request::{Request, TextKind};

fn get_request(url: &str, headers: Option<&HeaderMap>, query: &[(&str, &str)]) -> Result<Request, ClientError> {
    Ok(Request::get(url, query)?.headers_from(headers))
}

fn form_request(url: &str, headers: Option<&HeaderMap>, params: &[(&str, &str)]) -> Result<Request, ClientError> {
    Ok(Request::post(url)?
        .with_headers(headers, FORM_CONTENT_TYPE)
        .form(params))
}

fn text_request(
    url: &str,
    headers: Option<&HeaderMap>,
    content: &str,
    kind: TextKind,
) -> Result<Request, ClientError> {
    Ok(Request::post(url)?
        .with_headers(headers, kind.default_content_type())
        .text(content, kind))
}
