//! Response handling.
//!
//! # Responsibilities
//! - Decode the body of a 200 response as UTF-8 text
//! - Surface status and reason for anything else, without an error
//!
//! # Design Decisions
//! - Non-200 bodies are discarded; callers get status and reason only
//! - Invalid UTF-8 is replaced, never an error

use reqwest::StatusCode;

/// Result of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    reason: String,
    body: Option<String>,
}

impl Response {
    pub fn new(status: StatusCode, body: Option<String>) -> Self {
        Self {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        }
    }

    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status();
        let url = response.url().clone();

        if status != StatusCode::OK {
            let response = Self::new(status, None);
            tracing::info!(
                url = %url,
                status = status.as_u16(),
                reason = %response.reason,
                "Non-success response"
            );
            return Ok(response);
        }

        let bytes = response.bytes().await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        tracing::debug!(url = %url, bytes = bytes.len(), "Response received");
        tracing::trace!(url = %url, body = %text, "Response body");
        Ok(Self::new(status, Some(text)))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase for the status code.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Body text; present only for status 200.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn into_body(self) -> Option<String> {
        self.body
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            Some(body) => write!(f, "{}", body),
            None => write!(f, "{} {}", self.status.as_u16(), self.reason),
        }
    }
}
