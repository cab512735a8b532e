//! Request construction.
//!
//! # Responsibilities
//! - Parse and check the target URL before anything touches the network
//! - Fold query parameters into the URL
//! - Attach caller headers or inject the per-operation default content type
//! - Hold the single body slot
//! - Translate into an engine request at send time

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Url};

use crate::error::ClientError;
use crate::request::body::{Body, TextKind};

/// A validated request, ready to hand to an executor.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Body,
}

impl Request {
    /// GET with `query` appended to the URL, each pair form-urlencoded.
    pub fn get(url: &str, query: &[(&str, &str)]) -> Result<Self, ClientError> {
        let mut url = parse_url(url)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(Self::new(Method::GET, url))
    }

    /// Bare POST; pick a body with [`Request::form`] or [`Request::text`].
    pub fn post(url: &str) -> Result<Self, ClientError> {
        Ok(Self::new(Method::POST, parse_url(url)?))
    }

    fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    /// Copy the caller's headers, or inject `default_content_type` when there are none.
    ///
    /// `Some(&HeaderMap::new())` means "no extra headers" and suppresses the default.
    pub fn with_headers(mut self, headers: Option<&HeaderMap>, default_content_type: &'static str) -> Self {
        match headers {
            Some(headers) => {
                for (name, value) in headers {
                    self.headers.insert(name.clone(), value.clone());
                }
            }
            None => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static(default_content_type));
            }
        }
        self
    }

    /// Copy the caller's headers without any default.
    pub fn headers_from(mut self, headers: Option<&HeaderMap>) -> Self {
        if let Some(headers) = headers {
            for (name, value) in headers {
                self.headers.insert(name.clone(), value.clone());
            }
        }
        self
    }

    /// Use urlencoded form pairs as the body, replacing any previous body.
    pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
        self.body = Body::form(pairs.iter().copied());
        self
    }

    /// Use a raw string as the body, replacing any previous body.
    pub fn text(mut self, content: impl Into<String>, kind: TextKind) -> Self {
        self.body = Body::text(content, kind);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Content type that goes on the wire: an explicit header, else the body's own.
    pub fn content_type(&self) -> Option<HeaderValue> {
        self.headers.get(CONTENT_TYPE).cloned().or_else(|| {
            self.body
                .intrinsic_content_type()
                .map(HeaderValue::from_static)
        })
    }

    /// Pool route key: scheme, host and port.
    pub fn route(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    pub(crate) fn into_engine(self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let content_type = self.content_type();
        let mut headers = self.headers;
        if let Some(value) = content_type {
            headers.insert(CONTENT_TYPE, value);
        }

        let builder = client.request(self.method, self.url).headers(headers);
        match self.body.encode() {
            Some(bytes) => builder.body(bytes),
            None => builder,
        }
    }
}

fn parse_url(raw: &str) -> Result<Url, ClientError> {
    let url = Url::parse(raw).map_err(|e| ClientError::invalid_url(raw, e))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ClientError::invalid_url(raw, format!("unsupported scheme `{other}`"))),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClientError::invalid_url(raw, "missing host"));
    }
    Ok(url)
}
