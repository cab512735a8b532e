//! Request body shapes.

use url::form_urlencoded;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=UTF-8";
pub const XML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Flavor of a raw string payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Plain,
    Xml,
    Json,
}

impl TextKind {
    /// Content type injected when the caller passes no headers at all.
    pub fn default_content_type(self) -> &'static str {
        match self {
            TextKind::Plain => TEXT_CONTENT_TYPE,
            // The demo peers expect XML under text/html.
            TextKind::Xml => XML_CONTENT_TYPE,
            TextKind::Json => JSON_CONTENT_TYPE,
        }
    }
}

/// The single body slot of a request.
///
/// A request carries exactly one shape; assigning a new one replaces the old.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Body {
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` pairs, encoded in order.
    Form(Vec<(String, String)>),
    /// Raw UTF-8 text sent as-is.
    Text { content: String, kind: TextKind },
}

impl Body {
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Body::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn text(content: impl Into<String>, kind: TextKind) -> Self {
        Body::Text {
            content: content.into(),
            kind,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Content type the body implies when no header names one.
    pub fn intrinsic_content_type(&self) -> Option<&'static str> {
        match self {
            Body::Empty => None,
            Body::Form(_) => Some(FORM_CONTENT_TYPE),
            Body::Text { .. } => Some(TEXT_CONTENT_TYPE),
        }
    }

    /// Wire bytes, or `None` for an empty body.
    pub fn encode(&self) -> Option<Vec<u8>> {
        match self {
            Body::Empty => None,
            Body::Form(pairs) => Some(
                form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(pairs)
                    .finish()
                    .into_bytes(),
            ),
            Body::Text { content, .. } => Some(content.as_bytes().to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_is_urlencoded_in_order() {
        let body = Body::form([("k1", "v1"), ("k2", "v2"), ("q", "a b&c")]);
        assert_eq!(body.encode().unwrap(), b"k1=v1&k2=v2&q=a+b%26c");
        assert_eq!(body.intrinsic_content_type(), Some(FORM_CONTENT_TYPE));
    }

    #[test]
    fn text_is_sent_verbatim() {
        let body = Body::text("<a>ü</a>", TextKind::Xml);
        assert_eq!(body.encode().unwrap(), "<a>ü</a>".as_bytes());
        assert_eq!(body.intrinsic_content_type(), Some(TEXT_CONTENT_TYPE));
    }

    #[test]
    fn empty_has_no_bytes() {
        assert!(Body::Empty.encode().is_none());
        assert!(Body::default().is_empty());
    }
}
