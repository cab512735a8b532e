//! Request and response model.
//!
//! # Data Flow
//! ```text
//! caller (url, headers, payload)
//!     → builder.rs (validate URL, fold query, headers, default content type)
//!     → body.rs (single body slot: empty | form | text)
//!     → executor sends it through the pooled transport
//!     → response.rs (decode 200 body, else status + reason)
//! ```

pub mod body;
pub mod builder;
pub mod response;

pub use body::{Body, TextKind};
pub use builder::Request;
pub use response::Response;
