//! Shared, reference-counted HTTP client over one pooled transport.
//!
//! ```no_run
//! use std::sync::Arc;
//! use pooled_http::TransportManager;
//!
//! let manager = Arc::new(TransportManager::default());
//! let handle = manager.acquire();
//! let response = handle
//!     .blocking()
//!     .get("http://127.0.0.1:8080/", None, &[("q", "java")])?;
//! println!("{}", response);
//! drop(handle); // last handle: the pool is closed here
//! # Ok::<(), pooled_http::ClientError>(())
//! ```

pub mod config;
pub mod demo;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod observability;
pub mod request;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use executor::{AsyncExecutor, BlockingExecutor, CancelHandle, Outcome, PendingRequest};
pub use request::{Body, Request, Response, TextKind};
pub use transport::{TransportHandle, TransportManager};
