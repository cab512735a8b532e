//! Demo collaborators around the pooled client.
//!
//! - server.rs: echo endpoints plus a fetch endpoint that borrows the shared transport
//! - scenario.rs: the canned request sequence run by `pooled-http demo`

pub mod scenario;
pub mod server;

pub use scenario::{Mode, StepResult};
pub use server::EchoServer;
