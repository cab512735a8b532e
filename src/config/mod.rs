//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ClientConfig (validated, immutable)
//!     → TransportConfig handed to the TransportManager
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → TransportManager::reconfigure swaps the stored TransportConfig
//!     → next transport initialization picks it up
//! ```
//!
//! # Design Decisions
//! - A live transport is never rebuilt under its holders; reloads apply on next init
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{ClientConfig, ObservabilityConfig, ServerConfig, TransportConfig};
pub use validation::ValidationError;
