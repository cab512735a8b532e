//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section carries `#[serde(default)]` so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// Pooled transport settings.
    pub transport: TransportConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Echo server settings.
    pub server: ServerConfig,
}

/// Settings used when the pooled transport is (re)built.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Time allowed to establish a TCP connection, in milliseconds.
    pub connect_timeout_ms: u64,

    /// Maximum gap between reads on an established connection, in milliseconds.
    pub socket_timeout_ms: u64,

    /// Time allowed to obtain a lease from the pool, in milliseconds.
    pub pool_acquire_timeout_ms: u64,

    /// Maximum concurrent connections across all routes.
    pub max_total: usize,

    /// Maximum concurrent connections to a single scheme/host/port.
    pub max_per_route: usize,

    /// I/O worker threads. `0` means one per available core.
    pub io_threads: usize,

    /// Enable TCP keep-alive probes on pooled sockets.
    pub tcp_keepalive: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 60_000,
            socket_timeout_ms: 60_000,
            pool_acquire_timeout_ms: 3_000,
            max_total: 100,
            max_per_route: 100,
            io_threads: 0,
            tcp_keepalive: true,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn pool_acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_acquire_timeout_ms)
    }

    /// Resolve `io_threads`, substituting the core count for `0`.
    pub fn io_thread_count(&self) -> usize {
        if self.io_threads > 0 {
            return self.io_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Echo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}
