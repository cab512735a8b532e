//! Shared transport subsystem.
//!
//! # Data Flow
//! ```text
//! TransportManager::acquire()
//!     → refs += 1
//!     → slot already filled?  yes → TransportHandle (no lock taken)
//!                             no  → lock → re-check → pooled.rs builds runtime + client
//!     → TransportHandle
//!         → executors → pool.rs lease (total + per-route limit) → engine → Response
//!
//! drop(TransportHandle)
//!     → refs -= 1
//!     → still > 0? → done
//!     → lock → re-check → take transport out of slot → close (runtime, pool)
//! ```
//!
//! # Design Decisions
//! - One manager owns one slot; no hidden statics beyond the opt-in global manager
//! - Closing never blocks, so the last handle may be dropped anywhere
//! - Requests queued when the transport closes are reported as cancelled

pub mod manager;
pub mod pool;
pub mod pooled;

pub use manager::{LifecycleStats, TransportHandle, TransportManager};
pub use pool::{ConnectionLease, ConnectionLimiter};
pub use pooled::PooledTransport;
