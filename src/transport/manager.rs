//! Reference-counted ownership of the pooled transport.
//!
//! # Responsibilities
//! - Build the transport when the first handle is acquired
//! - Share one transport among every live handle
//! - Close it when the last handle is released
//!
//! # Design Decisions
//! - The transport slot is read without locking; it is written only under `lock`
//! - The handle count is a plain atomic, never updated under the lock
//! - Both init and teardown re-check their condition under the lock
//! - Lifecycle failures are logged here and never reach callers

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use arc_swap::{ArcSwap, ArcSwapOption};

use crate::config::TransportConfig;
use crate::executor::{AsyncExecutor, BlockingExecutor};
use crate::observability::metrics;
use crate::transport::pooled::PooledTransport;

static GLOBAL: LazyLock<Arc<TransportManager>> =
    LazyLock::new(|| Arc::new(TransportManager::new(TransportConfig::default())));

/// Owns the shared transport slot and the count of handles holding it.
#[derive(Debug)]
pub struct TransportManager {
    config: ArcSwap<TransportConfig>,
    transport: ArcSwapOption<PooledTransport>,
    refs: AtomicUsize,
    lock: Mutex<()>,
    initializations: AtomicU64,
    teardowns: AtomicU64,
    init_failures: AtomicU64,
}

/// Point-in-time view of a manager's lifecycle counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleStats {
    /// Handles acquired and not yet released.
    pub live_handles: usize,
    /// Whether a transport currently occupies the slot.
    pub initialized: bool,
    pub initializations: u64,
    pub teardowns: u64,
    pub init_failures: u64,
}

impl TransportManager {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            transport: ArcSwapOption::empty(),
            refs: AtomicUsize::new(0),
            lock: Mutex::new(()),
            initializations: AtomicU64::new(0),
            teardowns: AtomicU64::new(0),
            init_failures: AtomicU64::new(0),
        }
    }

    /// Process-wide manager with default configuration.
    pub fn global() -> Arc<TransportManager> {
        GLOBAL.clone()
    }

    /// Take a handle, building the transport if none is live.
    ///
    /// Never fails: if the transport cannot be built the error is logged and
    /// the handle's requests fail with `ClientError::Unavailable`.
    pub fn acquire(self: &Arc<Self>) -> TransportHandle {
        let live = self.refs.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_live_handles(live);

        let transport = match self.transport.load_full() {
            Some(transport) => Some(transport),
            None => self.initialize(),
        };

        TransportHandle {
            manager: Arc::clone(self),
            transport,
        }
    }

    fn initialize(&self) -> Option<Arc<PooledTransport>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        // Another thread may have finished while we waited for the lock.
        if let Some(transport) = self.transport.load_full() {
            return Some(transport);
        }

        let config = self.config.load_full();
        match PooledTransport::build(&config) {
            Ok(transport) => {
                let transport = Arc::new(transport);
                self.transport.store(Some(Arc::clone(&transport)));
                self.initializations.fetch_add(1, Ordering::SeqCst);
                metrics::record_transport_initialized();
                Some(transport)
            }
            Err(e) => {
                self.init_failures.fetch_add(1, Ordering::SeqCst);
                metrics::record_init_failure();
                tracing::error!(error = %e, "Failed to initialize pooled transport");
                None
            }
        }
    }

    fn release(&self) {
        let previous = self
            .refs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match previous {
            Ok(1) => metrics::set_live_handles(0),
            Ok(n) => {
                metrics::set_live_handles(n - 1);
                return;
            }
            Err(_) => {
                tracing::warn!("Release called with no live handles");
                return;
            }
        }

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.refs.load(Ordering::SeqCst) > 0 {
            return;
        }

        let Some(transport) = self.transport.swap(None) else {
            return;
        };

        // A concurrent acquire may have read the slot before the swap; it
        // counted itself first, so a non-zero count here means hand it back.
        if self.refs.load(Ordering::SeqCst) > 0 {
            self.transport.store(Some(transport));
            return;
        }

        if let Err(e) = transport.close() {
            tracing::warn!(transport_id = transport.id(), error = %e, "Failed to close pooled transport");
        }
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        metrics::record_transport_closed();
    }

    /// Replace the configuration used by the next initialization.
    ///
    /// A transport that is already live keeps its settings until torn down.
    pub fn reconfigure(&self, config: TransportConfig) {
        tracing::info!(
            live = self.transport.load().is_some(),
            "Transport configuration updated; applies at next initialization"
        );
        self.config.store(Arc::new(config));
    }

    pub fn config(&self) -> Arc<TransportConfig> {
        self.config.load_full()
    }

    pub fn stats(&self) -> LifecycleStats {
        LifecycleStats {
            live_handles: self.refs.load(Ordering::SeqCst),
            initialized: self.transport.load().is_some(),
            initializations: self.initializations.load(Ordering::SeqCst),
            teardowns: self.teardowns.load(Ordering::SeqCst),
            init_failures: self.init_failures.load(Ordering::SeqCst),
        }
    }
}

impl Default for TransportManager {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

/// Scoped share of the pooled transport. Dropping it releases the share.
#[derive(Debug)]
pub struct TransportHandle {
    manager: Arc<TransportManager>,
    transport: Option<Arc<PooledTransport>>,
}

impl TransportHandle {
    /// Executor that blocks the calling thread for each request.
    pub fn blocking(&self) -> BlockingExecutor<'_> {
        BlockingExecutor::new(self.transport.as_deref())
    }

    /// Executor that queues requests and returns immediately.
    pub fn nonblocking(&self) -> AsyncExecutor<'_> {
        AsyncExecutor::new(self.transport.as_deref())
    }

    /// False when initialization failed for this handle.
    pub fn is_available(&self) -> bool {
        self.transport.as_ref().is_some_and(|t| t.is_open())
    }

    /// Identity of the shared transport, if any.
    pub fn transport_id(&self) -> Option<u64> {
        self.transport.as_ref().map(|t| t.id())
    }

    pub fn manager(&self) -> &Arc<TransportManager> {
        &self.manager
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        // Our own reference must not keep the transport alive past teardown.
        self.transport = None;
        self.manager.release();
    }
}
