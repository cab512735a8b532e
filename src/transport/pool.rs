//! Connection pool limits.
//!
//! # Responsibilities
//! - Bound concurrent exchanges in total and per route (scheme/host/port)
//! - Time out callers that cannot get a lease within the acquire timeout
//! - Return the lease on drop, whatever path the exchange exits by

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{ClientError, TransportError};
use crate::observability::metrics;

/// Hands out leases against the total and per-route connection limits.
#[derive(Debug, Clone)]
pub struct ConnectionLimiter {
    inner: Arc<LimiterInner>,
}

#[derive(Debug)]
struct LimiterInner {
    total: Arc<Semaphore>,
    routes: DashMap<String, Arc<Semaphore>>,
    max_per_route: usize,
    acquire_timeout: Duration,
    active: AtomicUsize,
}

impl ConnectionLimiter {
    /// Fails when a limit is larger than a semaphore can hold.
    pub fn new(
        max_total: usize,
        max_per_route: usize,
        acquire_timeout: Duration,
    ) -> Result<Self, TransportError> {
        for (field, value) in [
            ("transport.max_total", max_total),
            ("transport.max_per_route", max_per_route),
        ] {
            if value > Semaphore::MAX_PERMITS {
                return Err(TransportError::LimitTooLarge {
                    field,
                    value,
                    max: Semaphore::MAX_PERMITS,
                });
            }
        }

        Ok(Self {
            inner: Arc::new(LimiterInner {
                total: Arc::new(Semaphore::new(max_total)),
                routes: DashMap::new(),
                max_per_route,
                acquire_timeout,
                active: AtomicUsize::new(0),
            }),
        })
    }

    /// Wait for a lease on `route`, up to the acquire timeout.
    pub async fn acquire(&self, route: &str) -> Result<ConnectionLease, ClientError> {
        let route_limit = self
            .inner
            .routes
            .entry(route.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.inner.max_per_route)))
            .clone();
        let total = self.inner.total.clone();

        let permits = tokio::time::timeout(self.inner.acquire_timeout, async move {
            let route_permit = route_limit.acquire_owned().await?;
            let total_permit = total.acquire_owned().await?;
            Ok::<_, tokio::sync::AcquireError>((route_permit, total_permit))
        })
        .await;

        let (route_permit, total_permit) = match permits {
            Ok(Ok(permits)) => permits,
            // Semaphores are closed only when the transport shuts down.
            Ok(Err(_)) => {
                self.inner.prune(route);
                return Err(ClientError::Unavailable);
            }
            Err(_) => {
                self.inner.prune(route);
                tracing::warn!(
                    route = %route,
                    timeout = ?self.inner.acquire_timeout,
                    "Timed out waiting for a pooled connection"
                );
                return Err(ClientError::PoolTimeout(self.inner.acquire_timeout));
            }
        };

        let active = self.inner.active.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_leases(active);
        tracing::trace!(route = %route, active, "Lease acquired");

        Ok(ConnectionLease {
            route: route.to_string(),
            route_permit: Some(route_permit),
            _total: total_permit,
            inner: self.inner.clone(),
        })
    }

    /// Leases currently held.
    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Routes with a lease held or awaited.
    pub fn routes(&self) -> usize {
        self.inner.routes.len()
    }

    /// Fail current and future waiters with `Unavailable`.
    pub fn close(&self) {
        self.inner.total.close();
        for route in self.inner.routes.iter() {
            route.value().close();
        }
    }
}

impl LimiterInner {
    /// Forget `route` if no lease or waiter still refers to it.
    fn prune(&self, route: &str) {
        // Waiters and permits each hold a clone, and clones are taken under
        // the shard lock, so a count of one means nobody else is on this route.
        self.routes
            .remove_if(route, |_, semaphore| Arc::strong_count(semaphore) == 1);
    }
}

/// A RAII guard for one in-flight exchange.
///
/// The last lease on a route removes the route's semaphore, so the map only
/// holds routes in use.
#[derive(Debug)]
pub struct ConnectionLease {
    route: String,
    route_permit: Option<OwnedSemaphorePermit>,
    _total: OwnedSemaphorePermit,
    inner: Arc<LimiterInner>,
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        drop(self.route_permit.take());
        self.inner.prune(&self.route);

        let active = self.inner.active.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_leases(active);
    }
}
