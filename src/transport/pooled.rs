//! The pooled transport.
//!
//! # Responsibilities
//! - Own the I/O runtime that drives every socket and async completion
//! - Own the engine client and its keep-alive connection pool
//! - Enforce connection limits through the `ConnectionLimiter`
//! - Shut all of it down exactly once on close

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::runtime::{Handle, Runtime};

use crate::config::TransportConfig;
use crate::error::{ClientError, TransportError};
use crate::executor::blocking::block_in_context;
use crate::observability::metrics;
use crate::request::{Request, Response};
use crate::transport::pool::ConnectionLimiter;

static TRANSPORT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared connection pool plus the runtime that drives it.
#[derive(Debug)]
pub struct PooledTransport {
    id: u64,
    client: reqwest::Client,
    limiter: ConnectionLimiter,
    handle: Handle,
    /// Taken on close; `None` afterwards.
    runtime: Mutex<Option<Runtime>>,
    closed: AtomicBool,
    config: TransportConfig,
}

impl PooledTransport {
    /// Start the I/O runtime and build the pooled client.
    pub fn build(config: &TransportConfig) -> Result<Self, TransportError> {
        let limiter = ConnectionLimiter::new(
            config.max_total,
            config.max_per_route,
            config.pool_acquire_timeout(),
        )?;

        let io_threads = config.io_thread_count();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(io_threads)
            .thread_name("pooled-http-io")
            .enable_all()
            .build()?;

        let client = {
            let _guard = runtime.enter();
            reqwest::Client::builder()
                .connect_timeout(config.connect_timeout())
                .read_timeout(config.socket_timeout())
                .pool_max_idle_per_host(config.max_per_route)
                .tcp_keepalive(config.tcp_keepalive.then_some(KEEPALIVE_INTERVAL))
                .build()?
        };

        let id = TRANSPORT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            transport_id = id,
            io_threads,
            max_total = config.max_total,
            max_per_route = config.max_per_route,
            "Pooled transport initialized"
        );

        Ok(Self {
            id,
            client,
            limiter,
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            closed: AtomicBool::new(false),
            config: config.clone(),
        })
    }

    /// Identity of this transport instance; unique within the process.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Exchanges currently holding a pool lease.
    pub fn in_flight(&self) -> usize {
        self.limiter.active()
    }

    /// Build the future for one exchange. It owns everything it needs.
    pub(crate) fn exchange(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, ClientError>> + Send + 'static {
        let client = self.client.clone();
        let limiter = self.limiter.clone();

        async move {
            let start = Instant::now();
            let method = request.method().to_string();
            let route = request.route();
            let url = request.url().clone();

            let _lease = limiter.acquire(&route).await?;
            tracing::debug!(method = %method, url = %url, "Sending request");

            let result = match request.into_engine(&client).send().await {
                Ok(response) => Response::read(response).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(response) => {
                    metrics::record_request(&method, Some(response.status().as_u16()), start);
                    Ok(response)
                }
                Err(e) => {
                    metrics::record_request(&method, None, start);
                    let error = ClientError::from(e);
                    tracing::warn!(method = %method, url = %url, error = %error, "Request failed");
                    Err(error)
                }
            }
        }
    }

    /// Drive `future` to completion on the calling thread.
    pub(crate) fn block_on<F: Future>(&self, future: F) -> Result<F::Output, ClientError> {
        if !self.is_open() {
            return Err(ClientError::Unavailable);
        }
        block_in_context(|| self.handle.block_on(future))
    }

    /// Queue `future` on the I/O threads. After close the future is dropped unpolled.
    pub(crate) fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        drop(self.handle.spawn(future));
    }

    /// Close the pool and stop the I/O threads.
    ///
    /// Queued and in-flight async requests are dropped; their callbacks observe
    /// `Outcome::Cancelled`. Never blocks, so it is safe from any thread,
    /// including the transport's own I/O threads.
    pub fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::AlreadyClosed(self.id));
        }
        self.limiter.close();

        let runtime = self
            .runtime
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        match runtime {
            Some(runtime) => {
                runtime.shutdown_background();
                tracing::info!(transport_id = self.id, "Pooled transport closed");
                Ok(())
            }
            None => Err(TransportError::AlreadyClosed(self.id)),
        }
    }
}

impl Drop for PooledTransport {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                tracing::warn!(transport_id = self.id, error = %e, "Failed to close dropped transport");
            }
        }
    }
}
