//! Echo server.
//!
//! # Responsibilities
//! - `POST /post-json`: echo a JSON object
//! - `POST /post-string`: echo any body as text
//! - `GET /fetch?url=...`: fetch a URL through the shared pooled transport
//! - Wire up middleware (request ID, timeout, tracing)

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::executor::Outcome;
use crate::lifecycle::ShutdownSignal;
use crate::transport::TransportManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TransportManager>,
}

/// HTTP server for the demo endpoints.
pub struct EchoServer {
    router: Router,
}

impl EchoServer {
    pub fn new(config: &ServerConfig, manager: Arc<TransportManager>) -> Self {
        Self {
            router: Self::build_router(config, AppState { manager }),
        }
    }

    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/post-json", post(post_json))
            .route("/post-string", post(post_string))
            .route("/fetch", get(fetch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Echo server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
            })
            .await?;

        tracing::info!("Echo server stopped");
        Ok(())
    }
}

async fn post_json(Json(body): Json<Map<String, Value>>) -> Json<Value> {
    let body = Value::Object(body);
    tracing::info!(body = %body, "post-json");
    Json(body)
}

async fn post_string(body: String) -> String {
    tracing::info!(body = %body, "post-string");
    body
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    url: String,
}

async fn fetch(State(state): State<AppState>, Query(params): Query<FetchParams>) -> Response {
    let handle = state.manager.acquire();
    let pending = match handle.nonblocking().get(&params.url, None, &[]) {
        Ok(pending) => pending,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };

    match pending.await {
        Outcome::Completed(response) => (response.status(), response.to_string()).into_response(),
        Outcome::Failed(e) => (StatusCode::BAD_GATEWAY, e.to_string()).into_response(),
        Outcome::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "request cancelled").into_response(),
    }
}
