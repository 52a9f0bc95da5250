//! HTTP boundary: router, layers, and the serve loop.
//!
//! The core handler only knows about the relay. Tracing, hardening headers,
//! rate limiting and static UI serving are layered around it here.

mod error;
pub mod middleware;
mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::DownloadQuery;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, Span};

use crate::config::RelayConfig;
use crate::relay::Relay;
use middleware::{rate_limit, with_security_headers, RateLimiter};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Relay,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }
}

/// Builds the full router: API routes, optional static UI, and layers.
pub fn build_router(state: AppState, limiter: RateLimiter, cfg: &RelayConfig) -> Router {
    let mut router = Router::new()
        .route("/api/download", get(routes::download))
        .route_layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        .route("/api/health", get(routes::health))
        .with_state(state);

    if let Some(dir) = cfg.static_dir.as_ref().filter(|d| d.is_dir()) {
        tracing::debug!("serving static UI from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    with_boundary_layers(router)
}

/// Renders a handler or layer panic as a plain 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    tracing::error!("request handler panicked: {}", detail);
    ApiError::internal().into_response()
}

/// Hardening headers, panic boundary, then request tracing (outermost).
fn with_boundary_layers(router: Router) -> Router {
    with_security_headers(router)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request| {
                    if req.uri().path() == "/api/health" {
                        Span::none()
                    } else {
                        use tower_http::trace::MakeSpan;
                        DefaultMakeSpan::new().level(Level::INFO).make_span(req)
                    }
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Binds and serves until `shutdown` resolves.
pub async fn serve<F>(cfg: &RelayConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    cfg.validate()?;
    let relay = Relay::from_config(cfg)?;
    let limiter = RateLimiter::from_config(&cfg.rate_limit);
    let router = build_router(AppState::new(relay), limiter, cfg);

    let addr: SocketAddr = format!("{}:{}", cfg.bind_address, cfg.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cfg.bind_address, cfg.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("vidrelay listening on http://{}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("server error")?;

    tracing::info!("vidrelay stopped");
    Ok(())
}
