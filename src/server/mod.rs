//! The rate proxy: a small HTTP facade over the upstream exchange-rate API.
//!
//! The proxy exposes two endpoints under `/api` and forwards both to
//! whatever [`RateProvider`] it was started with. Clients never talk to the
//! upstream service directly, so its URL and error detail stay server-side.

pub mod api;
pub mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::RateProvider;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<dyn RateProvider>,
}

/// Build the full proxy router around the given provider.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind `listen` and serve the proxy until Ctrl+C.
pub async fn serve(listen: &str, provider: Arc<dyn RateProvider>) -> Result<()> {
    let router = app_router(AppState { rates: provider });

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("Invalid listen address: {listen}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    println!("Rate proxy listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Rate proxy server failed")?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::debug!("Shutdown signal received, stopping"),
        Err(e) => {
            // Without a signal handler the server can only be killed hard.
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    }
}
