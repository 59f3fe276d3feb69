use crate::config::AppConfig;
use crate::upstream::AccountUpstream;
use axum::Router;
use axum::routing::{MethodRouter, get};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: Arc<dyn AccountUpstream>,
}

impl AppState {
    pub fn new(config: AppConfig, upstream: Arc<dyn AccountUpstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // Unmatched paths resolve to a static asset, then to the entry document.
    let entry: MethodRouter = get(crate::assets::serve_entry).with_state(state.clone());
    let static_files = ServeDir::new(&state.config.public_dir).fallback(entry);

    let app = Router::new()
        .route("/health", get(crate::api::health))
        .route(
            "/api/accounts/{id}",
            get(crate::api::get_account).patch(crate::api::patch_account),
        )
        .fallback_service(static_files)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http());

    if state.config.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    tracing::info!("widget URL: http://{addr}/?accountId=YOUR_ACCOUNT_UUID");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(?err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
