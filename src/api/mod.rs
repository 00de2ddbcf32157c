pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::feed::TransactionFeed;
use crate::pipeline::RiskPipeline;

pub struct AppState<F> {
    pub pipeline: RiskPipeline,
    pub feed: F,
    pub fetch_timeout: Duration,
}

pub fn router<F: TransactionFeed + 'static>(state: AppState<F>) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/v1/health", get(handlers::health::<F>))
        .route(
            "/api/v1/wallet/{address}/risk",
            get(handlers::wallet_risk::<F>),
        )
        .route("/api/v1/analyze", post(handlers::analyze::<F>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve<F: TransactionFeed + 'static>(
    state: AppState<F>,
    host: &str,
    port: u16,
) -> eyre::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre::eyre!("Failed to bind API listener on {}: {}", addr, e))?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
