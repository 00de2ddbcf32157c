use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::feed::{FeedError, Transaction, TransactionFeed};
use crate::pipeline::normalize_address;
use crate::risk::RiskAnalysisResult;

use super::types::*;
use super::AppState;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

fn api_error(status: StatusCode, msg: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: msg.into(),
        }),
    )
}

fn parse_address(raw: &str) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    normalize_address(raw).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))
}

fn feed_error_status(err: &FeedError) -> StatusCode {
    match err {
        FeedError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        FeedError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::BAD_GATEWAY,
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health<F: TransactionFeed>(
    State(state): State<Arc<AppState<F>>>,
) -> ApiResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        knowledge_base_entries: state.pipeline.knowledge_base().len(),
    }))
}

// ============================================================
// Risk analysis
// ============================================================

pub async fn wallet_risk<F: TransactionFeed>(
    State(state): State<Arc<AppState<F>>>,
    Path(address): Path<String>,
) -> ApiResult<RiskAnalysisResult> {
    let addr = parse_address(&address)?;
    state
        .pipeline
        .analyze_address(&state.feed, &addr, state.fetch_timeout)
        .await
        .map(Json)
        .map_err(|e| api_error(feed_error_status(&e), e.to_string()))
}

pub async fn analyze<F: TransactionFeed>(
    State(state): State<Arc<AppState<F>>>,
    Json(request): Json<AnalyzeRequest>,
) -> ApiResult<RiskAnalysisResult> {
    let addr = parse_address(&request.address)?;
    let transactions: Vec<Transaction> = request
        .transactions
        .iter()
        .map(|raw| raw.normalize())
        .collect();

    Ok(Json(state.pipeline.analyze_transactions(
        &addr,
        &transactions,
        &request.real_time_flags,
        chrono::Utc::now().timestamp(),
    )))
}
