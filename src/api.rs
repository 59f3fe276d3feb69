use crate::server::AppState;
use crate::upstream::UpstreamError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, info};

pub const MISSING_IF_MATCH: &str = "If-Match header is required for updates";
pub const UNREADABLE_IF_MATCH: &str = "If-Match header must be visible ASCII";

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "CRM Scoring Widget API is running",
    }))
}

pub async fn get_account(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    info!(account_id = %id, "fetching account");
    match state.upstream.get_account(&id).await {
        Ok(account) => Json(account).into_response(),
        Err(err) => {
            error!(account_id = %id, %err, "error fetching account");
            upstream_failure(err)
        }
    }
}

pub async fn patch_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(raw_if_match) = headers.get(header::IF_MATCH).filter(|v| !v.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, MISSING_IF_MATCH);
    };
    let Ok(if_match) = raw_if_match.to_str() else {
        return error_response(StatusCode::BAD_REQUEST, UNREADABLE_IF_MATCH);
    };

    let patch: Value = match serde_json::from_slice(&body) {
        Ok(patch) => patch,
        Err(err) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &format!("request body is not valid JSON: {err}"),
            );
        }
    };

    info!(account_id = %id, %if_match, body = %patch, "updating account");
    match state.upstream.patch_account(&id, if_match, patch).await {
        Ok(account) => Json(account).into_response(),
        Err(err) => {
            error!(account_id = %id, %err, "error updating account");
            upstream_failure(err)
        }
    }
}

fn upstream_failure(err: UpstreamError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
