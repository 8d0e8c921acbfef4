use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use scribe_core::ids::UserId;
use scribe_core::outcome::AgentTurn;
use scribe_core::reply::TurnReply;
use scribe_core::style::TemplateSummary;
use scribe_store::StoreError;

use crate::server::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRequest {
    pub user_id: UserId,
    #[serde(flatten)]
    pub turn: AgentTurn,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub user_id: UserId,
    pub balance: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantRequest {
    pub amount: i64,
}

/// POST /turn — fulfill one agent turn and return the shaped reply.
#[instrument(skip(state, req), fields(user_id = %req.user_id))]
pub async fn post_turn(
    State(state): State<AppState>,
    Json(req): Json<TurnRequest>,
) -> Json<TurnReply> {
    Json(state.dispatcher.dispatch_turn(&req.turn, &req.user_id))
}

/// GET /artifacts/{name} — download a rendered PDF.
#[instrument(skip(state))]
pub async fn get_artifact(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Response {
    match state.artifacts.retrieve(&name) {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{name}\"");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::CONTENT_LENGTH, bytes.len().to_string()),
                ],
                bytes,
            )
                .into_response()
        }
        Err(StoreError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(error_body("artifact not found"))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "artifact read failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body("artifact read failed")))
                .into_response()
        }
    }
}

/// GET /templates — the public catalog.
#[instrument(skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Response {
    match state.templates.list_public() {
        Ok(list) => {
            let summaries: Vec<TemplateSummary> = list.iter().map(TemplateSummary::from).collect();
            Json(summaries).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "template listing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body("template listing failed")))
                .into_response()
        }
    }
}

/// GET /credits/{user_id} — current balance.
#[instrument(skip(state))]
pub async fn get_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Response {
    let user_id = UserId::from_raw(user_id);
    match state.credits.balance(&user_id) {
        Ok(balance) => Json(BalanceResponse { user_id, balance }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "balance lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body("balance lookup failed")))
                .into_response()
        }
    }
}

/// POST /credits/{user_id}/grant — add credits.
#[instrument(skip(state, req))]
pub async fn grant_credits(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<GrantRequest>,
) -> Response {
    let user_id = UserId::from_raw(user_id);
    match state.credits.grant(&user_id, req.amount) {
        Ok(balance) => Json(BalanceResponse { user_id, balance }).into_response(),
        Err(StoreError::Conflict(msg)) => {
            (StatusCode::BAD_REQUEST, Json(error_body(&msg))).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "grant failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body("grant failed"))).into_response()
        }
    }
}

/// GET /health — verifies the database answers.
pub async fn health(State(state): State<AppState>) -> Response {
    let alive = state
        .db
        .with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(StoreError::from)
        })
        .is_ok();
    if alive {
        (StatusCode::OK, Json(serde_json::json!({ "status": "healthy" }))).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "unhealthy" })),
        )
            .into_response()
    }
}

fn error_body(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}
