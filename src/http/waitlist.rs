use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::http::response::status_for;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::waitlist::service::VALIDATION_MESSAGE;
use crate::waitlist::{ActionResult, Role, RoleOption, SubmissionInput};

pub const INVALID_BODY: &str = "Invalid request body";

pub async fn join_waitlist(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmissionInput>, JsonRejection>,
) -> Response {
    let Json(input) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let status = rejection.status();
            tracing::debug!(status = %status, reason = %rejection.body_text(), "Rejected submission body");
            metrics::record_request("POST", "/api/waitlist", status.as_u16());
            return (status, Json(ActionResult::failed(VALIDATION_MESSAGE, INVALID_BODY)))
                .into_response();
        }
    };

    let outcome = state.service.submit(&input, &headers).await;
    metrics::record_request("POST", "/api/waitlist", status_for(&outcome).as_u16());
    outcome.into_response()
}

pub async fn list_roles() -> Json<Vec<RoleOption>> {
    metrics::record_request("GET", "/api/roles", 200);
    Json(Role::ALL.into_iter().map(RoleOption::from).collect())
}

pub async fn health(State(state): State<AppState>) -> Response {
    let ping = state.service.store().ping();
    let result = match state.service.deadline() {
        Some(deadline) => match tokio::time::timeout(deadline, ping).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("no answer within {deadline:?}")),
        },
        None => ping.await.map_err(|e| e.to_string()),
    };

    match result {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed: store unreachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}
