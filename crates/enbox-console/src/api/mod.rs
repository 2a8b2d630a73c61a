//! JSON API backing the console pages.
//!
//! - /api/enboxes - list, create, activation toggles
//! - /api/emails - send mail

pub mod emails;
pub mod enboxes;

use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use enbox_core::{ApiResult, FailureKind};
use serde::Serialize;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/enboxes", enboxes::router())
        .nest("/emails", emails::router())
}

/// Renders a facade result with a status that matches its outcome.
pub(crate) fn respond<T: Serialize>(result: ApiResult<T>) -> Response {
    let status = match result.failure_kind() {
        None => StatusCode::OK,
        Some(FailureKind::Validation) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(FailureKind::ConfigMissing) => StatusCode::SERVICE_UNAVAILABLE,
        Some(FailureKind::Transport) | Some(FailureKind::ApiError) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(result)).into_response()
}

/// Undecodable request bodies are reported as validation failures so every
/// route answers with the same envelope.
pub(crate) fn reject(rejection: JsonRejection) -> Response {
    respond::<()>(ApiResult::Failure {
        kind: FailureKind::Validation,
        message: rejection.body_text(),
    })
}

#[cfg(test)]
pub(crate) async fn read_json(response: Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let body = serde_json::from_slice(&bytes).expect("json body");
    (status, body)
}
