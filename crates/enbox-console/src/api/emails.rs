//! Email sending endpoint.
//!
//! Provides:
//! - POST /api/emails - Send (or schedule) an email through the mail gateway

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::post,
};
use enbox_core::SendEmailForm;

use super::{reject, respond};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(send_email))
}

async fn send_email(
    State(state): State<AppState>,
    form: Result<Json<SendEmailForm>, JsonRejection>,
) -> Response {
    match form {
        Ok(Json(form)) => respond(state.client.send_email(&form).await),
        Err(rejection) => reject(rejection),
    }
}
