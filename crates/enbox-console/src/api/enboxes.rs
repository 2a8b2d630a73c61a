//! Enbox account endpoints.
//!
//! Provides:
//! - GET /api/enboxes - List enboxes
//! - POST /api/enboxes - Create an enbox
//! - POST /api/enboxes/activation - Activate or deactivate an enbox

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Response,
    routing::{get, post},
};
use enbox_core::CreateEnboxForm;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::{reject, respond};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_enboxes).post(create_enbox))
        .route("/activation", post(set_activation))
}

/// Body of an activation toggle from the enbox list.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivationRequest {
    #[serde(default)]
    pub email: String,
    pub active: bool,
}

async fn list_enboxes(State(state): State<AppState>) -> Response {
    respond(state.client.list_enboxes().await)
}

async fn create_enbox(
    State(state): State<AppState>,
    form: Result<Json<CreateEnboxForm>, JsonRejection>,
) -> Response {
    match form {
        Ok(Json(form)) => respond(state.client.create_enbox(&form).await),
        Err(rejection) => reject(rejection),
    }
}

async fn set_activation(
    State(state): State<AppState>,
    request: Result<Json<ActivationRequest>, JsonRejection>,
) -> Response {
    match request {
        Ok(Json(request)) => {
            respond(state.client.set_active(&request.email, request.active).await)
        }
        Err(rejection) => reject(rejection),
    }
}
