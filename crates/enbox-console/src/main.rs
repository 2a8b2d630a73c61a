mod api;

use std::{net::SocketAddr, sync::Arc};

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use enbox_core::config::config_path_from_env;
use enbox_core::{
    Config, CredentialProvider, EnboxClient, EndpointConfig, ReqwestTransport, init_telemetry,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    client: Arc<EnboxClient>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config_path_from_env();
    let config = Config::load(&config_path)?;

    let _guard = init_telemetry(&config.app, &config.telemetry)?;

    let credentials = CredentialProvider::from_config(&config.credentials);
    let endpoints = EndpointConfig::from_config(&config.enbox, &config.email);
    let transport = ReqwestTransport::with_timeout(config.enbox.request_timeout())?;
    info!(
        wire_mode = %endpoints.wire_mode,
        base_url = %endpoints.base_url,
        email_enabled = endpoints.send_email_url.is_some(),
        "enbox client configured"
    );

    let client = EnboxClient::new(endpoints, credentials, Arc::new(transport));
    let state = AppState {
        client: Arc::new(client),
    };
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Enbox console listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api::router())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    wire_mode: String,
}

async fn healthz(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            wire_mode: state.client.endpoints().wire_mode.to_string(),
        }),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("received ctrl+c, shutting down");
        }
        _ = terminate => {
            warn!("received terminate signal, shutting down");
        }
    }
}
