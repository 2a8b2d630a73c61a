use serde::Deserialize;
use std::time::Duration;
use std::{env, path::Path, path::PathBuf};
use thiserror::Error;

use crate::enbox::WireMode;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    pub app: AppConfig,
    pub telemetry: TelemetryConfig,
    pub enbox: EnboxApiConfig,
    #[serde(default)]
    pub email: EmailApiConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    pub service_name: String,
    pub port: u16,
    pub env: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TelemetryConfig {
    pub otlp_endpoint: Option<String>,
    pub export_traces: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnboxApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub wire_mode: WireMode,
    /// Overrides the mode's default API key header name.
    #[serde(default)]
    pub api_key_header: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl EnboxApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmailApiConfig {
    #[serde(default)]
    pub send_url: Option<String>,
}

/// Secret references. `env:` markers here are resolved by the credential
/// provider, which tolerates missing variables.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CredentialsConfig {
    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,
    #[serde(default = "default_access_token")]
    pub access_token: Option<String>,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            access_token: default_access_token(),
        }
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn describe(value: &Option<String>) -> &str {
            match value.as_deref() {
                Some(v) if v.starts_with("env:") => v,
                Some(_) => "<redacted>",
                None => "<unset>",
            }
        }
        f.debug_struct("CredentialsConfig")
            .field("api_key", &describe(&self.api_key))
            .field("access_token", &describe(&self.access_token))
            .finish()
    }
}

fn default_api_key() -> Option<String> {
    Some("env:MSP_API_KEY".to_string())
}

fn default_access_token() -> Option<String> {
    Some("env:MSP_ACCESS_TOKEN".to_string())
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    ConfigBuild(config::ConfigError),
    #[error("failed to parse configuration: {0}")]
    Deserialize(config::ConfigError),
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid APP_PORT override: {0}")]
    InvalidPort(std::num::ParseIntError),
    #[error("invalid wire mode {0:?}; expected \"path\" or \"action\"")]
    InvalidWireMode(String),
}

impl Config {
    /// Load configuration from the provided path, apply environment overrides, and
    /// resolve `env:` indirections in non-secret fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = expand_path(path.as_ref());
        let raw = config::Config::builder()
            .add_source(config::File::from(path.as_path()))
            .build()
            .map_err(ConfigError::ConfigBuild)?;

        let mut cfg: Config = raw.try_deserialize().map_err(ConfigError::Deserialize)?;
        cfg.apply_env_overrides()?;
        cfg.resolve_env_markers()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var("APP_PORT") {
            let port: u16 = port.parse().map_err(ConfigError::InvalidPort)?;
            self.app.port = port;
        }

        if let Ok(otlp) = env::var("OTLP_ENDPOINT") {
            self.telemetry.otlp_endpoint = Some(otlp);
        }

        if let Ok(base_url) = env::var("ENBOX_BASE_URL") {
            self.enbox.base_url = base_url;
        }

        if let Ok(mode) = env::var("ENBOX_WIRE_MODE") {
            self.enbox.wire_mode = mode.parse().map_err(ConfigError::InvalidWireMode)?;
        }

        Ok(())
    }

    fn resolve_env_markers(&mut self) -> Result<(), ConfigError> {
        apply_env_marker(&mut self.app.service_name)?;
        apply_env_marker(&mut self.app.env)?;
        apply_env_marker(&mut self.enbox.base_url)?;
        if let Some(header) = &mut self.enbox.api_key_header {
            apply_env_marker(header)?;
        }
        if let Some(url) = &mut self.email.send_url {
            apply_env_marker(url)?;
        }
        if let Some(endpoint) = &mut self.telemetry.otlp_endpoint {
            apply_env_marker(endpoint)?;
        }
        Ok(())
    }
}

/// Resolves the config path from `CONFIG_PATH`, falling back to `config.toml`.
pub fn config_path_from_env() -> PathBuf {
    let raw = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    expand_path(Path::new(&raw))
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&raw).as_ref())
}

fn apply_env_marker(value: &mut String) -> Result<(), ConfigError> {
    if let Some(rest) = value.strip_prefix("env:") {
        let resolved = env::var(rest).map_err(|_| ConfigError::MissingEnvVar(rest.to_string()))?;
        *value = resolved;
    }
    Ok(())
}
