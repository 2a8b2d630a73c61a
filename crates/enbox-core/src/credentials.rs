//! Static credentials forwarded to the MSP gateway.
//!
//! Secrets are resolved exactly once when the provider is built. A missing
//! secret does not stop the process; it only disables the operations that
//! need it.

use std::{env, fmt};

use thiserror::Error;
use tracing::warn;

use crate::config::CredentialsConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("missing credential {key}")]
    Missing { key: String },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub access_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// One named configuration entry and its resolved value, if any.
#[derive(Clone)]
struct Secret {
    key: String,
    value: Option<String>,
}

impl Secret {
    fn resolve(setting: &str, raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self {
                key: setting.to_string(),
                value: None,
            };
        };

        match raw.strip_prefix("env:") {
            Some(name) => {
                let value = env::var(name).ok().filter(|v| !v.trim().is_empty());
                if value.is_none() {
                    warn!(key = name, "credential environment variable is not set");
                }
                Self {
                    key: name.to_string(),
                    value,
                }
            }
            None => Self {
                key: setting.to_string(),
                value: Some(raw.to_string()).filter(|v| !v.trim().is_empty()),
            },
        }
    }

    fn get(&self) -> Result<&str, CredentialError> {
        self.value
            .as_deref()
            .ok_or_else(|| CredentialError::Missing {
                key: self.key.clone(),
            })
    }
}

#[derive(Clone)]
pub struct CredentialProvider {
    api_key: Secret,
    access_token: Secret,
}

impl CredentialProvider {
    pub fn from_config(config: &CredentialsConfig) -> Self {
        Self {
            api_key: Secret::resolve("credentials.api_key", config.api_key.as_deref()),
            access_token: Secret::resolve(
                "credentials.access_token",
                config.access_token.as_deref(),
            ),
        }
    }

    /// Builds a provider from already-known values. Empty strings count as absent.
    pub fn from_values(api_key: Option<&str>, access_token: Option<&str>) -> Self {
        Self {
            api_key: Secret::resolve("credentials.api_key", api_key),
            access_token: Secret::resolve("credentials.access_token", access_token),
        }
    }

    /// Returns the full credential set; the API key is mandatory.
    pub fn load(&self) -> Result<Credentials, CredentialError> {
        Ok(Credentials {
            api_key: self.api_key()?.to_string(),
            access_token: self.access_token.value.clone(),
        })
    }

    /// Key for the account-management endpoints.
    pub fn api_key(&self) -> Result<&str, CredentialError> {
        self.api_key.get()
    }

    /// Bearer token for the email-sending endpoint.
    pub fn access_token(&self) -> Result<&str, CredentialError> {
        self.access_token.get()
    }
}

impl fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("api_key", &self.api_key.key)
            .field("api_key_present", &self.api_key.value.is_some())
            .field("access_token", &self.access_token.key)
            .field("access_token_present", &self.access_token.value.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::sync::Mutex;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn literal_values_are_used_as_is() {
        let provider = CredentialProvider::from_values(Some("key-1"), Some("token-1"));
        let creds = provider.load().expect("credentials load");
        assert_eq!(creds.api_key, "key-1");
        assert_eq!(creds.access_token.as_deref(), Some("token-1"));
    }

    #[test]
    fn missing_api_key_fails_closed() {
        let provider = CredentialProvider::from_values(None, Some("token-1"));
        let err = provider.load().expect_err("api key required");
        assert_eq!(
            err,
            CredentialError::Missing {
                key: "credentials.api_key".into()
            }
        );
        assert_eq!(provider.access_token(), Ok("token-1"));
    }

    #[test]
    fn empty_values_count_as_absent() {
        let provider = CredentialProvider::from_values(Some("  "), Some(""));
        assert!(provider.api_key().is_err());
        assert!(provider.access_token().is_err());
    }

    #[test]
    fn env_markers_resolve_once_and_report_variable_name() {
        let _guard = ENV_LOCK.lock().expect("lock env");
        unsafe { env::set_var("ENBOX_TEST_API_KEY", "from-env") };
        unsafe { env::remove_var("ENBOX_TEST_TOKEN") };

        let provider = CredentialProvider::from_config(&CredentialsConfig {
            api_key: Some("env:ENBOX_TEST_API_KEY".into()),
            access_token: Some("env:ENBOX_TEST_TOKEN".into()),
        });

        // Later changes to the environment are not observed.
        unsafe { env::set_var("ENBOX_TEST_TOKEN", "late") };
        unsafe { env::remove_var("ENBOX_TEST_API_KEY") };

        assert_eq!(provider.api_key(), Ok("from-env"));
        assert_eq!(
            provider.access_token(),
            Err(CredentialError::Missing {
                key: "ENBOX_TEST_TOKEN".into()
            })
        );

        unsafe { env::remove_var("ENBOX_TEST_TOKEN") };
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let provider = CredentialProvider::from_values(Some("secret-key"), Some("secret-token"));
        let rendered = format!("{provider:?} {:?}", provider.load().expect("load"));
        assert!(!rendered.contains("secret-key"));
        assert!(!rendered.contains("secret-token"));
    }
}
