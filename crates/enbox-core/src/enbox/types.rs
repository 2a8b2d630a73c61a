use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Which of the two account-management wire schemes a deployment speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireMode {
    /// `GET|POST {base}/enboxes` with an `x-msp-api-key` header.
    #[default]
    Path,
    /// `POST {base}` with an `action` field and an `X-MSP-API-Key` header.
    Action,
}

impl WireMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WireMode::Path => "path",
            WireMode::Action => "action",
        }
    }

    pub fn default_api_key_header(&self) -> &'static str {
        match self {
            WireMode::Path => "x-msp-api-key",
            WireMode::Action => "X-MSP-API-Key",
        }
    }
}

impl fmt::Display for WireMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "path" => Ok(WireMode::Path),
            "action" => Ok(WireMode::Action),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CreateVia {
    #[default]
    Direct,
    Invite,
}

impl CreateVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreateVia::Direct => "direct",
            CreateVia::Invite => "invite",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SendVia {
    #[default]
    Enbox,
    Smtp,
}

impl SendVia {
    pub fn as_str(&self) -> &'static str {
        match self {
            SendVia::Enbox => "enbox",
            SendVia::Smtp => "smtp",
        }
    }
}

/// Which bodies the compose form asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum BodyFormat {
    #[default]
    Text,
    Html,
    Both,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum EnboxStatus {
    Active,
    Inactive,
    #[default]
    Unknown,
}

impl EnboxStatus {
    /// Maps a gateway status string. Anything unrecognised is `Unknown`.
    pub fn from_wire(status: &str) -> Self {
        match status.trim() {
            s if s.eq_ignore_ascii_case("active") => EnboxStatus::Active,
            s if s.eq_ignore_ascii_case("inactive") => EnboxStatus::Inactive,
            _ => EnboxStatus::Unknown,
        }
    }
}

/// Server-owned mailbox record. Only ever decoded from list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Enbox {
    pub email: String,
    pub display_name: Option<String>,
    pub status: EnboxStatus,
    pub create_via: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct EnboxRecord {
    email: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    create_via: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl<'de> Deserialize<'de> for Enbox {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let record = EnboxRecord::deserialize(deserializer)?;
        // Some gateway builds report a boolean flag instead of a status string.
        let status = match (record.status.as_deref(), record.is_active) {
            (Some(status), _) => EnboxStatus::from_wire(status),
            (None, Some(true)) => EnboxStatus::Active,
            (None, Some(false)) => EnboxStatus::Inactive,
            (None, None) => EnboxStatus::Unknown,
        };

        Ok(Enbox {
            email: record.email,
            display_name: record.display_name,
            status,
            create_via: record.create_via,
            created_at: record.created_at,
        })
    }
}

/// Result of a list call. Gateways answer with either a bare array of
/// records or some wrapped object; the latter is passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "shape", content = "data", rename_all = "snake_case")]
pub enum EnboxList {
    Records(Vec<Enbox>),
    Raw(Value),
}

impl EnboxList {
    pub fn from_value(value: Value) -> Self {
        let Value::Array(items) = &value else {
            return EnboxList::Raw(value);
        };

        let decoded: Result<Vec<Enbox>, _> = items
            .iter()
            .map(|item| serde_json::from_value::<Enbox>(item.clone()))
            .collect();

        match decoded {
            Ok(records) => EnboxList::Records(records),
            Err(_) => EnboxList::Raw(value),
        }
    }

    pub fn records(&self) -> Option<&[Enbox]> {
        match self {
            EnboxList::Records(records) => Some(records.as_slice()),
            EnboxList::Raw(_) => None,
        }
    }
}

/// Raw create-form input, before validation.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateEnboxForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub method: CreateVia,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl fmt::Debug for CreateEnboxForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateEnboxForm")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("method", &self.method)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Validated create request.
#[derive(Clone, PartialEq, Eq)]
pub struct EnboxCreateRequest {
    pub email: String,
    pub display_name: String,
    pub method: CreateVia,
    /// Always `Some` for `Direct`, always `None` for `Invite`.
    pub password: Option<String>,
}

impl fmt::Debug for EnboxCreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnboxCreateRequest")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("method", &self.method)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Raw compose-form input. Recipient fields hold one address per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SendEmailForm {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub cc: String,
    #[serde(default)]
    pub bcc: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub format: BodyFormat,
    #[serde(default)]
    pub send_via: SendVia,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_receipt_requested: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub send_via: SendVia,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub read_receipt_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationToggle {
    pub action: ToggleAction,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum FailureKind {
    ConfigMissing,
    Validation,
    Transport,
    ApiError,
}

/// Terminal outcome of one facade call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ApiResult<T> {
    Success { status_code: u16, value: T },
    Failure { kind: FailureKind, message: String },
}

impl<T> ApiResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResult::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ApiResult::Success { .. } => None,
            ApiResult::Failure { kind, .. } => Some(*kind),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ApiResult::Success { value, .. } => Some(value),
            ApiResult::Failure { .. } => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            ApiResult::Success { status_code, value } => ApiResult::Success {
                status_code,
                value: f(value),
            },
            ApiResult::Failure { kind, message } => ApiResult::Failure { kind, message },
        }
    }
}
