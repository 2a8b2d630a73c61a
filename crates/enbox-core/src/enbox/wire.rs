//! JSON payloads for the two account-management schemes and the mail endpoint.

use chrono::SecondsFormat;
use serde_json::{Map, Value, json};

use crate::enbox::error::EnboxError;
use crate::enbox::transport::HttpMethod;
use crate::enbox::types::{
    ActivationToggle, EmailMessage, EnboxCreateRequest, ToggleAction, WireMode,
};

pub const ENBOXES_PATH: &str = "/enboxes";

/// Method, path and body for one account-management call.
#[derive(Debug, Clone, PartialEq)]
pub struct WireCall {
    pub method: HttpMethod,
    pub path: &'static str,
    pub body: Option<Value>,
}

pub fn list_call(mode: WireMode) -> WireCall {
    match mode {
        WireMode::Path => WireCall {
            method: HttpMethod::Get,
            path: ENBOXES_PATH,
            body: None,
        },
        WireMode::Action => WireCall {
            method: HttpMethod::Post,
            path: "",
            body: Some(json!({"action": "list_enboxes"})),
        },
    }
}

pub fn create_call(mode: WireMode, request: &EnboxCreateRequest) -> WireCall {
    match mode {
        WireMode::Path => {
            let mut body = Map::new();
            body.insert("email".into(), json!(request.email));
            body.insert("display_name".into(), json!(request.display_name));
            body.insert("create_via".into(), json!(request.method.as_str()));
            if let Some(password) = &request.password {
                body.insert("password".into(), json!(password));
            }
            WireCall {
                method: HttpMethod::Post,
                path: ENBOXES_PATH,
                body: Some(Value::Object(body)),
            }
        }
        WireMode::Action => {
            let mut body = Map::new();
            body.insert("action".into(), json!("create_enbox"));
            body.insert("email".into(), json!(request.email));
            body.insert("method".into(), json!(request.method.as_str()));
            if let Some(password) = &request.password {
                body.insert("password".into(), json!(password));
            }
            body.insert("display_name".into(), json!(request.display_name));
            WireCall {
                method: HttpMethod::Post,
                path: "",
                body: Some(Value::Object(body)),
            }
        }
    }
}

/// Path-style gateways expose no activation endpoint.
pub fn toggle_call(mode: WireMode, toggle: &ActivationToggle) -> Result<WireCall, EnboxError> {
    let action = match toggle.action {
        ToggleAction::Activate => "activate_enbox",
        ToggleAction::Deactivate => "deactivate_enbox",
    };

    match mode {
        WireMode::Path => Err(EnboxError::UnsupportedOperation {
            operation: action,
            mode,
        }),
        WireMode::Action => Ok(WireCall {
            method: HttpMethod::Post,
            path: "",
            body: Some(json!({"action": action, "email": toggle.email})),
        }),
    }
}

pub fn email_body(message: &EmailMessage) -> Value {
    let mut body = Map::new();
    body.insert("to".into(), json!(message.to));
    if !message.cc.is_empty() {
        body.insert("cc".into(), json!(message.cc));
    }
    if !message.bcc.is_empty() {
        body.insert("bcc".into(), json!(message.bcc));
    }
    body.insert("subject".into(), json!(message.subject));
    if let Some(text) = &message.body_text {
        body.insert("body_text".into(), json!(text));
    }
    if let Some(html) = &message.body_html {
        body.insert("body_html".into(), json!(html));
    }
    body.insert("send_via".into(), json!(message.send_via.as_str()));
    if let Some(at) = message.scheduled_at {
        body.insert(
            "scheduled_at".into(),
            json!(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }
    body.insert(
        "read_receipt_requested".into(),
        json!(message.read_receipt_requested),
    );
    Value::Object(body)
}
