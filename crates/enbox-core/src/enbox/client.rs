use std::sync::Arc;

use serde_json::Value;
use tracing::{Instrument, info, info_span, warn};

use crate::config::{EmailApiConfig, EnboxApiConfig};
use crate::credentials::CredentialProvider;
use crate::enbox::{
    builder::{build_activation_toggle, build_create, build_send_email},
    error::EnboxError,
    normalize::{normalize, normalize_list},
    transport::{HttpMethod, HttpTransport, OutboundRequest, RawResponse},
    types::{ApiResult, CreateEnboxForm, EnboxList, SendEmailForm, WireMode},
    wire::{self, WireCall},
};

const CONTENT_TYPE: (&str, &str) = ("Content-Type", "application/json");

/// Where each operation category is sent and how it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub wire_mode: WireMode,
    pub api_key_header: String,
    pub send_email_url: Option<String>,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, wire_mode: WireMode) -> Self {
        Self {
            base_url: base_url.into(),
            wire_mode,
            api_key_header: wire_mode.default_api_key_header().to_string(),
            send_email_url: None,
        }
    }

    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn with_send_email_url(mut self, url: impl Into<String>) -> Self {
        self.send_email_url = Some(url.into());
        self
    }

    pub fn from_config(enbox: &EnboxApiConfig, email: &EmailApiConfig) -> Self {
        let mut endpoints = Self::new(enbox.base_url.clone(), enbox.wire_mode);
        if let Some(header) = enbox.api_key_header.as_deref().filter(|h| !h.is_empty()) {
            endpoints = endpoints.with_api_key_header(header);
        }
        if let Some(url) = email.send_url.as_deref().filter(|u| !u.is_empty()) {
            endpoints = endpoints.with_send_email_url(url);
        }
        endpoints
    }
}

/// One entry point per console operation.
///
/// Every method resolves its credential first and returns
/// `Failure { ConfigMissing }` without touching the transport when it is
/// absent. Nothing is cached between calls.
pub struct EnboxClient {
    endpoints: EndpointConfig,
    credentials: CredentialProvider,
    transport: Arc<dyn HttpTransport>,
}

impl EnboxClient {
    pub fn new(
        endpoints: EndpointConfig,
        credentials: CredentialProvider,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            endpoints,
            credentials,
            transport,
        }
    }

    pub fn endpoints(&self) -> &EndpointConfig {
        &self.endpoints
    }

    pub async fn create_enbox(&self, form: &CreateEnboxForm) -> ApiResult<Value> {
        let span = info_span!("enbox.create", wire_mode = %self.endpoints.wire_mode);
        let result = match self.try_create(form).instrument(span.clone()).await {
            Ok(response) => normalize(response),
            Err(err) => err.into(),
        };
        span.in_scope(|| log_outcome("create_enbox", &result));
        result
    }

    pub async fn list_enboxes(&self) -> ApiResult<EnboxList> {
        let span = info_span!("enbox.list", wire_mode = %self.endpoints.wire_mode);
        let result = match self.try_list().instrument(span.clone()).await {
            Ok(response) => normalize_list(response),
            Err(err) => err.into(),
        };
        span.in_scope(|| log_outcome("list_enboxes", &result));
        result
    }

    pub async fn set_active(&self, email: &str, active: bool) -> ApiResult<Value> {
        let span = info_span!(
            "enbox.set_active",
            wire_mode = %self.endpoints.wire_mode,
            active
        );
        let result = match self.try_set_active(email, active).instrument(span.clone()).await {
            Ok(response) => normalize(response),
            Err(err) => err.into(),
        };
        span.in_scope(|| log_outcome("set_active", &result));
        result
    }

    pub async fn send_email(&self, form: &SendEmailForm) -> ApiResult<Value> {
        let span = info_span!("enbox.send_email", send_via = ?form.send_via);
        let result = match self.try_send_email(form).instrument(span.clone()).await {
            Ok(response) => normalize(response),
            Err(err) => err.into(),
        };
        span.in_scope(|| log_outcome("send_email", &result));
        result
    }

    async fn try_create(&self, form: &CreateEnboxForm) -> Result<RawResponse, EnboxError> {
        let api_key = self.credentials.api_key()?;
        let request = build_create(form)?;
        let call = wire::create_call(self.endpoints.wire_mode, &request);
        self.dispatch_account(call, api_key).await
    }

    async fn try_list(&self) -> Result<RawResponse, EnboxError> {
        let api_key = self.credentials.api_key()?;
        let call = wire::list_call(self.endpoints.wire_mode);
        self.dispatch_account(call, api_key).await
    }

    async fn try_set_active(&self, email: &str, active: bool) -> Result<RawResponse, EnboxError> {
        let api_key = self.credentials.api_key()?;
        let toggle = build_activation_toggle(email, active)?;
        let call = wire::toggle_call(self.endpoints.wire_mode, &toggle)?;
        self.dispatch_account(call, api_key).await
    }

    async fn try_send_email(&self, form: &SendEmailForm) -> Result<RawResponse, EnboxError> {
        let token = self.credentials.access_token()?;
        let url = self
            .endpoints
            .send_email_url
            .as_deref()
            .ok_or(EnboxError::MissingEndpoint {
                setting: "email.send_url",
            })?;
        let message = build_send_email(form)?;

        let request = OutboundRequest {
            method: HttpMethod::Post,
            base_url: url.to_string(),
            path: String::new(),
            headers: vec![
                header(CONTENT_TYPE),
                ("Authorization".to_string(), format!("Bearer {token}")),
            ],
            body: Some(wire::email_body(&message)),
        };
        Ok(self.transport.send(request).await?)
    }

    async fn dispatch_account(
        &self,
        call: WireCall,
        api_key: &str,
    ) -> Result<RawResponse, EnboxError> {
        let request = OutboundRequest {
            method: call.method,
            base_url: self.endpoints.base_url.clone(),
            path: call.path.to_string(),
            headers: vec![
                header(CONTENT_TYPE),
                (self.endpoints.api_key_header.clone(), api_key.to_string()),
            ],
            body: call.body,
        };
        Ok(self.transport.send(request).await?)
    }
}

fn header((name, value): (&str, &str)) -> (String, String) {
    (name.to_string(), value.to_string())
}

fn log_outcome<T>(operation: &str, result: &ApiResult<T>) {
    match result {
        ApiResult::Success { status_code, .. } => {
            info!(operation, status_code, "enbox request succeeded");
        }
        ApiResult::Failure { kind, message } => {
            warn!(operation, kind = ?kind, message = %message, "enbox request failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enbox::mock::MockTransport;
    use crate::enbox::transport::TransportError;
    use crate::enbox::types::{BodyFormat, CreateVia, FailureKind};
    use serde_json::json;

    const BASE: &str = "https://gw.test/functions/v1/msp-gateway";
    const MAIL: &str = "https://gw.test/functions/v1/send-email";

    fn client_with(
        mode: WireMode,
        credentials: CredentialProvider,
        transport: &MockTransport,
    ) -> EnboxClient {
        EnboxClient::new(
            EndpointConfig::new(BASE, mode).with_send_email_url(MAIL),
            credentials,
            Arc::new(transport.clone()),
        )
    }

    fn client(mode: WireMode, transport: &MockTransport) -> EnboxClient {
        client_with(
            mode,
            CredentialProvider::from_values(Some("key-1"), Some("token-1")),
            transport,
        )
    }

    fn direct_form() -> CreateEnboxForm {
        CreateEnboxForm {
            email: "customer@example.com".into(),
            display_name: "Customer".into(),
            method: CreateVia::Direct,
            password: Some("password1".into()),
            password_confirmation: Some("password1".into()),
        }
    }

    fn email_form() -> SendEmailForm {
        SendEmailForm {
            to: "a@example.com".into(),
            subject: "Hello".into(),
            body_text: Some("hi".into()),
            format: BodyFormat::Text,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_returns_success_with_decoded_body() {
        let transport = MockTransport::new();
        transport.enqueue_status(200, r#"{"id":"e1"}"#);
        let client = client(WireMode::Path, &transport);

        let result = client.create_enbox(&direct_form()).await;

        assert_eq!(
            result,
            ApiResult::Success {
                status_code: 200,
                value: json!({"id": "e1"}),
            }
        );
        let request = transport.last_request().expect("request sent");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url(), format!("{BASE}/enboxes"));
        assert_eq!(request.header("x-msp-api-key"), Some("key-1"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(
            request.body,
            Some(json!({
                "email": "customer@example.com",
                "display_name": "Customer",
                "create_via": "direct",
                "password": "password1",
            }))
        );
    }

    #[tokio::test]
    async fn api_errors_surface_status_and_body_for_every_operation() {
        let transport = MockTransport::new();
        for _ in 0..4 {
            transport.enqueue_status(404, "not found");
        }
        let client = client(WireMode::Action, &transport);
        let expected = (FailureKind::ApiError, "404: not found".to_string());

        let outcomes = vec![
            client.create_enbox(&direct_form()).await,
            client.list_enboxes().await.map(|_| Value::Null),
            client.set_active("customer@example.com", true).await,
            client.send_email(&email_form()).await,
        ];

        for outcome in outcomes {
            match outcome {
                ApiResult::Failure { kind, message } => {
                    assert_eq!((kind, message), expected.clone())
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
        assert_eq!(transport.call_count(), 4);
    }

    #[tokio::test]
    async fn missing_credentials_short_circuit_without_network_calls() {
        let transport = MockTransport::new();
        let client = client_with(
            WireMode::Action,
            CredentialProvider::from_values(None, None),
            &transport,
        );

        let kinds = vec![
            client.create_enbox(&direct_form()).await.failure_kind(),
            client.list_enboxes().await.failure_kind(),
            client.set_active("customer@example.com", false).await.failure_kind(),
            client.send_email(&email_form()).await.failure_kind(),
        ];

        assert!(kinds.iter().all(|k| *k == Some(FailureKind::ConfigMissing)));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_credential_wins_over_invalid_input() {
        let transport = MockTransport::new();
        let client = client_with(
            WireMode::Path,
            CredentialProvider::from_values(None, None),
            &transport,
        );

        let result = client.create_enbox(&CreateEnboxForm::default()).await;
        assert_eq!(
            result,
            ApiResult::Failure {
                kind: FailureKind::ConfigMissing,
                message: "missing credential credentials.api_key".into(),
            }
        );
    }

    #[tokio::test]
    async fn credential_schemes_are_independent() {
        let transport = MockTransport::new();
        transport.enqueue_status(200, "[]");
        let client = client_with(
            WireMode::Path,
            CredentialProvider::from_values(Some("key-1"), None),
            &transport,
        );

        assert!(client.list_enboxes().await.is_success());
        assert_eq!(
            client.send_email(&email_form()).await.failure_kind(),
            Some(FailureKind::ConfigMissing)
        );
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn invalid_forms_fail_validation_without_network_calls() {
        let transport = MockTransport::new();
        let client = client(WireMode::Path, &transport);

        let mut form = direct_form();
        form.password_confirmation = Some("different".into());
        let result = client.create_enbox(&form).await;
        assert_eq!(
            result,
            ApiResult::Failure {
                kind: FailureKind::Validation,
                message: "password_confirmation: does not match password".into(),
            }
        );

        let result = client.set_active("  ", true).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::Validation));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn unparseable_success_body_is_returned_verbatim() {
        let transport = MockTransport::new();
        transport.enqueue_status(200, "<html>");
        let client = client(WireMode::Path, &transport);

        let result = client.create_enbox(&direct_form()).await;
        assert_eq!(
            result,
            ApiResult::Success {
                status_code: 200,
                value: Value::String("<html>".into()),
            }
        );
    }

    #[tokio::test]
    async fn transport_failures_become_transport_results() {
        let transport = MockTransport::new();
        transport.enqueue_response(Err(TransportError::Connect("dns failure".into())));
        let client = client(WireMode::Path, &transport);

        let result = client.list_enboxes().await;
        assert_eq!(
            result,
            ApiResult::Failure {
                kind: FailureKind::Transport,
                message: "transport error: connection failed: dns failure".into(),
            }
        );
    }

    #[tokio::test]
    async fn path_mode_list_and_unsupported_toggle() {
        let transport = MockTransport::new();
        transport.enqueue_status(200, r#"[{"email":"a@example.com","status":"active"}]"#);
        let client = client(WireMode::Path, &transport);

        let listed = client.list_enboxes().await;
        let records = listed
            .value()
            .and_then(EnboxList::records)
            .expect("decoded records");
        assert_eq!(records.len(), 1);

        let request = transport.last_request().expect("request");
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url(), format!("{BASE}/enboxes"));
        assert_eq!(request.body, None);

        let toggled = client.set_active("a@example.com", false).await;
        assert_eq!(toggled.failure_kind(), Some(FailureKind::ConfigMissing));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn action_mode_routes_to_base_with_action_header() {
        let transport = MockTransport::new();
        transport.enqueue_status(200, r#"{"ok":true}"#);
        transport.enqueue_status(201, r#"{"id":"e2"}"#);
        let client = client(WireMode::Action, &transport);

        assert!(client.set_active("a@example.com", true).await.is_success());
        let mut form = direct_form();
        form.method = CreateVia::Invite;
        assert!(client.create_enbox(&form).await.is_success());

        let requests = transport.requests();
        assert_eq!(requests[0].url(), BASE);
        assert_eq!(requests[0].headers[1].0, "X-MSP-API-Key");
        assert_eq!(
            requests[0].body,
            Some(json!({"action": "activate_enbox", "email": "a@example.com"}))
        );
        assert_eq!(
            requests[1].body,
            Some(json!({
                "action": "create_enbox",
                "email": "customer@example.com",
                "method": "invite",
                "display_name": "Customer",
            }))
        );
    }

    #[tokio::test]
    async fn send_email_uses_bearer_token_and_mail_endpoint() {
        let transport = MockTransport::new();
        transport.enqueue_status(201, r#"{"queued":true}"#);
        let client = client(WireMode::Path, &transport);

        let result = client.send_email(&email_form()).await;
        assert!(result.is_success());

        let request = transport.last_request().expect("request");
        assert_eq!(request.url(), MAIL);
        assert_eq!(request.header("authorization"), Some("Bearer token-1"));
        assert_eq!(request.header("x-msp-api-key"), None);
        assert_eq!(
            request.body,
            Some(json!({
                "to": ["a@example.com"],
                "subject": "Hello",
                "body_text": "hi",
                "send_via": "enbox",
                "read_receipt_requested": false,
            }))
        );
    }

    #[tokio::test]
    async fn send_email_without_endpoint_is_config_missing() {
        let transport = MockTransport::new();
        let client = EnboxClient::new(
            EndpointConfig::new(BASE, WireMode::Path),
            CredentialProvider::from_values(Some("key-1"), Some("token-1")),
            Arc::new(transport.clone()),
        );

        let result = client.send_email(&email_form()).await;
        assert_eq!(
            result,
            ApiResult::Failure {
                kind: FailureKind::ConfigMissing,
                message: "email.send_url is not configured".into(),
            }
        );
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn endpoint_config_honours_header_override() {
        let endpoints = EndpointConfig::from_config(
            &EnboxApiConfig {
                base_url: BASE.into(),
                wire_mode: WireMode::Action,
                api_key_header: Some("x-custom-key".into()),
                request_timeout_secs: None,
            },
            &EmailApiConfig { send_url: None },
        );
        assert_eq!(endpoints.api_key_header, "x-custom-key");
        assert_eq!(endpoints.send_email_url, None);

        let defaults = EndpointConfig::new(BASE, WireMode::Action);
        assert_eq!(defaults.api_key_header, "X-MSP-API-Key");
    }
}
