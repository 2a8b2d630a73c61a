pub mod config;
pub mod credentials;
pub mod enbox;
pub mod telemetry;

pub use config::Config;
pub use credentials::{CredentialError, CredentialProvider, Credentials};
pub use enbox::{
    ApiResult, CreateEnboxForm, EnboxClient, EnboxList, EndpointConfig, FailureKind,
    ReqwestTransport, SendEmailForm, WireMode,
};
pub use telemetry::{TelemetryError, TelemetryGuard, init_logging, init_telemetry};
