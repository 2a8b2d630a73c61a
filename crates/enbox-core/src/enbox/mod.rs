pub mod builder;
pub mod client;
pub mod error;
pub mod mock;
pub mod normalize;
pub mod transport;
pub mod types;
pub mod wire;

pub use builder::{build_activation_toggle, build_create, build_send_email, parse_recipients};
pub use client::{EnboxClient, EndpointConfig};
pub use error::{EnboxError, ValidationError, ValidationErrors};
pub use mock::MockTransport;
pub use normalize::{normalize, normalize_list};
pub use transport::{
    HttpMethod, HttpTransport, OutboundRequest, RawResponse, ReqwestTransport, TransportError,
};
pub use types::*;
