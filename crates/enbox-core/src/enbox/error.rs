use std::fmt;

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::enbox::transport::TransportError;
use crate::enbox::types::{ApiResult, FailureKind, WireMode};

/// A single rejected form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidEmail,
    EmptyDisplayName,
    MissingPassword,
    PasswordTooShort,
    PasswordMismatch,
    NoRecipients,
    EmptySubject,
    MissingTextBody,
    MissingHtmlBody,
    MissingBody,
    EmptyEnboxEmail,
}

impl ValidationError {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::InvalidEmail | Self::EmptyEnboxEmail => "email",
            Self::EmptyDisplayName => "display_name",
            Self::MissingPassword | Self::PasswordTooShort => "password",
            Self::PasswordMismatch => "password_confirmation",
            Self::NoRecipients => "to",
            Self::EmptySubject => "subject",
            Self::MissingTextBody => "body_text",
            Self::MissingHtmlBody => "body_html",
            Self::MissingBody => "body",
        }
    }

    pub const fn message(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "must contain '@'",
            Self::EmptyDisplayName => "is required",
            Self::MissingPassword => "is required for direct creation",
            Self::PasswordTooShort => "must be at least 8 characters",
            Self::PasswordMismatch => "does not match password",
            Self::NoRecipients => "needs at least one recipient",
            Self::EmptySubject => "is required",
            Self::MissingTextBody => "is required for text format",
            Self::MissingHtmlBody => "is required for html format",
            Self::MissingBody => "needs a text or html body",
            Self::EmptyEnboxEmail => "is required",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field(), self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Every failing field of one form, in check order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn contains(&self, error: ValidationError) -> bool {
        self.0.contains(&error)
    }

    /// Turns the collected list into a result; empty means valid.
    pub(crate) fn check(errors: Vec<ValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self(errors))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

#[derive(Debug, Error)]
pub enum EnboxError {
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("{setting} is not configured")]
    MissingEndpoint { setting: &'static str },
    #[error("{operation} is not available in {mode} wire mode; use action mode")]
    UnsupportedOperation {
        operation: &'static str,
        mode: WireMode,
    },
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("{status}: {body}")]
    Api { status: u16, body: String },
}

impl EnboxError {
    pub fn kind(&self) -> FailureKind {
        match self {
            EnboxError::Credentials(_)
            | EnboxError::MissingEndpoint { .. }
            | EnboxError::UnsupportedOperation { .. } => FailureKind::ConfigMissing,
            EnboxError::Validation(_) => FailureKind::Validation,
            EnboxError::Transport(_) => FailureKind::Transport,
            EnboxError::Api { .. } => FailureKind::ApiError,
        }
    }
}

impl<T> From<EnboxError> for ApiResult<T> {
    fn from(error: EnboxError) -> Self {
        ApiResult::Failure {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
