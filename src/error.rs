//! Contains the error envelope returned for every failure in this library.
//!
//! Every module keeps its own `snafu` error type. Those errors only leave the crate through
//! [`create_error`], which wraps them in an [`Error`] that keeps the original failure as its cause
//! and, for failures reported by the AWS service, the structured HTTP and error-code detail.

use aws_sdk_marketplacemetering::config::http::HttpResponse;
use aws_sdk_marketplacemetering::error::{ProvideErrorMetadata, SdkError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured detail of a failure reported by the AWS service. All fields are absent for
/// failures that did not come from the service (transport, configuration, conversion).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ErrorDetails {
    /// True when no structured field is populated.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Extracts the service detail from an SDK failure. Only service errors carry detail; a
    /// dispatch or timeout failure yields `None`.
    pub(crate) fn from_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> Option<Self>
    where
        E: ProvideErrorMetadata,
    {
        let service_error = err.as_service_error()?;
        let http_status_code = err.raw_response().map(|raw| raw.status().as_u16());
        let http_status_text = http_status_code
            .and_then(|code| http::StatusCode::from_u16(code).ok())
            .and_then(|status| status.canonical_reason())
            .map(str::to_string);
        Some(Self {
            http_status_code,
            http_status_text,
            error_code: service_error.code().map(str::to_string),
            error_message: service_error.message().map(str::to_string),
        })
    }
}

/// Implemented by every failure that may become the cause of an [`Error`]. The default
/// implementation reports no service detail.
pub trait ProvideErrorDetails: std::error::Error + Send + Sync + 'static {
    fn error_details(&self) -> ErrorDetails {
        ErrorDetails::default()
    }
}

impl<E> ProvideErrorDetails for SdkError<E, HttpResponse>
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    fn error_details(&self) -> ErrorDetails {
        ErrorDetails::from_sdk_error(self).unwrap_or_default()
    }
}

impl ProvideErrorDetails for serde_json::Error {}

impl ProvideErrorDetails for tokio::task::JoinError {}

impl ProvideErrorDetails for std::io::Error {}

/// The error envelope of this library: a message, the original failure, and the service detail
/// when there is any.
#[derive(Debug)]
pub struct Error {
    message: String,
    details: ErrorDetails,
    cause: Box<dyn std::error::Error + Send + Sync + 'static>,
}

/// Wraps `cause` in an [`Error`]. This is the only place an [`Error`] is constructed.
pub fn create_error<E>(message: impl Into<String>, cause: E) -> Error
where
    E: ProvideErrorDetails,
{
    let details = cause.error_details();
    Error {
        message: message.into(),
        details,
        cause: Box::new(cause),
    }
}

impl Error {
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &ErrorDetails {
        &self.details
    }

    /// The failure this error was created from.
    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Renders the envelope as a host value: `{message, cause, details}`.
    pub fn to_value(&self) -> Value {
        json!({
            "message": self.message,
            "cause": self.cause.to_string(),
            "details": self.details,
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.cause.as_ref())
    }
}

// a wrapped envelope keeps the detail of the one it wraps
impl ProvideErrorDetails for Error {
    fn error_details(&self) -> ErrorDetails {
        self.details.clone()
    }
}
