use serde::Deserialize;
use thiserror::Error;

use crate::http::HttpResponse;

/// Message payload of the fatal error variants.
#[derive(Debug, Clone)]
pub struct StandardError {
    /// Human readable description of what went wrong.
    pub message: String,
}

/// The OAuth 2.0 protocol error shape returned by authorization servers
/// ([RFC 6749 section 5.2](https://datatracker.ietf.org/doc/html/rfc6749#section-5.2)).
#[derive(Debug, Clone, Deserialize)]
pub struct OauthBodyError {
    /// Error code, e.g. `invalid_grant`.
    pub error: String,
    /// Optional description of the error.
    #[serde(default)]
    pub error_description: Option<String>,
    /// Optional URI with more information about the error.
    #[serde(default)]
    pub error_uri: Option<String>,
}

/// Every failure surfaced by this crate.
///
/// `TypeError` is an argument precondition violation, `ProtocolError` a
/// well-formed input that produced an unacceptable response or JWT,
/// `UnsupportedOperation` a branch this crate refuses to take, and
/// `OpError` the OAuth protocol error value the server itself returned.
#[derive(Debug, Error)]
pub enum OauthClientError {
    /// Precondition violation: wrong runtime type, empty required string,
    /// unsupported enum value, inconsistent client metadata.
    #[error("TypeError: {}", .0.message)]
    TypeError(StandardError, Option<HttpResponse>),
    /// A response or JWT failed validation: wrong status, schema mismatch,
    /// bad signature, issuer mismatch, claim out of window.
    #[error("ProtocolError: {}", .0.message)]
    ProtocolError(StandardError, Option<HttpResponse>),
    /// A branch that intentionally refuses to proceed: unknown algorithm,
    /// modulus too small, JWE-as-JWT token, hybrid/implicit callback.
    #[error("UnsupportedOperation: {}", .0.message)]
    UnsupportedOperation(StandardError, Option<HttpResponse>),
    /// The `{error, error_description?, error_uri?}` value the server
    /// returned. Detect with [`OauthClientError::is_oauth2_error`].
    #[error("OPError: {}", .0.error)]
    OpError(OauthBodyError, Option<HttpResponse>),
}

/// Return type used throughout this crate.
pub type OauthReturnType<T> = Result<T, Box<OauthClientError>>;

impl OauthClientError {
    pub(crate) fn new_type_error(message: &str, response: Option<HttpResponse>) -> Self {
        Self::TypeError(
            StandardError {
                message: message.to_string(),
            },
            response,
        )
    }

    pub(crate) fn new_protocol_error(message: &str, response: Option<HttpResponse>) -> Self {
        Self::ProtocolError(
            StandardError {
                message: message.to_string(),
            },
            response,
        )
    }

    pub(crate) fn new_unsupported_operation(message: &str, response: Option<HttpResponse>) -> Self {
        Self::UnsupportedOperation(
            StandardError {
                message: message.to_string(),
            },
            response,
        )
    }

    pub(crate) fn new_op_error(
        error: String,
        error_description: Option<String>,
        error_uri: Option<String>,
        response: Option<HttpResponse>,
    ) -> Self {
        Self::OpError(
            OauthBodyError {
                error,
                error_description,
                error_uri,
            },
            response,
        )
    }

    /// Whether this is an OAuth protocol error returned by the server
    /// rather than a failure raised by this crate.
    pub fn is_oauth2_error(&self) -> bool {
        matches!(self, Self::OpError(..))
    }

    /// The server-returned OAuth error body, when [`Self::is_oauth2_error`].
    pub fn oauth2_error(&self) -> Option<&OauthBodyError> {
        match self {
            Self::OpError(body, _) => Some(body),
            _ => None,
        }
    }

    /// The response that triggered this error, when one was involved.
    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Self::TypeError(_, r)
            | Self::ProtocolError(_, r)
            | Self::UnsupportedOperation(_, r)
            | Self::OpError(_, r) => r.as_ref(),
        }
    }
}
