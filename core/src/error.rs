//! Error types for the Gym Group API client.
//!
//! # Design
//! `Forbidden` gets a dedicated variant because a 403 is the only status the
//! client reacts to: it means the session cookie has expired and triggers a
//! single re-login. All other non-2xx responses land in `HttpError` with the
//! raw status code and body for debugging. Failures below HTTP are grouped
//! in `TransportError`.

use thiserror::Error;

use crate::http::HttpMethod;

/// Failures raised before an HTTP status is available.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("transport error: {0}")]
    Other(String),
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
            ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
                TransportError::Connection(err.to_string())
            }
            _ => TransportError::Other(err.to_string()),
        }
    }
}

/// Errors returned by `GymClient` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request helper only speaks GET and POST.
    #[error("unsupported HTTP method {0}")]
    UnsupportedMethod(HttpMethod),

    #[error("username or password not specified")]
    MissingCredentials,

    /// No user identifier is known; a successful login is required first.
    #[error("not logged in")]
    NotLoggedIn,

    #[error("no home gym known for this account")]
    NoHomeGym,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server returned 403: the session is missing or expired.
    #[error("HTTP 403: {body}")]
    Forbidden { body: String },

    /// The server returned a non-2xx status other than 403.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not JSON or lacked an expected field.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    #[error("state file error: {0}")]
    StateFile(String),
}
