//! Error types for the request encoder, response decoder and client.
//!
//! # Design
//! Encoding and decoding failures are local: they surface at the call that
//! triggered them. A failed network call is not an error here. The transport
//! hands back a `TransportError` value which the client stores inside the
//! `Response`, so callers always get a response object back.
//! `ClientError` only exists for the steps that cannot produce a response at
//! all (bad URL, unencodable parameters) and for `error_for_status`.

use thiserror::Error;

/// Parameters could not be serialized in the requested format.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A mapping key cannot be used as an XML element name.
    #[error("invalid XML element name: {0:?}")]
    InvalidElementName(String),

    /// The XML writer failed.
    #[error("XML serialization failed: {0}")]
    Xml(String),

    /// The JSON serializer failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A JSON value that is neither an object nor a string was offered as
    /// request parameters.
    #[error("parameters must be an object or a string, got {0}")]
    InvalidParameters(&'static str),
}

/// A response body did not conform to its strict format.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed XML body: {0}")]
    Xml(String),
}

/// Failure reported by the transport collaborator.
///
/// Stored on the `Response` rather than returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("transport error {code}: {message}")]
pub struct TransportError {
    pub code: i32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors returned by `RestClient` and `Response`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The exchange never produced an HTTP response.
    #[error("transport error {code}: {message}")]
    Transport { code: i32, message: String },

    /// The server answered with a 4xx or 5xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        ClientError::Transport {
            code: err.code,
            message: err.message,
        }
    }
}

impl ClientError {
    /// Status code carried by an `Http` error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
