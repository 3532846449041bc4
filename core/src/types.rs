//! Records attached to a completed exchange.
//!
//! # Design
//! `RequestRecord` is created when a request is built and frozen once the
//! transport returns; after that it only lives inside the `Response` it
//! belongs to. `LogRecord` is the flattened view handed to whatever logging
//! sink the caller uses. The core only produces it.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::TransportError;
use crate::format::Format;
use crate::headers::Headers;
use crate::http::{HttpMethod, TransportInfo, TransportOptions};
use crate::params::Parameters;

/// Audit record of one outgoing request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    id: String,
    url: String,
    method: HttpMethod,
    headers: Headers,
    parameters: Parameters,
    idempotency_key: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(rename = "execution_duration_ms", serialize_with = "as_millis")]
    execution_duration: Duration,
    options: TransportOptions,
}

impl RequestRecord {
    pub(crate) fn new(
        id: String,
        url: String,
        method: HttpMethod,
        headers: Headers,
        parameters: Parameters,
        idempotency_key: Option<String>,
        options: TransportOptions,
    ) -> Self {
        Self {
            id,
            url,
            method,
            headers,
            parameters,
            idempotency_key,
            created_at: Utc::now(),
            execution_duration: Duration::ZERO,
            options,
        }
    }

    /// Freeze the record with the measured transport time.
    pub(crate) fn finish(mut self, elapsed: Duration) -> Self {
        self.execution_duration = elapsed;
        self
    }

    /// Correlation id, also used as the idempotency key when one is sent.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Final URL, including base URL and query string.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Headers as sent.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn execution_duration(&self) -> Duration {
        self.execution_duration
    }

    pub fn execution_duration_ms(&self) -> u64 {
        u64::try_from(self.execution_duration.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
}

/// Every request and response field of one exchange, flattened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub request_id: Option<String>,
    pub request_url: Option<String>,
    pub request_method: Option<HttpMethod>,
    pub request_idempotency_key: Option<String>,
    pub request_headers: Option<Headers>,
    pub request_params: Option<Parameters>,
    pub request_options: Option<TransportOptions>,
    pub request_datetime: Option<DateTime<Utc>>,
    pub request_execution_time_ms: Option<u64>,
    pub request_additional_info: Option<TransportInfo>,
    pub response_code: u16,
    pub response_status_text: Option<String>,
    pub response_error: Option<TransportError>,
    pub response_format: Option<Format>,
    pub response_headers: Headers,
    pub response_body: String,
}
