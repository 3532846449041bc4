//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe an outgoing request and a transport's answer as
//! plain data. The core builds `HttpRequest` values and parses the raw bytes
//! of a `TransportReply` without ever touching the network; the transport
//! collaborator (a `Transport` impl, or the host on the other side of the
//! C ABI) performs the actual I/O, follows redirects, applies timeouts and
//! TLS settings from `TransportOptions`.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross FFI
//! boundaries without lifetime concerns.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }

    /// GET and HEAD carry their parameters in the query string.
    pub fn sends_body(&self) -> bool {
        !matches!(self, HttpMethod::Get | HttpMethod::Head)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            other => Err(format!("unsupported method: {other}")),
        }
    }
}

/// Client certificate handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCert {
    pub cert_path: String,
    #[serde(default)]
    pub key_path: Option<String>,
}

/// Settings the core passes through to the transport untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
    /// Time allowed to establish the connection.
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
    /// Time allowed for the whole exchange; `None` leaves it to the transport.
    #[serde(with = "opt_duration_secs")]
    pub timeout: Option<Duration>,
    pub verify_tls: bool,
    pub client_cert: Option<ClientCert>,
    /// `user:password` credentials for transport-level authentication.
    #[serde(skip_serializing)]
    pub credentials: Option<(String, String)>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: None,
            verify_tls: false,
            client_cert: None,
            credentials: None,
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `RestClient::build_request`. The transport is responsible for
/// executing this request and returning the raw response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub options: TransportOptions,
}

impl HttpRequest {
    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Metadata the transport reports next to the raw bytes.
///
/// Every field is optional; transports fill in what they know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransportInfo {
    /// Final status code as seen by the transport.
    pub status_code: Option<u16>,
    pub effective_url: Option<String>,
    pub primary_ip: Option<String>,
    pub primary_port: Option<u16>,
    pub http_version: Option<String>,
    pub redirect_count: u32,
    pub total_time_ms: Option<u64>,
    pub size_download: Option<u64>,
}

/// What a successful transport call hands back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportReply {
    /// Status line(s), headers, blank line and body exactly as received.
    pub raw: Vec<u8>,
    pub info: TransportInfo,
}

/// The external collaborator that performs the network exchange.
pub trait Transport {
    fn send(&self, request: &HttpRequest) -> Result<TransportReply, TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<TransportReply, TransportError>,
{
    fn send(&self, request: &HttpRequest) -> Result<TransportReply, TransportError> {
        self(request)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod opt_duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}
