//! Synchronous REST client core.
//!
//! # Overview
//! Encodes request parameters as JSON, XML or URL-encoded form data, builds
//! `HttpRequest` values and parses raw HTTP responses without touching the
//! network (host-does-IO pattern). The caller, or a `Transport` impl,
//! executes the actual HTTP round-trip, so the core stays deterministic and
//! testable.
//!
//! # Design
//! - Every codec is a free function over `serde_json::Value` trees:
//!   `encode_body` / `encode_url` on the way out, `decode` on the way in.
//! - `parse_response` splits raw transport output into status, headers and
//!   body. Malformed input degrades softly rather than failing.
//! - `RestClient` ties the pieces together and keeps an append-only history
//!   of `Response` values, each carrying the `RequestRecord` that produced it.
//! - Types use owned `String` / `Vec` fields so they map cleanly to the FFI
//!   crate.

pub mod client;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod format;
pub mod headers;
pub mod http;
pub mod id;
pub mod params;
pub mod query;
pub mod response;
pub mod types;
pub mod xml;

pub use client::{PreparedRequest, Response, RestClient};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use decode::{decode, decode_with};
pub use encode::{encode_body, encode_url, EncodeOptions, EncodedBody};
pub use error::{ClientError, DecodeError, EncodeError, TransportError};
pub use format::{detect_format, Format};
pub use headers::{HeaderValue, Headers};
pub use http::{
    ClientCert, HttpMethod, HttpRequest, Transport, TransportInfo, TransportOptions,
    TransportReply,
};
pub use id::generate_id;
pub use params::{ParameterSet, Parameters};
pub use response::{parse_response, parse_response_bytes, ParsedResponse};
pub use types::{LogRecord, RequestRecord};
