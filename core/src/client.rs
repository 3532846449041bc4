//! Request builder, exchange driver and response history.
//!
//! # Design
//! `RestClient` keeps building and parsing apart. `build_request` turns
//! parameters into an `HttpRequest` without touching the network. The
//! caller (or `execute`, through a `Transport`) performs the round-trip,
//! and `finish` turns the transport outcome into a `Response`. The only
//! mutable state is the append-only response history, so `finish` and
//! `execute` take `&mut self`.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::ClientConfig;
use crate::encode::{encode_body, encode_url, EncodeOptions};
use crate::error::{ClientError, DecodeError, TransportError};
use crate::format::Format;
use crate::headers::{HeaderValue, Headers};
use crate::http::{HttpMethod, HttpRequest, Transport, TransportInfo, TransportReply};
use crate::id::generate_id;
use crate::params::Parameters;
use crate::response::{parse_response_bytes, ParsedResponse};
use crate::types::{LogRecord, RequestRecord};

/// A request ready for the transport, plus the record that will follow it
/// into the response.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub record: RequestRecord,
    pub request: HttpRequest,
}

/// Outcome of one exchange: the parsed response, or the transport failure,
/// together with the request that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    request: RequestRecord,
    parsed: ParsedResponse,
    info: Option<TransportInfo>,
    error: Option<TransportError>,
}

impl Response {
    pub fn request(&self) -> &RequestRecord {
        &self.request
    }

    pub fn parsed(&self) -> &ParsedResponse {
        &self.parsed
    }

    /// Transport metadata; `None` when the transport failed.
    pub fn info(&self) -> Option<&TransportInfo> {
        self.info.as_ref()
    }

    /// Transport failure, if the exchange never produced a response.
    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// Status from the final status line, falling back to what the
    /// transport reported.
    pub fn status_code(&self) -> Option<u16> {
        self.parsed
            .status_code()
            .or_else(|| self.info.as_ref().and_then(|info| info.status_code))
    }

    /// Status code, or 0 when there is none (e.g. transport failure).
    pub fn code(&self) -> u16 {
        self.status_code().unwrap_or(0)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.parsed.status_text()
    }

    pub fn http_version(&self) -> Option<&str> {
        self.parsed.http_version()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.parsed.content_type()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.code())
    }

    pub fn headers(&self) -> &Headers {
        self.parsed.headers()
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.parsed.header(name)
    }

    pub fn header_line(&self, name: &str) -> Option<String> {
        self.parsed.header_line(name)
    }

    pub fn body(&self) -> &str {
        self.parsed.body()
    }

    /// Alias of [`body`](Self::body).
    pub fn data(&self) -> &str {
        self.parsed.data()
    }

    pub fn body_bytes(&self) -> &[u8] {
        self.parsed.body_bytes()
    }

    pub fn body_is_utf8(&self) -> bool {
        self.parsed.body_is_utf8()
    }

    pub fn format(&self) -> Option<&Format> {
        self.parsed.format()
    }

    pub fn decode(&self) -> Result<Value, DecodeError> {
        self.parsed.decode()
    }

    pub fn decode_with<T, F>(&self, decoder: F) -> T
    where
        F: FnOnce(&str) -> T,
    {
        self.parsed.decode_with(decoder)
    }

    /// Turn a transport failure or a 4xx/5xx status into an error.
    pub fn error_for_status(&self) -> Result<&Self, ClientError> {
        if let Some(err) = &self.error {
            return Err(err.clone().into());
        }
        let status = self.code();
        if (400..600).contains(&status) {
            return Err(ClientError::Http {
                status,
                body: self.body().to_string(),
            });
        }
        Ok(self)
    }

    /// Flattened record of the whole exchange for a logging sink.
    pub fn log_record(&self) -> LogRecord {
        let request = &self.request;
        LogRecord {
            request_id: Some(request.id().to_string()),
            request_url: Some(request.url().to_string()),
            request_method: Some(request.method()),
            request_idempotency_key: request.idempotency_key().map(str::to_string),
            request_headers: Some(redacted(request.headers())),
            request_params: Some(request.parameters().clone()),
            request_options: Some(request.options().clone()),
            request_datetime: Some(request.created_at()),
            request_execution_time_ms: Some(request.execution_duration_ms()),
            request_additional_info: self.info.clone(),
            response_code: self.code(),
            response_status_text: self.status_text().map(str::to_string),
            response_error: self.error.clone(),
            response_format: self.format().cloned(),
            response_headers: self.headers().clone(),
            response_body: self.body().to_string(),
        }
    }
}

const REDACTED_HEADERS: [&str; 2] = ["authorization", "proxy-authorization"];

/// Copy of `headers` with credential values masked for logging.
fn redacted(headers: &Headers) -> Headers {
    let mut headers = headers.clone();
    for name in REDACTED_HEADERS {
        if headers.contains(name) {
            headers.insert(name, "[REDACTED]");
        }
    }
    headers
}

/// HTTP client that encodes requests, parses responses and keeps history.
#[derive(Debug, Clone, Default)]
pub struct RestClient {
    config: ClientConfig,
    history: Vec<Response>,
}

impl RestClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        Ok(Self {
            config,
            history: Vec::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Assemble an `HttpRequest` without performing I/O.
    ///
    /// GET and HEAD append the URL-encoded parameters to the query string;
    /// every other method sends them as a body in the configured request
    /// format. Per-call `headers` override default headers of the same
    /// name.
    pub fn build_request(
        &self,
        method: HttpMethod,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<PreparedRequest, ClientError> {
        let parameters = parameters.into();
        let options = EncodeOptions {
            keep_indexed_queries: self.config.build_indexed_queries,
        };

        let mut url = self.compose_url(url);
        let mut content_type = None;
        let body = if method.sends_body() {
            let encoded = encode_body(&parameters, self.config.request_format.as_ref(), options)?;
            content_type = encoded.content_type;
            Some(encoded.body).filter(|body| !body.is_empty())
        } else {
            let query = encode_url(&parameters, options);
            if !query.is_empty() {
                url.push(if url.contains('?') { '&' } else { '?' });
                url.push_str(&query);
            }
            None
        };

        let mut sent: Vec<(String, String)> = self
            .config
            .default_headers
            .iter()
            .filter(|(name, _)| !headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name)))
            .cloned()
            .collect();
        sent.extend(headers.iter().map(|(n, v)| (n.to_string(), v.to_string())));
        if let Some(content_type) = content_type {
            add_missing(&mut sent, "Content-Type", content_type);
        }
        if let Some(user_agent) = &self.config.user_agent {
            add_missing(&mut sent, "User-Agent", user_agent);
        }

        let id = generate_id();
        let idempotency_key = self.config.idempotency_header.as_deref().map(|header| {
            match find_header(&sent, header) {
                Some(existing) => existing.to_string(),
                None => {
                    sent.push((header.to_string(), id.clone()));
                    id.clone()
                }
            }
        });

        let mut recorded = Headers::new();
        for (name, value) in &sent {
            recorded.append(name, value.as_str());
        }

        tracing::debug!(id = %id, method = %method, url = %url, "built request");

        let record = RequestRecord::new(
            id,
            url.clone(),
            method,
            recorded,
            parameters,
            idempotency_key,
            self.config.transport.clone(),
        );
        let request = HttpRequest {
            method,
            url,
            headers: sent,
            body,
            options: self.config.transport.clone(),
        };
        Ok(PreparedRequest { record, request })
    }

    /// Record the transport outcome of a prepared request.
    ///
    /// A transport failure still produces a `Response`, with no status and
    /// the error attached.
    pub fn finish(
        &mut self,
        prepared: PreparedRequest,
        elapsed: Duration,
        outcome: Result<TransportReply, TransportError>,
    ) -> &Response {
        let request = prepared.record.finish(elapsed);
        let declared = self.config.response_format.clone();
        let response = match outcome {
            Ok(reply) => Response {
                parsed: parse_response_bytes(&reply.raw).with_declared_format(declared),
                info: Some(reply.info),
                error: None,
                request,
            },
            Err(error) => {
                tracing::warn!(
                    id = %request.id(),
                    code = error.code,
                    message = %error.message,
                    "transport failed"
                );
                Response {
                    parsed: ParsedResponse::default().with_declared_format(declared),
                    info: None,
                    error: Some(error),
                    request,
                }
            }
        };
        tracing::debug!(
            id = %response.request.id(),
            status = response.code(),
            elapsed_ms = response.request.execution_duration_ms(),
            "exchange complete"
        );

        let index = self.history.len();
        self.history.push(response);
        &self.history[index]
    }

    /// Build, send through `transport`, and record a request.
    pub fn execute<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        method: HttpMethod,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        let prepared = self.build_request(method, url, parameters, headers)?;
        let started = Instant::now();
        let outcome = transport.send(&prepared.request);
        let elapsed = started.elapsed();
        Ok(self.finish(prepared, elapsed, outcome))
    }

    pub fn get<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Get, url, parameters, headers)
    }

    pub fn post<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Post, url, parameters, headers)
    }

    pub fn put<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Put, url, parameters, headers)
    }

    pub fn patch<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Patch, url, parameters, headers)
    }

    pub fn delete<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Delete, url, parameters, headers)
    }

    pub fn head<T: Transport + ?Sized>(
        &mut self,
        transport: &T,
        url: &str,
        parameters: impl Into<Parameters>,
        headers: &[(&str, &str)],
    ) -> Result<&Response, ClientError> {
        self.execute(transport, HttpMethod::Head, url, parameters, headers)
    }

    /// Most recent response.
    pub fn last_response(&self) -> Option<&Response> {
        self.history.last()
    }

    /// Alias of [`last_response`](Self::last_response).
    pub fn response(&self) -> Option<&Response> {
        self.last_response()
    }

    /// Every response received, oldest first.
    pub fn history(&self) -> &[Response] {
        &self.history
    }

    fn compose_url(&self, url: &str) -> String {
        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            None => url.to_string(),
        }
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn add_missing(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    if find_header(headers, name).is_none() {
        headers.push((name.to_string(), value.to_string()));
    }
}
