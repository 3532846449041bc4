//! Raw HTTP response parsing.
//!
//! # Design
//! The input is what the transport read off the wire: one or more status
//! lines, a header block, a blank line, then the body. Parsing never fails.
//! A malformed status line leaves the status absent, a header line without
//! a colon is where the body starts, and everything after the separator is
//! the body byte-for-byte.
//!
//! When the transport returns every redirect hop concatenated, each
//! informational (1xx) or redirect (3xx) hop ends with a blank line followed
//! by the next status line. Only the last hop's status and headers are kept;
//! all status lines stay available through `status_lines()`. After any other
//! status, the text following the blank line is body, even when it happens
//! to start with `HTTP/`.
//!
//! The header block is parsed from bytes and the body is kept exactly as
//! received. A body that is not valid UTF-8 is also offered as lossy text
//! through `body()`, with the original bytes in `body_bytes()`.

use serde_json::Value;

use crate::decode::{decode, decode_with};
use crate::error::DecodeError;
use crate::format::{detect_format, Format};
use crate::headers::{HeaderValue, Headers};

/// Status, headers and body of one HTTP response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    status_code: Option<u16>,
    status_text: Option<String>,
    http_version: Option<String>,
    status_lines: Vec<String>,
    headers: Headers,
    body: String,
    /// Received bytes, kept only when they are not valid UTF-8.
    raw_body: Option<Vec<u8>>,
    declared_format: Option<Format>,
    detected_format: Option<Format>,
}

impl ParsedResponse {
    /// Set the format the caller expects, overriding detection.
    pub fn with_declared_format(mut self, format: Option<Format>) -> Self {
        self.declared_format = format;
        self
    }

    /// Status code of the final status line, if it parsed.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Status code, or 0 when there is none.
    pub fn code(&self) -> u16 {
        self.status_code.unwrap_or(0)
    }

    pub fn status_text(&self) -> Option<&str> {
        self.status_text.as_deref()
    }

    /// Protocol of the final status line, e.g. `HTTP/1.1`.
    pub fn http_version(&self) -> Option<&str> {
        self.http_version.as_deref()
    }

    /// Every status line seen, in order; more than one on redirect chains.
    pub fn status_lines(&self) -> &[String] {
        &self.status_lines
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    pub fn header_line(&self, name: &str) -> Option<String> {
        self.headers.line(name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.first("content-type")
    }

    /// Body as text. Invalid UTF-8 sequences appear as U+FFFD; see
    /// [`body_is_utf8`](Self::body_is_utf8).
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body exactly as received.
    pub fn body_bytes(&self) -> &[u8] {
        self.raw_body.as_deref().unwrap_or(self.body.as_bytes())
    }

    /// Whether the body was valid UTF-8, i.e. `body()` is exact.
    pub fn body_is_utf8(&self) -> bool {
        self.raw_body.is_none()
    }

    /// Alias of [`body`](Self::body).
    pub fn data(&self) -> &str {
        self.body()
    }

    pub fn declared_format(&self) -> Option<&Format> {
        self.declared_format.as_ref()
    }

    pub fn detected_format(&self) -> Option<&Format> {
        self.detected_format.as_ref()
    }

    /// The format used for decoding: declared wins over detected.
    pub fn format(&self) -> Option<&Format> {
        self.declared_format.as_ref().or(self.detected_format.as_ref())
    }

    /// Decode the body according to [`format`](Self::format).
    pub fn decode(&self) -> Result<Value, DecodeError> {
        decode(&self.body, self.format())
    }

    /// Decode the body with a caller-supplied function, ignoring formats.
    pub fn decode_with<T, F>(&self, decoder: F) -> T
    where
        F: FnOnce(&str) -> T,
    {
        decode_with(&self.body, decoder)
    }
}

/// Parse a raw HTTP response held as text.
pub fn parse_response(raw: &str) -> ParsedResponse {
    parse_response_bytes(raw.as_bytes())
}

/// Parse a raw HTTP response.
pub fn parse_response_bytes(raw: &[u8]) -> ParsedResponse {
    let mut status_lines = Vec::new();
    let mut headers = Headers::new();
    // Set once this hop has produced a status line or a header, so blank
    // lines before the first of them are skipped instead of ending the block.
    let mut captured = false;
    let mut body_start = raw.len();
    let mut offset = 0;

    for chunk in raw.split_inclusive(|b| *b == b'\n') {
        let line_start = offset;
        offset += chunk.len();
        let line = String::from_utf8_lossy(trim_line_end(chunk));

        if line.trim().is_empty() {
            if !captured {
                continue;
            }
            if continues_with_next_hop(&status_lines, &raw[offset..]) {
                headers = Headers::new();
                captured = false;
                continue;
            }
            body_start = offset;
            break;
        }

        if line.starts_with("HTTP") {
            status_lines.push(line.trim().to_string());
            captured = true;
            continue;
        }

        match line.split_once(':') {
            Some((name, value)) => {
                headers.append(name.trim(), value.trim());
                captured = true;
            }
            None => {
                tracing::debug!(line = %line, "header line without colon, treating rest as body");
                body_start = line_start;
                break;
            }
        }
    }

    let (status_code, status_text, http_version) = match status_lines.last() {
        Some(line) => match parse_status_line(line) {
            Some(status) => (Some(status.code), Some(status.reason), Some(status.version)),
            None => {
                tracing::debug!(line = %line, "malformed status line");
                (None, None, None)
            }
        },
        None => (None, None, None),
    };

    let (body, raw_body) = match String::from_utf8(raw[body_start..].to_vec()) {
        Ok(text) => (text, None),
        Err(err) => {
            tracing::debug!(
                valid_up_to = err.utf8_error().valid_up_to(),
                "response body is not valid UTF-8"
            );
            let bytes = err.into_bytes();
            (String::from_utf8_lossy(&bytes).into_owned(), Some(bytes))
        }
    };

    let detected_format = detect_format(&headers);
    ParsedResponse {
        status_code,
        status_text,
        http_version,
        status_lines,
        headers,
        body,
        raw_body,
        declared_format: None,
        detected_format,
    }
}

fn trim_line_end(chunk: &[u8]) -> &[u8] {
    let line = chunk.strip_suffix(b"\n").unwrap_or(chunk);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// A blank line starts another hop only when the hop it closes was
/// informational or a redirect and the next non-blank line is a well-formed
/// status line.
fn continues_with_next_hop(status_lines: &[String], rest: &[u8]) -> bool {
    let closing = status_lines.last().and_then(|line| parse_status_line(line));
    if !matches!(closing.map(|s| s.code), Some(100..=199 | 300..=399)) {
        return false;
    }
    rest.split(|b| *b == b'\n')
        .map(|line| String::from_utf8_lossy(trim_line_end(line)))
        .find(|line| !line.trim().is_empty())
        .is_some_and(|line| parse_status_line(&line).is_some())
}

struct StatusLine {
    version: String,
    code: u16,
    reason: String,
}

/// `HTTP/<version> <3-digit code>[ <reason>]`
fn parse_status_line(line: &str) -> Option<StatusLine> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next()?;
    let number = version.strip_prefix("HTTP/")?;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let code = code.parse().ok()?;
    let reason = parts.next().unwrap_or("").trim().to_string();
    Some(StatusLine {
        version: version.to_string(),
        code,
        reason,
    })
}
