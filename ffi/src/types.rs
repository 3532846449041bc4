//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! enums with explicit discriminants. Conversion functions live here to keep
//! `lib.rs` focused on the `extern "C"` surface.

use std::ffi::CString;
use std::os::raw::c_char;

use restclient_core::{
    DecodeError, EncodeError, EncodedBody, HttpMethod, ParsedResponse, PreparedRequest,
};

/// Opaque handle to a `RestClient`. C callers receive a pointer to this
/// and pass it back into every client function.
pub struct FfiRestClient {
    pub(crate) inner: restclient_core::RestClient,
}

/// Copy `s` into a heap C string. Interior NUL bytes are dropped.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    let cstring = CString::new(s).unwrap_or_else(|err| {
        let mut bytes = err.into_vec();
        bytes.retain(|b| *b != 0);
        CString::new(bytes).unwrap_or_default()
    });
    cstring.into_raw()
}

pub(crate) fn c_string_opt(s: Option<impl Into<Vec<u8>>>) -> *mut c_char {
    match s {
        Some(s) => c_string(s),
        None => std::ptr::null_mut(),
    }
}

/// Release a string created by [`c_string`]. Null is ignored.
pub(crate) fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Copy `bytes` onto the heap. Returns null for an empty slice.
pub(crate) fn bytes_into_raw(bytes: &[u8]) -> (*mut u8, usize) {
    if bytes.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = bytes.len();
    (Box::into_raw(Box::<[u8]>::from(bytes)) as *mut u8, len)
}

/// Release a buffer created by [`bytes_into_raw`]. Null is ignored.
pub(crate) fn free_bytes(bytes: *mut u8, len: usize) {
    if bytes.is_null() || len == 0 {
        return;
    }
    drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(bytes, len)) });
}

// ---------------------------------------------------------------------------
// Headers
// ---------------------------------------------------------------------------

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// Move header pairs onto the heap. Returns null for an empty list.
pub(crate) fn headers_into_raw<K, V>(pairs: Vec<(K, V)>) -> (*mut FfiHeader, u32)
where
    K: Into<Vec<u8>>,
    V: Into<Vec<u8>>,
{
    let len = pairs.len() as u32;
    if pairs.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let ffi_headers: Vec<FfiHeader> = pairs
        .into_iter()
        .map(|(k, v)| FfiHeader {
            key: c_string(k),
            value: c_string(v),
        })
        .collect();
    let ptr = Box::into_raw(ffi_headers.into_boxed_slice()) as *mut FfiHeader;
    (ptr, len)
}

pub(crate) fn free_headers(headers: *mut FfiHeader, len: u32) {
    if headers.is_null() || len == 0 {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(headers, len as usize);
    let headers = unsafe { Box::from_raw(slice) };
    for h in headers.iter() {
        free_c_string(h.key);
        free_c_string(h.value);
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Put = 2,
    Patch = 3,
    Delete = 4,
    Head = 5,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Put => FfiHttpMethod::Put,
            HttpMethod::Patch => FfiHttpMethod::Patch,
            HttpMethod::Delete => FfiHttpMethod::Delete,
            HttpMethod::Head => FfiHttpMethod::Head,
        }
    }
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `rc_build_request`. The C caller executes the request and hands
/// the raw response bytes to `rc_parse_response`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub url: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Null when the request carries no body.
    pub body: *mut c_char,
    pub request_id: *mut c_char,
    /// Null unless the client sends an idempotency header.
    pub idempotency_key: *mut c_char,
    pub connect_timeout_ms: u64,
    /// 0 leaves the overall timeout to the transport.
    pub timeout_ms: u64,
    pub verify_tls: bool,
}

impl FfiHttpRequest {
    /// Convert a prepared core request into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(prepared: PreparedRequest) -> *mut Self {
        let PreparedRequest { record, request } = prepared;
        let (headers, headers_len) = headers_into_raw(request.headers);
        let millis = |d: std::time::Duration| u64::try_from(d.as_millis()).unwrap_or(u64::MAX);

        let ffi_req = Box::new(FfiHttpRequest {
            method: request.method.into(),
            url: c_string(request.url),
            headers,
            headers_len,
            body: c_string_opt(request.body),
            request_id: c_string(record.id()),
            idempotency_key: c_string_opt(record.idempotency_key()),
            connect_timeout_ms: millis(request.options.connect_timeout),
            timeout_ms: request.options.timeout.map(millis).unwrap_or(0),
            verify_tls: request.options.verify_tls,
        });
        Box::into_raw(ffi_req)
    }
}

// ---------------------------------------------------------------------------
// Parsed response
// ---------------------------------------------------------------------------

/// A parsed HTTP response exposed to C.
///
/// Repeated headers appear as repeated entries, in arrival order.
#[repr(C)]
pub struct FfiParsedResponse {
    /// 0 when no status line parsed.
    pub status_code: u16,
    pub status_text: *mut c_char,
    pub http_version: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    /// Body as text; invalid UTF-8 is replaced and NUL bytes are dropped.
    pub body: *mut c_char,
    /// Body exactly as received; null when empty.
    pub body_bytes: *mut u8,
    pub body_len: usize,
    /// False when `body` differs from `body_bytes` because of invalid UTF-8.
    pub body_is_utf8: bool,
    /// Declared or detected format name; null when unknown.
    pub format: *mut c_char,
}

impl FfiParsedResponse {
    pub(crate) fn from_core(parsed: &ParsedResponse) -> *mut Self {
        let (headers, headers_len) = headers_into_raw(parsed.headers().pairs());
        let (body_bytes, body_len) = bytes_into_raw(parsed.body_bytes());
        let result = Box::new(FfiParsedResponse {
            status_code: parsed.code(),
            status_text: c_string_opt(parsed.status_text()),
            http_version: c_string_opt(parsed.http_version()),
            headers,
            headers_len,
            body: c_string(parsed.body()),
            body_bytes,
            body_len,
            body_is_utf8: parsed.body_is_utf8(),
            format: c_string_opt(parsed.format().map(|f| f.as_str())),
        });
        Box::into_raw(result)
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in result envelopes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    NullArg = 1,
    InvalidUtf8 = 2,
    InvalidJson = 3,
    Encode = 4,
    Decode = 5,
    Panic = 6,
}

impl From<&EncodeError> for FfiErrorCode {
    fn from(err: &EncodeError) -> Self {
        match err {
            EncodeError::InvalidParameters(_) => FfiErrorCode::InvalidJson,
            _ => FfiErrorCode::Encode,
        }
    }
}

/// Result envelope for `rc_encode_body`.
///
/// On success `error_code` is `Ok`, `error_message` is null, `body` holds
/// the encoded text and `content_type` the header value to send (null when
/// the format has none). On failure only `error_code` and `error_message`
/// are set.
#[repr(C)]
pub struct FfiEncodeResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub body: *mut c_char,
    pub content_type: *mut c_char,
}

impl FfiEncodeResult {
    pub(crate) fn ok(encoded: EncodedBody) -> *mut Self {
        Box::into_raw(Box::new(FfiEncodeResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            body: c_string(encoded.body),
            content_type: c_string_opt(encoded.content_type),
        }))
    }

    pub(crate) fn error(error_code: FfiErrorCode, msg: impl Into<Vec<u8>>) -> *mut Self {
        Box::into_raw(Box::new(FfiEncodeResult {
            error_code,
            error_message: c_string(msg),
            body: std::ptr::null_mut(),
            content_type: std::ptr::null_mut(),
        }))
    }
}

/// Result envelope for `rc_decode`. `json` holds the decoded value as JSON
/// text.
#[repr(C)]
pub struct FfiDecodeResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub json: *mut c_char,
}

impl FfiDecodeResult {
    pub(crate) fn ok(json: String) -> *mut Self {
        Box::into_raw(Box::new(FfiDecodeResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            json: c_string(json),
        }))
    }

    pub(crate) fn from_error(err: DecodeError) -> *mut Self {
        Self::error(FfiErrorCode::Decode, err.to_string())
    }

    pub(crate) fn error(error_code: FfiErrorCode, msg: impl Into<Vec<u8>>) -> *mut Self {
        Box::into_raw(Box::new(FfiDecodeResult {
            error_code,
            error_message: c_string(msg),
            json: std::ptr::null_mut(),
        }))
    }
}
