//! C-ABI wrapper around `restclient-core`.
//!
//! # Overview
//! Exposes identifier generation, body encoding, response parsing, format
//! decoding and request building through `extern "C"` functions, so any
//! language with a C FFI can drive the core while doing the HTTP I/O itself.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Parameters, configuration and decoded values cross the boundary as JSON
//!   text; headers as arrays of `FfiHeader`.
//! - The C caller owns all returned pointers and must call the matching
//!   `rc_free_*` function to release them.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::catch_unwind;

use restclient_core::{
    decode, encode_body, parse_response_bytes, ClientConfig, EncodeOptions, Format, HttpMethod,
    Parameters, RestClient,
};

use types::*;

/// Borrow a C string. `Ok(None)` for null, `Err` for invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, std::str::Utf8Error> {
    if ptr.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().map(Some)
}

fn parse_format(ptr: *const c_char) -> Result<Option<Format>, std::str::Utf8Error> {
    Ok(unsafe { read_str(ptr) }?.map(Format::from_name))
}

/// Parse JSON parameter text; null means an empty parameter set.
fn parse_parameters(ptr: *const c_char) -> Result<Parameters, (FfiErrorCode, String)> {
    let text = unsafe { read_str(ptr) }.map_err(|e| (FfiErrorCode::InvalidUtf8, e.to_string()))?;
    let Some(text) = text else {
        return Ok(Parameters::default());
    };
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| (FfiErrorCode::InvalidJson, format!("parameters: {e}")))?;
    Parameters::from_json(value).map_err(|e| ((&e).into(), e.to_string()))
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Generate a fresh request identifier (upper-case UUID v4).
///
/// The caller must free the returned string with `rc_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_generate_id() -> *mut c_char {
    catch_unwind(|| c_string(restclient_core::generate_id())).unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Encode JSON `parameters` as a request body in `format`.
///
/// `parameters` is JSON text: an object becomes a parameter set, a string is
/// passed through untouched, null encodes nothing. `format` may be null for
/// the default URL encoding.
/// The caller must free the returned pointer with `rc_free_encode_result`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_encode_body(
    parameters: *const c_char,
    format: *const c_char,
    keep_indexed_queries: bool,
) -> *mut FfiEncodeResult {
    catch_unwind(|| {
        let parameters = match parse_parameters(parameters) {
            Ok(p) => p,
            Err((code, msg)) => return FfiEncodeResult::error(code, msg),
        };
        let format = match parse_format(format) {
            Ok(f) => f,
            Err(e) => return FfiEncodeResult::error(FfiErrorCode::InvalidUtf8, e.to_string()),
        };
        let options = EncodeOptions {
            keep_indexed_queries,
        };
        match encode_body(&parameters, format.as_ref(), options) {
            Ok(encoded) => FfiEncodeResult::ok(encoded),
            Err(e) => FfiEncodeResult::error((&e).into(), e.to_string()),
        }
    })
    .unwrap_or_else(|_| FfiEncodeResult::error(FfiErrorCode::Panic, "panic in rc_encode_body"))
}

/// Decode `body` according to `format`, returning the value as JSON text.
///
/// A null `format` returns the body unchanged, as a JSON string.
/// The caller must free the returned pointer with `rc_free_decode_result`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_decode(body: *const c_char, format: *const c_char) -> *mut FfiDecodeResult {
    catch_unwind(|| {
        let body = match unsafe { read_str(body) } {
            Ok(Some(b)) => b,
            Ok(None) => return FfiDecodeResult::error(FfiErrorCode::NullArg, "null argument: body"),
            Err(e) => return FfiDecodeResult::error(FfiErrorCode::InvalidUtf8, e.to_string()),
        };
        let format = match parse_format(format) {
            Ok(f) => f,
            Err(e) => return FfiDecodeResult::error(FfiErrorCode::InvalidUtf8, e.to_string()),
        };
        match decode(body, format.as_ref()) {
            Ok(value) => FfiDecodeResult::ok(value.to_string()),
            Err(e) => FfiDecodeResult::from_error(e),
        }
    })
    .unwrap_or_else(|_| FfiDecodeResult::error(FfiErrorCode::Panic, "panic in rc_decode"))
}

/// Parse `len` bytes of raw response text (status lines, headers, blank
/// line, body).
///
/// `declared_format` may be null to detect the format from `content-type`.
/// The body is returned both as text and as the exact received bytes.
/// Returns null if `raw` is null while `len` is non-zero.
/// The caller must free the returned pointer with `rc_free_parsed_response`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_parse_response(
    raw: *const u8,
    len: usize,
    declared_format: *const c_char,
) -> *mut FfiParsedResponse {
    catch_unwind(|| {
        let bytes: &[u8] = if raw.is_null() {
            if len != 0 {
                return std::ptr::null_mut();
            }
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(raw, len) }
        };
        let Ok(declared) = parse_format(declared_format) else {
            return std::ptr::null_mut();
        };
        let parsed = parse_response_bytes(bytes).with_declared_format(declared);
        FfiParsedResponse::from_core(&parsed)
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a new `RestClient` from JSON configuration text.
///
/// `config` may be null for defaults. Returns null if the configuration
/// does not parse, the base URL is invalid, or an internal panic occurs.
/// The caller must free the returned pointer with `rc_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_client_new(config: *const c_char) -> *mut FfiRestClient {
    catch_unwind(|| {
        let config: ClientConfig = match unsafe { read_str(config) } {
            Ok(Some(text)) => match serde_json::from_str(text) {
                Ok(c) => c,
                Err(_) => return std::ptr::null_mut(),
            },
            Ok(None) => ClientConfig::default(),
            Err(_) => return std::ptr::null_mut(),
        };
        match RestClient::new(config) {
            Ok(inner) => Box::into_raw(Box::new(FfiRestClient { inner })),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a `RestClient` created by `rc_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_client_free(client: *mut FfiRestClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// Build an HTTP request without sending it.
///
/// `method` is a method name such as `"POST"`. `parameters` is JSON text as
/// for `rc_encode_body` and may be null. `headers` may be null when
/// `headers_len` is 0.
/// Returns null if `client`, `method` or `url` is null, if any argument is
/// invalid, or if encoding fails.
/// The caller must free the returned pointer with `rc_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn rc_build_request(
    client: *const FfiRestClient,
    method: *const c_char,
    url: *const c_char,
    parameters: *const c_char,
    headers: *const FfiHeader,
    headers_len: u32,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() || (headers.is_null() && headers_len > 0) {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        let (Ok(Some(method)), Ok(Some(url))) =
            (unsafe { read_str(method) }, unsafe { read_str(url) })
        else {
            return std::ptr::null_mut();
        };
        let Ok(method) = method.parse::<HttpMethod>() else {
            return std::ptr::null_mut();
        };
        let Ok(parameters) = parse_parameters(parameters) else {
            return std::ptr::null_mut();
        };

        let raw_headers: &[FfiHeader] = if headers_len == 0 {
            &[]
        } else {
            unsafe { std::slice::from_raw_parts(headers, headers_len as usize) }
        };
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(raw_headers.len());
        for h in raw_headers {
            match (unsafe { read_str(h.key) }, unsafe { read_str(h.value) }) {
                (Ok(Some(k)), Ok(Some(v))) => pairs.push((k, v)),
                _ => return std::ptr::null_mut(),
            }
        }

        match client.inner.build_request(method, url, parameters, &pairs) {
            Ok(prepared) => FfiHttpRequest::from_core(prepared),
            Err(_) => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free an `FfiHttpRequest` returned by `rc_build_request`. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.url);
        free_c_string(req.body);
        free_c_string(req.request_id);
        free_c_string(req.idempotency_key);
        free_headers(req.headers, req.headers_len);
    });
}

/// Free an `FfiParsedResponse` returned by `rc_parse_response`. Safe to
/// call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_free_parsed_response(resp: *mut FfiParsedResponse) {
    if resp.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let resp = unsafe { Box::from_raw(resp) };
        free_c_string(resp.status_text);
        free_c_string(resp.http_version);
        free_c_string(resp.body);
        free_bytes(resp.body_bytes, resp.body_len);
        free_c_string(resp.format);
        free_headers(resp.headers, resp.headers_len);
    });
}

/// Free an `FfiEncodeResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_free_encode_result(result: *mut FfiEncodeResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.body);
        free_c_string(result.content_type);
    });
}

/// Free an `FfiDecodeResult`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_free_decode_result(result: *mut FfiDecodeResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        free_c_string(result.json);
    });
}

/// Free a string returned by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn rc_free_string(s: *mut c_char) {
    let _ = catch_unwind(|| free_c_string(s));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn str_of<'a>(ptr: *const c_char) -> &'a str {
        assert!(!ptr.is_null());
        unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
    }

    fn headers_of<'a>(ptr: *const FfiHeader, len: u32) -> Vec<(&'a str, &'a str)> {
        if len == 0 {
            return Vec::new();
        }
        unsafe { std::slice::from_raw_parts(ptr, len as usize) }
            .iter()
            .map(|h| (str_of(h.key), str_of(h.value)))
            .collect()
    }

    fn new_client(config: &str) -> *mut FfiRestClient {
        let config = CString::new(config).unwrap();
        rc_client_new(config.as_ptr())
    }

    // --- identifiers ---

    #[test]
    fn generate_id_is_upper_uuid() {
        let id = rc_generate_id();
        let text = str_of(id);
        assert_eq!(text.len(), 36);
        assert_eq!(text, text.to_uppercase());
        rc_free_string(id);
    }

    // --- encode ---

    #[test]
    fn encode_json_body() {
        let params = CString::new(r#"{"name":"Bob","tags":["a"]}"#).unwrap();
        let format = CString::new("json").unwrap();
        let result = rc_encode_body(params.as_ptr(), format.as_ptr(), false);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(r.error_message.is_null());
        assert_eq!(str_of(r.body), r#"{"name":"Bob","tags":["a"]}"#);
        assert_eq!(str_of(r.content_type), "application/json");
        rc_free_encode_result(result);
    }

    #[test]
    fn encode_default_format_has_no_content_type() {
        let params = CString::new(r#"{"tags":["a","b"]}"#).unwrap();
        let result = rc_encode_body(params.as_ptr(), std::ptr::null(), false);
        let r = unsafe { &*result };
        assert_eq!(str_of(r.body), "tags[]=a&tags[]=b");
        assert!(r.content_type.is_null());
        rc_free_encode_result(result);

        let result = rc_encode_body(params.as_ptr(), std::ptr::null(), true);
        assert_eq!(str_of(unsafe { &*result }.body), "tags[0]=a&tags[1]=b");
        rc_free_encode_result(result);
    }

    #[test]
    fn encode_invalid_json_reports_error() {
        let params = CString::new("{not json").unwrap();
        let result = rc_encode_body(params.as_ptr(), std::ptr::null(), false);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::InvalidJson);
        assert!(str_of(r.error_message).starts_with("parameters:"));
        assert!(r.body.is_null());
        rc_free_encode_result(result);
    }

    #[test]
    fn encode_xml_failure_reports_encode_error() {
        let params = CString::new(r#"{"item":{"1st":"x"}}"#).unwrap();
        let format = CString::new("xml").unwrap();
        let result = rc_encode_body(params.as_ptr(), format.as_ptr(), false);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::Encode);
        rc_free_encode_result(result);
    }

    #[test]
    fn encode_xml_single_list_key_succeeds() {
        let params = CString::new(r#"{"tags":["a","b"]}"#).unwrap();
        let format = CString::new("xml").unwrap();
        let result = rc_encode_body(params.as_ptr(), format.as_ptr(), false);
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert!(str_of(r.body).contains("<root><tags>a</tags><tags>b</tags></root>"));
        rc_free_encode_result(result);
    }

    #[test]
    fn encode_array_parameters_rejected() {
        let params = CString::new("[1,2]").unwrap();
        let result = rc_encode_body(params.as_ptr(), std::ptr::null(), false);
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::InvalidJson);
        rc_free_encode_result(result);
    }

    // --- decode ---

    #[test]
    fn decode_xml_to_json_text() {
        let body = CString::new("<r><a>1</a><a>2</a></r>").unwrap();
        let format = CString::new("xml").unwrap();
        let result = rc_decode(body.as_ptr(), format.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Ok);
        assert_eq!(str_of(r.json), r#"{"a":["1","2"]}"#);
        rc_free_decode_result(result);
    }

    #[test]
    fn decode_without_format_is_identity() {
        let body = CString::new("plain text").unwrap();
        let result = rc_decode(body.as_ptr(), std::ptr::null());
        assert_eq!(str_of(unsafe { &*result }.json), r#""plain text""#);
        rc_free_decode_result(result);
    }

    #[test]
    fn decode_malformed_json_reports_error() {
        let body = CString::new("{\"a\":").unwrap();
        let format = CString::new("json").unwrap();
        let result = rc_decode(body.as_ptr(), format.as_ptr());
        let r = unsafe { &*result };
        assert_eq!(r.error_code, FfiErrorCode::Decode);
        assert!(r.json.is_null());
        rc_free_decode_result(result);
    }

    #[test]
    fn decode_null_body_returns_null_arg() {
        let result = rc_decode(std::ptr::null(), std::ptr::null());
        assert_eq!(unsafe { &*result }.error_code, FfiErrorCode::NullArg);
        rc_free_decode_result(result);
    }

    // --- parse ---

    #[test]
    fn parse_response_exposes_fields() {
        let raw = b"HTTP/1.1 201 Created\r\nContent-Type: application/json\r\n\
                    Set-Cookie: a=1\r\nSet-Cookie: b=2\r\n\r\n{\"id\":1}";
        let resp = rc_parse_response(raw.as_ptr(), raw.len(), std::ptr::null());
        let r = unsafe { &*resp };
        assert_eq!(r.status_code, 201);
        assert_eq!(str_of(r.status_text), "Created");
        assert_eq!(str_of(r.http_version), "HTTP/1.1");
        assert_eq!(str_of(r.body), "{\"id\":1}");
        assert!(r.body_is_utf8);
        assert_eq!(r.body_len, 8);
        assert_eq!(str_of(r.format), "json");
        assert_eq!(
            headers_of(r.headers, r.headers_len),
            [
                ("content-type", "application/json"),
                ("set-cookie", "a=1"),
                ("set-cookie", "b=2"),
            ]
        );
        rc_free_parsed_response(resp);
    }

    #[test]
    fn parse_response_declared_format_wins() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n<a/>";
        let format = CString::new("xml").unwrap();
        let resp = rc_parse_response(raw.as_ptr(), raw.len(), format.as_ptr());
        assert_eq!(str_of(unsafe { &*resp }.format), "xml");
        rc_free_parsed_response(resp);
    }

    #[test]
    fn parse_empty_input() {
        let resp = rc_parse_response(std::ptr::null(), 0, std::ptr::null());
        let r = unsafe { &*resp };
        assert_eq!(r.status_code, 0);
        assert!(r.status_text.is_null());
        assert!(r.headers.is_null());
        assert!(r.format.is_null());
        assert_eq!(str_of(r.body), "");
        assert!(r.body_bytes.is_null());
        assert_eq!(r.body_len, 0);
        rc_free_parsed_response(resp);
    }

    #[test]
    fn parse_binary_body_keeps_bytes() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: image/png\r\n\r\n\x89PNG\x00\xff";
        let resp = rc_parse_response(raw.as_ptr(), raw.len(), std::ptr::null());
        let r = unsafe { &*resp };
        assert!(!r.body_is_utf8);
        let bytes = unsafe { std::slice::from_raw_parts(r.body_bytes, r.body_len) };
        assert_eq!(bytes, b"\x89PNG\x00\xff");
        assert_eq!(str_of(r.body), "\u{fffd}PNG\u{fffd}");
        rc_free_parsed_response(resp);
    }

    #[test]
    fn parse_null_with_length_returns_null() {
        assert!(rc_parse_response(std::ptr::null(), 4, std::ptr::null()).is_null());
    }

    // --- client ---

    #[test]
    fn client_new_and_free() {
        let client = new_client(r#"{"base_url":"http://localhost:3000"}"#);
        assert!(!client.is_null());
        rc_client_free(client);

        let client = rc_client_new(std::ptr::null());
        assert!(!client.is_null());
        rc_client_free(client);
    }

    #[test]
    fn client_new_rejects_bad_config() {
        assert!(new_client(r#"{"base_url":"not a url"}"#).is_null());
        assert!(new_client("{").is_null());
    }

    #[test]
    fn client_free_null_is_safe() {
        rc_client_free(std::ptr::null_mut());
    }

    #[test]
    fn build_get_request() {
        let client = new_client(r#"{"base_url":"http://localhost:3000/"}"#);
        let method = CString::new("GET").unwrap();
        let url = CString::new("/search").unwrap();
        let params = CString::new(r#"{"q":"a b","tags":["x"]}"#).unwrap();
        let req = rc_build_request(
            client,
            method.as_ptr(),
            url.as_ptr(),
            params.as_ptr(),
            std::ptr::null(),
            0,
        );
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Get);
        assert_eq!(str_of(r.url), "http://localhost:3000/search?q=a+b&tags[]=x");
        assert!(r.body.is_null());
        assert_eq!(r.headers_len, 0);
        assert_eq!(str_of(r.request_id).len(), 36);
        assert!(r.idempotency_key.is_null());
        assert_eq!(r.connect_timeout_ms, 10_000);
        assert_eq!(r.timeout_ms, 0);

        rc_free_request(req);
        rc_client_free(client);
    }

    #[test]
    fn build_post_request_with_headers() {
        let client = new_client(
            r#"{
                "request_format": "json",
                "idempotency_header": "Idempotency-Key",
                "transport": {"timeout": 2.5}
            }"#,
        );
        let method = CString::new("post").unwrap();
        let url = CString::new("http://api.test/orders").unwrap();
        let params = CString::new(r#"{"item":"widget"}"#).unwrap();
        let key = CString::new("X-Trace").unwrap();
        let value = CString::new("t-1").unwrap();
        let headers = [FfiHeader {
            key: key.as_ptr() as *mut c_char,
            value: value.as_ptr() as *mut c_char,
        }];
        let req = rc_build_request(
            client,
            method.as_ptr(),
            url.as_ptr(),
            params.as_ptr(),
            headers.as_ptr(),
            1,
        );
        assert!(!req.is_null());

        let r = unsafe { &*req };
        assert_eq!(r.method, FfiHttpMethod::Post);
        assert_eq!(str_of(r.body), r#"{"item":"widget"}"#);
        assert_eq!(str_of(r.idempotency_key), str_of(r.request_id));
        assert_eq!(r.timeout_ms, 2500);
        let sent = headers_of(r.headers, r.headers_len);
        assert_eq!(sent[0], ("X-Trace", "t-1"));
        assert_eq!(sent[1], ("Content-Type", "application/json"));
        assert_eq!(sent[2].0, "Idempotency-Key");

        rc_free_request(req);
        rc_client_free(client);
    }

    #[test]
    fn build_request_rejects_bad_arguments() {
        let client = rc_client_new(std::ptr::null());
        let get = CString::new("GET").unwrap();
        let trace = CString::new("TRACE").unwrap();
        let url = CString::new("http://h/").unwrap();

        let build = |client: *const FfiRestClient, method: &CString, url: *const c_char, len| {
            rc_build_request(client, method.as_ptr(), url, std::ptr::null(), std::ptr::null(), len)
        };
        let shared = client.cast_const();
        assert!(build(std::ptr::null(), &get, url.as_ptr(), 0).is_null());
        assert!(build(shared, &trace, url.as_ptr(), 0).is_null());
        assert!(build(shared, &get, std::ptr::null(), 0).is_null());
        assert!(build(shared, &get, url.as_ptr(), 2).is_null());

        rc_client_free(client);
    }

    // --- free ---

    #[test]
    fn free_null_is_safe() {
        rc_free_request(std::ptr::null_mut());
        rc_free_parsed_response(std::ptr::null_mut());
        rc_free_encode_result(std::ptr::null_mut());
        rc_free_decode_result(std::ptr::null_mut());
        rc_free_string(std::ptr::null_mut());
    }
}
