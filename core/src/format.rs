//! Body formats and content-type detection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::headers::Headers;

/// Serialization scheme of a request or response body.
///
/// Unknown names are kept in `Other` so that e.g. a detected `html` still
/// round-trips through `as_str` and falls back to identity decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Format {
    Json,
    Xml,
    Form,
    Other(String),
}

impl Format {
    /// Map a format name or media subtype onto a `Format`.
    ///
    /// Structured-syntax suffixes count: `vnd.api+json` is `Json`,
    /// `atom+xml` is `Xml`.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "json" => Format::Json,
            "xml" => Format::Xml,
            "form" | "x-www-form-urlencoded" => Format::Form,
            _ if name.ends_with("+json") => Format::Json,
            _ if name.ends_with("+xml") => Format::Xml,
            _ => Format::Other(name),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
            Format::Form => "form",
            Format::Other(name) => name,
        }
    }

    /// Content type sent with a body of this format, if the format has one.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            Format::Json => Some("application/json"),
            Format::Xml => Some("application/xml"),
            Format::Form => Some("application/x-www-form-urlencoded"),
            Format::Other(_) => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Format {
    fn from(name: &str) -> Self {
        Format::from_name(name)
    }
}

impl From<String> for Format {
    fn from(name: String) -> Self {
        Format::from_name(&name)
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_string()
    }
}

/// Subtype of a `type/subtype[; params]` media type, lower-cased.
pub fn media_subtype(content_type: &str) -> Option<String> {
    let media = content_type.split(';').next()?.trim();
    let (kind, subtype) = media.split_once('/')?;
    let subtype = subtype.trim();
    if kind.trim().is_empty() || subtype.is_empty() {
        return None;
    }
    Some(subtype.to_ascii_lowercase())
}

/// Infer the body format from the `content-type` header.
///
/// `application/json` yields `json`; no header or an unparseable value
/// yields `None`.
pub fn detect_format(headers: &Headers) -> Option<Format> {
    let content_type = headers.first("content-type")?;
    media_subtype(content_type).map(Format::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(content_type: &str) -> Headers {
        let mut headers = Headers::new();
        headers.append("Content-Type", content_type);
        headers
    }

    #[test]
    fn detects_json_and_xml() {
        assert_eq!(detect_format(&headers_with("application/json")), Some(Format::Json));
        assert_eq!(detect_format(&headers_with("text/xml")), Some(Format::Xml));
        assert_eq!(
            detect_format(&headers_with("Application/JSON; charset=utf-8")),
            Some(Format::Json)
        );
    }

    #[test]
    fn unknown_subtype_is_kept() {
        let detected = detect_format(&headers_with("text/html; charset=UTF-8")).unwrap();
        assert_eq!(detected, Format::Other("html".to_string()));
        assert_eq!(detected.as_str(), "html");
    }

    #[test]
    fn suffixes_map_to_base_format() {
        assert_eq!(
            detect_format(&headers_with("application/vnd.api+json")),
            Some(Format::Json)
        );
        assert_eq!(detect_format(&headers_with("application/atom+xml")), Some(Format::Xml));
    }

    #[test]
    fn missing_or_malformed_header_detects_nothing() {
        assert_eq!(detect_format(&Headers::new()), None);
        assert_eq!(detect_format(&headers_with("garbage")), None);
        assert_eq!(detect_format(&headers_with("/json")), None);
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(Format::from("JSON"), Format::Json);
        assert_eq!(Format::from(" form "), Format::Form);
        assert_eq!(Format::from("csv").to_string(), "csv");
    }

    #[test]
    fn serde_uses_plain_names() {
        let format: Format = serde_json::from_str("\"xml\"").unwrap();
        assert_eq!(format, Format::Xml);
        assert_eq!(serde_json::to_string(&Format::Json).unwrap(), "\"json\"");
    }
}
