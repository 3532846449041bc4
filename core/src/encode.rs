//! Format-aware request body encoding.

use crate::error::EncodeError;
use crate::format::Format;
use crate::params::{ParameterSet, Parameters};
use crate::query::{encode_query, ListStyle};
use crate::xml::encode_xml;

/// Options that only affect the default (undeclared) format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Keep `key[0]=a&key[1]=b` instead of rewriting to `key[]=a&key[]=b`.
    pub keep_indexed_queries: bool,
}

/// Serialized body plus the content type that describes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub body: String,
    pub content_type: Option<&'static str>,
}

/// Serialize `parameters` for the wire.
///
/// `json`, `xml` and `form` produce their matching content type. Any other
/// format, or none, produces an unlabelled URL-encoded string. A `Raw`
/// parameter string is always passed through untouched.
pub fn encode_body(
    parameters: &Parameters,
    format: Option<&Format>,
    options: EncodeOptions,
) -> Result<EncodedBody, EncodeError> {
    let content_type = format.and_then(Format::content_type);
    let body = match parameters {
        Parameters::Raw(raw) => raw.clone(),
        Parameters::Set(set) => match format {
            Some(Format::Json) => encode_json(set)?,
            Some(Format::Xml) => encode_xml(set)?,
            Some(Format::Form) => encode_query(set, ListStyle::Indexed),
            Some(Format::Other(_)) | None => encode_query(set, query_style(options)),
        },
    };
    Ok(EncodedBody { body, content_type })
}

/// URL-encode a parameter set the way undeclared-format bodies and query
/// strings are encoded.
pub fn encode_url(parameters: &Parameters, options: EncodeOptions) -> String {
    match parameters {
        Parameters::Raw(raw) => raw.clone(),
        Parameters::Set(set) => encode_query(set, query_style(options)),
    }
}

fn query_style(options: EncodeOptions) -> ListStyle {
    if options.keep_indexed_queries {
        ListStyle::Indexed
    } else {
        ListStyle::Bare
    }
}

fn encode_json(set: &ParameterSet) -> Result<String, EncodeError> {
    if set.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(set)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn params(value: Value) -> Parameters {
        Parameters::from_json(value).unwrap()
    }

    fn encode(parameters: &Parameters, format: Option<Format>) -> EncodedBody {
        encode_body(parameters, format.as_ref(), EncodeOptions::default()).unwrap()
    }

    #[test]
    fn json_keeps_order_and_nesting() {
        let encoded = encode(&params(json!({"z": 1, "a": {"b": [1, 2]}})), Some(Format::Json));
        assert_eq!(encoded.body, r#"{"z":1,"a":{"b":[1,2]}}"#);
        assert_eq!(encoded.content_type, Some("application/json"));
    }

    #[test]
    fn json_empty_set_is_empty_body() {
        let encoded = encode(&Parameters::default(), Some(Format::Json));
        assert_eq!(encoded.body, "");
        assert_eq!(encoded.content_type, Some("application/json"));
    }

    #[test]
    fn raw_string_passes_through_every_format() {
        let raw = Parameters::from("{\"already\":\"encoded\"}");
        for format in [Some(Format::Json), Some(Format::Xml), Some(Format::Form), None] {
            let encoded = encode(&raw, format);
            assert_eq!(encoded.body, "{\"already\":\"encoded\"}");
        }
    }

    #[test]
    fn raw_string_still_gets_content_type() {
        let encoded = encode(&Parameters::from("<a/>"), Some(Format::Xml));
        assert_eq!(encoded.content_type, Some("application/xml"));
    }

    #[test]
    fn xml_uses_single_key_as_root() {
        let user = params(json!({"user": {"name": "Bob", "age": 5}}));
        let encoded = encode(&user, Some(Format::Xml));
        assert!(encoded.body.contains("<user><name>Bob</name><age>5</age></user>"));
        assert_eq!(encoded.content_type, Some("application/xml"));
    }

    #[test]
    fn form_keeps_indices() {
        let encoded = encode(&params(json!({"tags": ["a", "b"]})), Some(Format::Form));
        assert_eq!(encoded.body, "tags[0]=a&tags[1]=b");
        assert_eq!(encoded.content_type, Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn default_drops_indices_and_sets_no_content_type() {
        let encoded = encode(&params(json!({"tags": ["a", "b"]})), None);
        assert_eq!(encoded.body, "tags[]=a&tags[]=b");
        assert_eq!(encoded.content_type, None);
    }

    #[test]
    fn default_keeps_indices_when_asked() {
        let options = EncodeOptions {
            keep_indexed_queries: true,
        };
        let encoded = encode_body(&params(json!({"tags": ["a", "b"]})), None, options).unwrap();
        assert_eq!(encoded.body, "tags[0]=a&tags[1]=b");
    }

    #[test]
    fn unknown_format_behaves_like_default() {
        let encoded = encode(&params(json!({"a": "b c"})), Some(Format::Other("csv".into())));
        assert_eq!(encoded.body, "a=b+c");
        assert_eq!(encoded.content_type, None);
    }

    #[test]
    fn xml_errors_surface() {
        let err = encode_body(
            &params(json!({"a": {"": "x"}})),
            Some(&Format::Xml),
            EncodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::InvalidElementName(_)));
    }
}
