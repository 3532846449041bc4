//! Response body decoding.

use serde_json::Value;

use crate::error::DecodeError;
use crate::format::Format;
use crate::query::decode_query;
use crate::xml::decode_xml;

/// Decode `body` according to `format`.
///
/// `json` is strict: malformed input is an error, never `null`. An empty
/// body decodes to `null` since there is nothing to be malformed. `xml`
/// folds the document into JSON-like data and `form` rebuilds bracket
/// keys into nested data. Any other format, or none, returns the body
/// unchanged as a JSON string.
pub fn decode(body: &str, format: Option<&Format>) -> Result<Value, DecodeError> {
    match format {
        Some(Format::Json) if body.trim().is_empty() => Ok(Value::Null),
        Some(Format::Json) => Ok(serde_json::from_str(body)?),
        Some(Format::Xml) => decode_xml(body),
        Some(Format::Form) => Ok(decode_query(body)),
        Some(Format::Other(_)) | None => Ok(Value::String(body.to_string())),
    }
}

/// Hand the raw body to a caller-supplied decoder, bypassing format logic.
pub fn decode_with<T, F>(body: &str, decoder: F) -> T
where
    F: FnOnce(&str) -> T,
{
    decoder(body)
}
