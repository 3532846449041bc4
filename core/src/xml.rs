//! XML request documents and XML response decoding.
//!
//! # Writing
//! A parameter set with a single top-level key uses that key as the root
//! element, unless its value is a list: repeated items cannot share one
//! root, so they go inside `<root>` like any other set. Mappings become nested
//! elements, list items repeat the element named after the list's key, and
//! scalars become text. `null` is an empty element.
//!
//! # Reading
//! The document is folded into JSON-like data: the root element itself is
//! dropped and its content returned. An element with only text becomes a
//! string, an element with children or attributes becomes an object
//! (attributes under `@attributes`), an empty element becomes `{}`, and
//! repeated sibling names fold into an array.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};

use crate::error::{DecodeError, EncodeError};
use crate::params::ParameterSet;

const DEFAULT_ROOT: &str = "root";

/// Serialize `params` as a complete XML document.
pub fn encode_xml(params: &ParameterSet) -> Result<String, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))
        .map_err(xml_write_error)?;
    newline(&mut writer)?;

    let mut single = params.iter();
    match (single.next(), single.next()) {
        (Some((root, value)), None) if !value.is_array() => {
            write_element(&mut writer, root, value)?;
        }
        _ => {
            start(&mut writer, DEFAULT_ROOT)?;
            for (key, value) in params {
                write_element(&mut writer, key, value)?;
            }
            end(&mut writer, DEFAULT_ROOT)?;
        }
    }
    newline(&mut writer)?;

    String::from_utf8(writer.into_inner()).map_err(|e| EncodeError::Xml(e.to_string()))
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), EncodeError> {
    if !is_element_name(name) {
        return Err(EncodeError::InvalidElementName(name.to_string()));
    }
    match value {
        Value::Null => writer
            .write_event(Event::Empty(BytesStart::new(name)))
            .map_err(xml_write_error),
        Value::Bool(b) => text_element(writer, name, if *b { "1" } else { "0" }),
        Value::Number(n) => text_element(writer, name, &n.to_string()),
        Value::String(s) => text_element(writer, name, s),
        Value::Object(map) => {
            start(writer, name)?;
            for (key, nested) in map {
                write_element(writer, key, nested)?;
            }
            end(writer, name)
        }
        // List items are named after the key that holds the list.
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
    }
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<(), EncodeError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_write_error)?;
    end(writer, name)
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), EncodeError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_write_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), EncodeError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_write_error)
}

fn newline(writer: &mut Writer<Vec<u8>>) -> Result<(), EncodeError> {
    writer
        .write_event(Event::Text(BytesText::new("\n")))
        .map_err(xml_write_error)
}

fn xml_write_error(err: impl std::fmt::Display) -> EncodeError {
    EncodeError::Xml(err.to_string())
}

/// XML 1.0 `Name` restricted to the ASCII-friendly subset a key can map to.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// One open element while reading.
struct Frame {
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<(String, Self), DecodeError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DecodeError::Xml(e.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            let value = unescape(&raw).map_err(|e| DecodeError::Xml(e.to_string()))?;
            attributes.insert(key, Value::String(value.into_owned()));
        }
        Ok((
            name,
            Frame {
                attributes,
                children: Map::new(),
                text: String::new(),
            },
        ))
    }

    fn close(self) -> Value {
        if self.children.is_empty() && self.attributes.is_empty() {
            let text = self.text.trim();
            if text.is_empty() {
                return Value::Object(Map::new());
            }
            return Value::String(text.to_string());
        }
        let mut object = Map::new();
        if !self.attributes.is_empty() {
            object.insert("@attributes".to_string(), Value::Object(self.attributes));
        }
        for (key, value) in self.children {
            object.insert(key, value);
        }
        Value::Object(object)
    }

    fn add_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// Parse an XML document into JSON-like data.
pub fn decode_xml(body: &str) -> Result<Value, DecodeError> {
    let mut reader = Reader::from_str(body);
    let mut stack: Vec<(String, Frame)> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| DecodeError::Xml(format!("at byte {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(DecodeError::Xml("content after the root element".to_string()));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(DecodeError::Xml("content after the root element".to_string()));
                }
                let (name, frame) = Frame::open(&start)?;
                finish(&mut stack, &mut root, name, frame.close());
            }
            Event::End(_) => {
                let Some((name, frame)) = stack.pop() else {
                    return Err(DecodeError::Xml("unbalanced end tag".to_string()));
                };
                finish(&mut stack, &mut root, name, frame.close());
            }
            Event::Text(text) => {
                let raw = String::from_utf8_lossy(&text);
                match stack.last_mut() {
                    Some((_, frame)) => {
                        let resolved = unescape(&raw).map_err(|e| DecodeError::Xml(e.to_string()))?;
                        frame.text.push_str(&resolved);
                    }
                    None if raw.trim().is_empty() => {}
                    None => {
                        return Err(DecodeError::Xml("text outside the root element".to_string()));
                    }
                }
            }
            Event::CData(data) => {
                if let Some((_, frame)) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some((_, frame)) = stack.last_mut() {
                    let entity = format!("&{};", String::from_utf8_lossy(&reference));
                    let resolved = unescape(&entity).map_err(|e| DecodeError::Xml(e.to_string()))?;
                    frame.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| DecodeError::Xml("document has no root element".to_string()))
}

fn finish(stack: &mut [(String, Frame)], root: &mut Option<Value>, name: String, value: Value) {
    match stack.last_mut() {
        Some((_, parent)) => parent.add_child(name, value),
        None => *root = Some(value),
    }
}
