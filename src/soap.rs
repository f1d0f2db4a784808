//! SOAP envelope decoding.
//!
//! Turns a SOAP XML document into a plain record so that it can flow
//! through the same validation and mapping steps as a REST payload.
//!
//! Element conversion rules:
//! - an element with only text becomes a string (`""` when empty)
//! - attributes are collected under `"$"`, and text next to child
//!   elements or attributes under `"_"`
//! - repeated sibling elements become an array, a single one stays a
//!   plain value
//! - names keep their namespace prefix (`sms:ChargeSMS`)

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};
use std::fmt;

pub const ENVELOPE_ELEMENT: &str = "soapenv:Envelope";
pub const BODY_ELEMENT: &str = "soapenv:Body";

/// Error type for SOAP decoding (the payload is structurally unusable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoapError {
    /// The document is not well-formed XML
    Xml(String),
    /// Well-formed XML without an envelope body
    MissingBody,
}

impl fmt::Display for SoapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SoapError::Xml(msg) => write!(f, "Failed to parse SOAP XML: {}", msg),
            SoapError::MissingBody => write!(
                f,
                "Failed to parse SOAP XML: Invalid SOAP structure: Missing {}",
                BODY_ELEMENT
            ),
        }
    }
}

impl std::error::Error for SoapError {}

/// Element under construction
struct Frame {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, SoapError> {
        let mut attributes = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| SoapError::Xml(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| SoapError::Xml(e.to_string()))?;
            attributes.insert(
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                Value::String(value.into_owned()),
            );
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Map::new(),
            text: String::new(),
        })
    }

    fn close(self) -> (String, Value) {
        if self.children.is_empty() && self.attributes.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut object = Map::new();
        if !self.attributes.is_empty() {
            object.insert("$".to_string(), Value::Object(self.attributes));
        }
        if !self.text.trim().is_empty() {
            object.insert("_".to_string(), Value::String(self.text));
        }
        object.extend(self.children);
        (self.name, Value::Object(object))
    }

    fn add_child(&mut self, name: String, value: Value) {
        add_child(&mut self.children, name, value);
    }
}

fn add_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

/// Decode an XML document into a record keyed by its root element name.
pub fn parse_xml(xml: &str) -> Result<Value, SoapError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| SoapError::Xml(format!("{} at byte {}", e, reader.buffer_position())))?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(SoapError::Xml("content after the root element".to_string()));
                }
                stack.push(Frame::open(&start)?);
            }
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None if root.is_none() => root = Some((name, value)),
                    None => {
                        return Err(SoapError::Xml("content after the root element".to_string()))
                    }
                }
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| SoapError::Xml(e.to_string()))?;
                match stack.last_mut() {
                    Some(frame) => frame.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(SoapError::Xml("text outside the root element".to_string())),
                }
            }
            Event::CData(data) => {
                let bytes = data.into_inner();
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&bytes));
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(SoapError::Xml("unexpected closing tag".to_string()));
                };
                let (name, value) = frame.close();
                match stack.last_mut() {
                    Some(parent) => parent.add_child(name, value),
                    None => root = Some((name, value)),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(SoapError::Xml(format!("unclosed element <{}>", open.name)));
    }

    let (name, value) = root.ok_or_else(|| SoapError::Xml("document has no root element".to_string()))?;
    let mut record = Map::new();
    record.insert(name, value);
    Ok(Value::Object(record))
}

/// Decode a SOAP document and return the content of
/// `soapenv:Envelope > soapenv:Body`.
///
/// # Example
///
/// ```
/// use mvnomap::soap::parse_soap;
/// use serde_json::json;
///
/// let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
///   <soapenv:Body><Ping><Id>7</Id></Ping></soapenv:Body>
/// </soapenv:Envelope>"#;
///
/// assert_eq!(parse_soap(xml).unwrap(), json!({"Ping": {"Id": "7"}}));
/// ```
pub fn parse_soap(xml: &str) -> Result<Value, SoapError> {
    let mut document = parse_xml(xml)?;

    document
        .get_mut(ENVELOPE_ELEMENT)
        .and_then(|envelope| envelope.get_mut(BODY_ELEMENT))
        .map(Value::take)
        .ok_or(SoapError::MissingBody)
}
