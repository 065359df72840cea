//! Decoding TourCMS XML bodies into generic values
//!
//! Mapping rules:
//! - an element with child elements becomes an object keyed by child name
//! - repeated sibling names collapse into an array in document order
//! - a text-only element becomes a string, an empty one becomes `null`
//! - attributes become keys of the element's object; text next to
//!   attributes or children is kept under `__content__`

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::{SdkError, SdkResult};

pub const CONTENT_KEY: &str = "__content__";
const RESPONSE_ELEMENT: &str = "response";

/// Element under construction
struct Node {
    name: String,
    fields: Map<String, Value>,
    has_fields: bool,
    text: String,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> SdkResult<Self> {
        let mut fields = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(decode_err)?;
            let key = utf8(attr.key.as_ref())?;
            let value = attr.unescape_value().map_err(decode_err)?;
            fields.insert(key, Value::String(value.into_owned()));
        }
        Ok(Self {
            name: utf8(start.name().as_ref())?,
            has_fields: !fields.is_empty(),
            fields,
            text: String::new(),
        })
    }

    fn add_child(&mut self, name: String, value: Value) {
        self.has_fields = true;
        match self.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.fields.insert(name, value);
            }
        }
    }

    fn finish(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if !self.has_fields {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut fields = self.fields;
            if !text.is_empty() {
                fields.insert(CONTENT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(fields)
        };
        (self.name, value)
    }
}

/// Parse a whole document, returning the root element's name and value.
pub fn parse_document(body: &[u8]) -> SdkResult<(String, Value)> {
    let text = std::str::from_utf8(body)
        .map_err(|e| SdkError::Decode(format!("Body is not valid UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let finished = match reader.read_event().map_err(decode_err)? {
            Event::Start(start) => {
                stack.push(Node::open(&start)?);
                None
            }
            Event::Empty(start) => Some(Node::open(&start)?.finish()),
            Event::End(_) => match stack.pop() {
                Some(node) => Some(node.finish()),
                None => return Err(SdkError::Decode("Unbalanced closing tag".to_string())),
            },
            Event::Text(t) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&t.unescape().map_err(decode_err)?);
                }
                None
            }
            Event::CData(c) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&utf8(&c.into_inner())?);
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, value)) = finished {
            match stack.last_mut() {
                Some(parent) => parent.add_child(name, value),
                None if root.is_none() => root = Some((name, value)),
                None => {
                    return Err(SdkError::Decode(
                        "Document has more than one root element".to_string(),
                    ))
                }
            }
        }
    }

    if !stack.is_empty() {
        return Err(SdkError::Decode("Unexpected end of document".to_string()));
    }
    root.ok_or_else(|| SdkError::Decode("Document has no root element".to_string()))
}

/// Decode a body and return the contents of its top-level `response` element.
///
/// # Example
/// ```
/// use tourcms_sdk::xml::decode_response;
/// let value = decode_response(b"<response><status>ok</status></response>").unwrap();
/// assert_eq!(value, serde_json::json!({ "status": "ok" }));
/// ```
pub fn decode_response(body: &[u8]) -> SdkResult<Value> {
    let (name, value) = parse_document(body)?;
    if name != RESPONSE_ELEMENT {
        return Err(SdkError::Decode(format!(
            "Expected top-level <{}> element, found <{}>",
            RESPONSE_ELEMENT, name
        )));
    }
    Ok(value)
}

fn utf8(bytes: &[u8]) -> SdkResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| SdkError::Decode(format!("Invalid UTF-8 in document: {}", e)))
}

fn decode_err(e: impl std::fmt::Display) -> SdkError {
    SdkError::Decode(format!("Malformed XML: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_response() {
        let value = decode_response(b"<response><status>ok</status></response>").unwrap();
        assert_eq!(value, json!({ "status": "ok" }));
    }

    #[test]
    fn test_missing_response_element() {
        let err = decode_response(b"<error><status>fail</status></error>").unwrap_err();
        assert!(matches!(err, SdkError::Decode(_)));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            decode_response(b"<response><status>ok</response>"),
            Err(SdkError::Decode(_))
        ));
        assert!(matches!(
            decode_response(b"<response><status>ok</status>"),
            Err(SdkError::Decode(_))
        ));
        assert!(matches!(decode_response(b""), Err(SdkError::Decode(_))));
        assert!(matches!(
            decode_response(b"not xml at all"),
            Err(SdkError::Decode(_))
        ));
    }

    #[test]
    fn test_non_utf8_body() {
        assert!(matches!(
            decode_response(&[0x3c, 0xff, 0xfe, 0x3e]),
            Err(SdkError::Decode(_))
        ));
    }

    #[test]
    fn test_repeated_siblings_become_array() {
        let body = br#"<?xml version="1.0" encoding="utf-8"?>
<response>
  <request>GET /c/tours/list.xml</request>
  <error>OK</error>
  <tour><tour_id>1</tour_id><tour_name>Loch Ness</tour_name></tour>
  <tour><tour_id>2</tour_id><tour_name>Skye</tour_name></tour>
  <tour><tour_id>3</tour_id><tour_name>Glencoe</tour_name></tour>
</response>"#;
        let value = decode_response(body).unwrap();
        assert_eq!(value["error"], "OK");
        let tours = value["tour"].as_array().expect("tour should be an array");
        assert_eq!(tours.len(), 3);
        assert_eq!(tours[1], json!({ "tour_id": "2", "tour_name": "Skye" }));
    }

    #[test]
    fn test_empty_elements_are_null() {
        let value = decode_response(b"<response><a/><b></b><c>  </c></response>").unwrap();
        assert_eq!(value, json!({ "a": null, "b": null, "c": null }));
    }

    #[test]
    fn test_attributes_and_content() {
        let body = br#"<response><price currency="GBP">120.00</price><image url="a.jpg"/></response>"#;
        let value = decode_response(body).unwrap();
        assert_eq!(
            value,
            json!({
                "price": { "currency": "GBP", "__content__": "120.00" },
                "image": { "url": "a.jpg" },
            })
        );
    }

    #[test]
    fn test_entities_and_cdata() {
        let body = b"<response><name>Fish &amp; Chips</name><desc><![CDATA[<b>bold</b>]]></desc></response>";
        let value = decode_response(body).unwrap();
        assert_eq!(value["name"], "Fish & Chips");
        assert_eq!(value["desc"], "<b>bold</b>");
    }

    #[test]
    fn test_empty_response_element() {
        assert_eq!(decode_response(b"<response/>").unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_document_reports_root_name() {
        let (name, value) = parse_document(b"<channels><channel>1</channel></channels>").unwrap();
        assert_eq!(name, "channels");
        assert_eq!(value, json!({ "channel": "1" }));
    }
}
