//! XML response bodies.
//!
//! The root element is dropped and its children become the top-level fields. Attributes are
//! ignored, repeated elements collapse into arrays, text-only elements become strings and
//! empty elements become empty strings.

use quick_xml::{Reader, events::Event};
use serde_json::{Map, Value};

use crate::error::{IpcError, Result};

/// Element being built while its end tag has not been seen yet.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn new(name: String) -> Self {
        Self { name, children: Map::new(), text: String::new() }
    }

    fn into_value(self) -> Value {
        if self.children.is_empty() {
            Value::String(self.text)
        } else {
            Value::Object(self.children)
        }
    }
}

/// Parses an XML document into the fields under its root element.
pub(crate) fn parse(body: &[u8]) -> Result<Map<String, Value>> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Map<String, Value>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Frame::new(name));
            }
            Ok(Event::End(_)) => {
                let Some(frame) = stack.pop() else {
                    return Err(IpcError::InvalidResponse("unbalanced XML end tag".to_owned()));
                };
                match stack.last_mut() {
                    Some(parent) => {
                        let name = frame.name.clone();
                        add_child(&mut parent.children, name, frame.into_value());
                    }
                    None => root = Some(frame.children),
                }
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some(parent) => {
                        add_child(&mut parent.children, name, Value::String(String::new()));
                    }
                    None => root = Some(Map::new()),
                }
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| IpcError::InvalidResponse(format!("XML decode error: {e}")))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(IpcError::InvalidResponse(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(IpcError::InvalidResponse("unterminated XML element".to_owned()));
    }
    root.ok_or_else(|| IpcError::InvalidResponse("XML document has no root element".to_owned()))
}

fn add_child(parent: &mut Map<String, Value>, name: String, value: Value) {
    match parent.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            parent.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_is_dropped() {
        let xml = b"<Response><Status>0</Status><OrderID>A1</OrderID></Response>";
        let fields = parse(xml).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["Status"], "0");
        assert_eq!(fields["OrderID"], "A1");
    }

    #[test]
    fn test_attributes_ignored_and_nested_kept() {
        let xml = br#"<Response version="1.4"><Card type="1"><Last4>1</Last4></Card></Response>"#;
        let fields = parse(xml).unwrap();
        assert_eq!(fields["Card"]["Last4"], "1");
        assert!(fields["Card"].get("type").is_none());
    }

    #[test]
    fn test_repeated_elements_become_array() {
        let xml = b"<R><Trn><Id>1</Id></Trn><Trn><Id>2</Id></Trn><Trn><Id>3</Id></Trn></R>";
        let fields = parse(xml).unwrap();
        let items = fields["Trn"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[2]["Id"], "3");
    }

    #[test]
    fn test_empty_elements_and_entities() {
        let xml = b"<R><Note/><Empty></Empty><Name>Tom &amp; Jerry</Name></R>";
        let fields = parse(xml).unwrap();
        assert_eq!(fields["Note"], "");
        assert_eq!(fields["Empty"], "");
        assert_eq!(fields["Name"], "Tom & Jerry");
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(matches!(parse(b"<R><A>1</B></R>"), Err(IpcError::InvalidResponse(_))));
        assert!(matches!(parse(b"<R><A>1</A>"), Err(IpcError::InvalidResponse(_))));
        assert!(matches!(parse(b"just text"), Err(IpcError::InvalidResponse(_))));
    }
}
