//! Response patterns
//!
//! A pattern mirrors the shape of a bank body. String leaves written as
//! `{{field}}` name the capture; everything else in the pattern is structure.

use crate::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;
use std::collections::HashMap;

/// Field name to captured text
pub type Captures = HashMap<String, String>;

fn placeholder(leaf: &str) -> Option<&str> {
    leaf.trim()
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

fn captured_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string().replace('"', "")),
    }
}

/// Walk `body` alongside `pattern`, collecting placeholder values.
///
/// Arrays in the pattern apply their first element to the first element of
/// the body array. Paths missing from the body are skipped.
pub fn capture_json(pattern: &Value, body: &Value, captures: &mut Captures) {
    match pattern {
        Value::String(leaf) => {
            if let Some(name) = placeholder(leaf) {
                if let Some(text) = captured_text(body) {
                    captures.insert(name.to_string(), text);
                }
            }
        }
        Value::Object(fields) => {
            for (key, sub_pattern) in fields {
                if let Some(sub_body) = body.get(key) {
                    capture_json(sub_pattern, sub_body, captures);
                }
            }
        }
        Value::Array(items) => {
            if let (Some(sub_pattern), Some(sub_body)) = (items.first(), body.get(0)) {
                capture_json(sub_pattern, sub_body, captures);
            }
        }
        _ => {}
    }
}

/// Capture the text of XML elements by local name, ignoring namespaces.
///
/// The first occurrence of each element wins.
pub fn capture_xml(fields: &[(&str, &str)], body: &str) -> Result<Captures> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut captures = Captures::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let local = element.local_name();
                current = Some(String::from_utf8_lossy(local.as_ref()).into_owned());
            }
            Event::End(_) => current = None,
            Event::Text(text) => {
                let Some(element) = current.as_deref() else {
                    continue;
                };
                if let Some((_, field)) = fields.iter().find(|(name, _)| *name == element) {
                    let value = text.unescape()?.into_owned();
                    captures.entry(field.to_string()).or_insert(value);
                }
            }
            Event::CData(data) => {
                let Some(element) = current.as_deref() else {
                    continue;
                };
                if let Some((_, field)) = fields.iter().find(|(name, _)| *name == element) {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    captures.entry(field.to_string()).or_insert(value);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(captures)
}

/// Parse a JSON pattern definition
pub fn parse_pattern(pattern: &str) -> Result<Value> {
    serde_json::from_str(pattern).map_err(|e| Error::Template(format!("invalid pattern: {}", e)))
}
