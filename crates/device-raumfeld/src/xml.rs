//! Small quick-xml helpers shared by the SOAP and DIDL-Lite readers

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::debug;

pub(crate) fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Unescaped text, or the raw text when it holds entities quick-xml does not know
pub(crate) fn decode_text(e: &BytesText) -> String {
    match e.unescape() {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}

/// First non-empty text of every leaf element, keyed by local name
///
/// Reading stops quietly at the first syntax error; whatever was collected
/// up to that point is returned.
pub(crate) fn leaf_texts(xml: &str) -> HashMap<String, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut texts = HashMap::new();
    let mut stack: Vec<String> = Vec::new();
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                stack.push(local_name(&e));
                current_text.clear();
            }
            Ok(Event::Text(e)) => current_text.push_str(&decode_text(&e)),
            Ok(Event::CData(e)) => current_text.push_str(&String::from_utf8_lossy(&e)),
            Ok(Event::End(_)) => {
                if let Some(name) = stack.pop() {
                    let value = current_text.trim();
                    if !value.is_empty() {
                        texts.entry(name).or_insert_with(|| value.to_string());
                    }
                }
                current_text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Stopped reading XML at position {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }

    texts
}
