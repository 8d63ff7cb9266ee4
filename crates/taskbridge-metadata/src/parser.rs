//! Structural BPMN parsing.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use taskbridge_protocols::MetadataError;

/// Annotations attached to one BPMN node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityMetadata {
    /// `extensionElements/*:properties/*:property` pairs in document order.
    pub properties: Vec<(String, String)>,
    pub documentation: Option<String>,
}

/// Index of every annotated node in a process definition, keyed by node id.
#[derive(Debug, Clone, Default)]
pub struct ParsedDefinition {
    pub definition_id: String,
    pub activities: HashMap<String, ActivityMetadata>,
}

impl ParsedDefinition {
    pub fn activity(&self, activity_id: &str) -> Option<&ActivityMetadata> {
        self.activities.get(activity_id)
    }
}

struct OpenElement {
    local_name: String,
    id: Option<String>,
}

/// Parse a BPMN document into a node index.
///
/// Properties and documentation belong to the nearest enclosing element that
/// carries an `id` attribute. Namespace prefixes are ignored so Camunda and
/// Zeebe extension blocks are read alike.
pub fn parse_definition(definition_id: &str, xml: &str) -> Result<ParsedDefinition, MetadataError> {
    let parse_err = |message: String| MetadataError::Parse {
        definition_id: definition_id.to_string(),
        message,
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut activities: HashMap<String, ActivityMetadata> = HashMap::new();
    let mut documentation: Option<(String, String)> = None;
    let mut saw_root = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                let element = open_element(&e).map_err(parse_err)?;
                if element.local_name == "property" {
                    record_property(&stack, &e, &mut activities).map_err(parse_err)?;
                } else if element.local_name == "documentation" {
                    if let Some(owner) = nearest_id(&stack) {
                        documentation = Some((owner.to_string(), String::new()));
                    }
                }
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if local_name(e.local_name().as_ref()) == "property" {
                    record_property(&stack, &e, &mut activities).map_err(parse_err)?;
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = documentation.as_mut() {
                    let unescaped = t.unescape().map_err(|e| parse_err(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, text)) = documentation.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(e)) => {
                let name = local_name(e.local_name().as_ref());
                stack.pop();
                if name == "documentation" {
                    if let Some((owner, text)) = documentation.take() {
                        let text = text.trim();
                        if !text.is_empty() {
                            activities.entry(owner).or_default().documentation =
                                Some(text.to_string());
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(parse_err(format!(
                    "at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
        }
    }

    if !saw_root {
        return Err(parse_err("document has no elements".to_string()));
    }
    if !stack.is_empty() {
        return Err(parse_err("unexpected end of document".to_string()));
    }

    Ok(ParsedDefinition {
        definition_id: definition_id.to_string(),
        activities,
    })
}

fn local_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn open_element(e: &BytesStart<'_>) -> Result<OpenElement, String> {
    Ok(OpenElement {
        local_name: local_name(e.local_name().as_ref()),
        id: attribute(e, "id")?,
    })
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, String> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn nearest_id(stack: &[OpenElement]) -> Option<&str> {
    stack.iter().rev().find_map(|element| element.id.as_deref())
}

fn record_property(
    stack: &[OpenElement],
    e: &BytesStart<'_>,
    activities: &mut HashMap<String, ActivityMetadata>,
) -> Result<(), String> {
    let in_properties = stack
        .last()
        .is_some_and(|parent| parent.local_name == "properties");
    let in_extensions = stack
        .iter()
        .any(|element| element.local_name == "extensionElements");
    if !in_properties || !in_extensions {
        return Ok(());
    }

    let Some(owner) = nearest_id(stack) else {
        return Ok(());
    };
    let Some(name) = attribute(e, "name")? else {
        return Ok(());
    };
    let value = attribute(e, "value")?.unwrap_or_default();

    activities
        .entry(owner.to_string())
        .or_default()
        .properties
        .push((name, value));
    Ok(())
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
