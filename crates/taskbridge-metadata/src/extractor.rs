//! Property extraction strategies.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use taskbridge_protocols::MetadataError;

use crate::document_cache::DocumentCache;

/// One way of reading an activity's annotations out of a definition.
///
/// `Ok(None)` means the strategy ran but found nothing; `Err` means it could
/// not run at all. Either way the next strategy gets a turn.
pub trait PropertyExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn properties(
        &self,
        definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<Vec<(String, String)>>, MetadataError>;

    fn documentation(
        &self,
        definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<String>, MetadataError>;
}

/// Reads the parsed node index.
pub struct StructuralExtractor {
    documents: Arc<DocumentCache>,
}

impl StructuralExtractor {
    pub fn new(documents: Arc<DocumentCache>) -> Self {
        Self { documents }
    }
}

impl PropertyExtractor for StructuralExtractor {
    fn name(&self) -> &'static str {
        "structural"
    }

    fn properties(
        &self,
        definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<Vec<(String, String)>>, MetadataError> {
        let parsed = self.documents.get_or_parse(definition_id, xml)?;
        Ok(parsed
            .activity(activity_id)
            .map(|activity| activity.properties.clone())
            .filter(|properties| !properties.is_empty()))
    }

    fn documentation(
        &self,
        definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<String>, MetadataError> {
        let parsed = self.documents.get_or_parse(definition_id, xml)?;
        Ok(parsed
            .activity(activity_id)
            .and_then(|activity| activity.documentation.clone()))
    }
}

static PROPERTIES_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?properties\b[^>]*>(.*?)</(?:[\w.-]+:)?properties\s*>")
        .expect("Invalid regex")
});

static PROPERTY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(?:[\w.-]+:)?property\b([^>]*?)/?>").expect("Invalid regex"));

static NAME_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\sname\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex"));

static VALUE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\svalue\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid regex"));

static DOCUMENTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[\w.-]+:)?documentation\b[^>]*>(.*?)</(?:[\w.-]+:)?documentation\s*>")
        .expect("Invalid regex")
});

static ELEMENT_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<(?P<tag>[\w.-]+(?::[\w.-]+)?)\b[^>]*?\sid\s*=\s*["'](?P<id>[^"']*)["'][^>]*?(?P<empty>/)?>"#,
    )
    .expect("Invalid regex")
});

/// Textual scan of the raw document. Used when the document does not parse.
///
/// The activity's element is located by its `id` attribute and the first
/// annotation block up to the element's closing tag is read.
#[derive(Debug, Default)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }

    fn element_body<'a>(xml: &'a str, activity_id: &str) -> Option<&'a str> {
        let caps = ELEMENT_OPEN
            .captures_iter(xml)
            .find(|caps| &caps["id"] == activity_id)?;
        if caps.name("empty").is_some() {
            return None;
        }
        let start = caps.get(0)?.end();
        let close = format!("</{}", &caps["tag"]);
        let end = xml[start..]
            .find(&close)
            .map(|offset| start + offset)
            .unwrap_or(xml.len());
        Some(&xml[start..end])
    }
}

impl PropertyExtractor for PatternExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn properties(
        &self,
        _definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<Vec<(String, String)>>, MetadataError> {
        let Some(body) = Self::element_body(xml, activity_id) else {
            return Ok(None);
        };
        let Some(block) = PROPERTIES_BLOCK.captures(body) else {
            return Ok(None);
        };

        let properties: Vec<(String, String)> = PROPERTY_TAG
            .captures_iter(&block[1])
            .filter_map(|tag| {
                let attrs = tag.get(1)?.as_str();
                let name = attr_value(&NAME_ATTR, attrs)?;
                let value = attr_value(&VALUE_ATTR, attrs).unwrap_or_default();
                Some((name, value))
            })
            .collect();

        Ok(Some(properties).filter(|p| !p.is_empty()))
    }

    fn documentation(
        &self,
        _definition_id: &str,
        xml: &str,
        activity_id: &str,
    ) -> Result<Option<String>, MetadataError> {
        let Some(body) = Self::element_body(xml, activity_id) else {
            return Ok(None);
        };
        let text = DOCUMENTATION
            .captures(body)
            .map(|caps| caps[1].trim().to_string())
            .map(|text| match text.strip_prefix("<![CDATA[") {
                Some(inner) => inner.strip_suffix("]]>").unwrap_or(inner).trim().to_string(),
                None => unescape(&text),
            })
            .filter(|text| !text.is_empty());
        Ok(text)
    }
}

fn attr_value(pattern: &Regex, attrs: &str) -> Option<String> {
    let caps = pattern.captures(attrs)?;
    let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
    Some(unescape(raw))
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
