//! Rendering capability used by the renderers.
//!
//! Renderers only build a data object and hand it to [`Templates`]; what the
//! output looks like is the implementation's business.

use crate::error::TemplateError;
use crate::query::sort_link;
use crate::query::to_service_ref;
use serde_json::Map;
use serde_json::Value;
use std::fmt::Write as _;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Results,
    Document,
    Error,
}

pub trait Templates: Send + Sync {
    fn render(&self, kind: TemplateKind, data: &Value) -> Result<String, TemplateError>;
}

/// Plain text output for terminals.
#[derive(Clone, Debug, Default)]
pub struct TextTemplates {
    /// Keys offered as sort links under the result range.
    pub sort_terms: Vec<String>,
}

impl TextTemplates {
    pub fn with_sort_terms(terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            sort_terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    fn results(&self, data: &Value) -> Result<String, TemplateError> {
        let query_ref = str_field(data, "queryRef")?;
        let start = u64_field(data, "start")?;
        let end = u64_field(data, "end")?;
        let total = u64_field(data, "totalResults")?;
        let items = data
            .pointer("/results/items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut out = String::new();
        let _ = writeln!(out, "{start}–{end} of {total}");
        for term in &self.sort_terms {
            let _ = writeln!(out, "  sort by {term}: #{}", sort_link(query_ref, term));
        }
        for (offset, item) in items.iter().enumerate() {
            let position = start.saturating_add(offset as u64);
            let title = item_title(item);
            match item.get("iri").and_then(Value::as_str) {
                Some(iri) => {
                    let _ = writeln!(out, "{position:>4}. {title}  #{}", to_service_ref(iri));
                }
                None => {
                    let _ = writeln!(out, "{position:>4}. {title}");
                }
            }
        }
        Ok(out)
    }

    fn document(&self, data: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        let heading = data
            .get("heading")
            .and_then(Value::as_str)
            .unwrap_or("(untitled)");
        let _ = writeln!(out, "{heading}");
        let _ = writeln!(out, "{}", "=".repeat(heading.chars().count()));
        write_section(&mut out, None, object_field(data, "properties")?);
        write_section(&mut out, Some("Relations"), object_field(data, "relations")?);
        write_section(&mut out, Some("Incoming"), object_field(data, "incoming")?);
        Ok(out)
    }

    fn error(&self, data: &Value) -> Result<String, TemplateError> {
        let query_ref = str_field(data, "queryRef")?;
        let response = data
            .get("response")
            .ok_or(TemplateError::MissingField("response"))?;
        let mut out = String::new();
        let _ = writeln!(out, "Request failed: {query_ref}");
        let status_text = response
            .get("statusText")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match response.get("status").and_then(Value::as_u64) {
            Some(status) => {
                let _ = writeln!(out, "{status} {status_text}");
            }
            None => {
                let _ = writeln!(out, "{status_text}");
            }
        }
        if let Some(body) = response.get("responseText").and_then(Value::as_str) {
            let _ = writeln!(out, "{body}");
        }
        Ok(out)
    }
}

impl Templates for TextTemplates {
    fn render(&self, kind: TemplateKind, data: &Value) -> Result<String, TemplateError> {
        match kind {
            TemplateKind::Results => self.results(data),
            TemplateKind::Document => self.document(data),
            TemplateKind::Error => self.error(data),
        }
    }
}

fn str_field<'a>(data: &'a Value, field: &'static str) -> Result<&'a str, TemplateError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or(TemplateError::MissingField(field))
}

fn u64_field(data: &Value, field: &'static str) -> Result<u64, TemplateError> {
    data.get(field)
        .and_then(Value::as_u64)
        .ok_or(TemplateError::MissingField(field))
}

fn object_field<'a>(
    data: &'a Value,
    field: &'static str,
) -> Result<&'a Map<String, Value>, TemplateError> {
    data.get(field)
        .and_then(Value::as_object)
        .ok_or(TemplateError::MissingField(field))
}

fn item_title(item: &Value) -> String {
    ["identifier", "title", "name", "label", "iri"]
        .iter()
        .find_map(|key| item.get(*key).and_then(Value::as_str))
        .unwrap_or("?")
        .to_string()
}

fn write_section(out: &mut String, title: Option<&str>, fields: &Map<String, Value>) {
    if fields.is_empty() {
        return;
    }
    if let Some(title) = title {
        let _ = writeln!(out, "\n{title}:");
    }
    for (key, value) in fields {
        let _ = writeln!(out, "  {key}: {}", display_value(value));
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(values) => values
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(object) => match object.get("iri").and_then(Value::as_str) {
            Some(iri) => {
                let title = item_title(value);
                if title == iri {
                    format!("#{}", to_service_ref(iri))
                } else {
                    format!("{title} #{}", to_service_ref(iri))
                }
            }
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}
