//! Result, document, error and facet rendering into a [`Page`].

use crate::error::FetchFailure;
use crate::page::Page;
use crate::proto::DocumentRecord;
use crate::proto::ResultSet;
use crate::proto::StatisticsBlock;
use crate::query::QueryReference;
use crate::templates::TemplateKind;
use crate::templates::Templates;
use crate::vocab::Vocabulary;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use std::sync::Arc;
use tracing::error;

const CONTEXT_FIELD: &str = "@context";
const REVERSE_FIELD: &str = "rev";
const REVERSE_PREFIX: &str = "rev.";
const HEADING_FIELDS: [&str; 4] = ["identifier", "name", "altLabel", "label"];

/// Whether facet statistics still have to be fetched after rendering results.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatisticsFollowUp {
    Rendered,
    FetchRequired,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultsData<'a> {
    query_ref: &'a str,
    start: u64,
    end: u64,
    total_results: u64,
    results: &'a ResultSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorData<'a> {
    query_ref: &'a str,
    response: &'a FetchFailure,
}

/// A document split up the way the document template wants it.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DocumentView {
    pub heading: Option<String>,
    pub properties: Map<String, Value>,
    pub relations: Map<String, Value>,
    pub incoming: Map<String, Value>,
}

impl DocumentView {
    pub fn from_record(record: &DocumentRecord) -> Self {
        let mut view = Self {
            heading: heading(record),
            ..Default::default()
        };
        for (key, value) in record.fields() {
            if key == CONTEXT_FIELD {
                continue;
            }
            if key == REVERSE_FIELD {
                if let Value::Object(reverse) = value {
                    for (rev_key, rev_value) in reverse {
                        view.incoming
                            .insert(format!("{REVERSE_PREFIX}{rev_key}"), rev_value.clone());
                    }
                }
                continue;
            }
            if key.starts_with(REVERSE_PREFIX) {
                view.incoming.insert(key.clone(), value.clone());
            } else if is_literal(value) {
                view.properties.insert(key.clone(), value.clone());
            } else {
                view.relations.insert(key.clone(), value.clone());
            }
        }
        view
    }
}

/// Strings, and arrays that lead with a string, are literals; anything else
/// points at other resources.
fn is_literal(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Array(values) => values.first().is_some_and(Value::is_string),
        _ => false,
    }
}

fn heading(record: &DocumentRecord) -> Option<String> {
    HEADING_FIELDS
        .iter()
        .filter_map(|field| record.fields().get(*field))
        .find_map(|value| match value {
            Value::String(text) if !text.is_empty() => Some(text.clone()),
            _ => None,
        })
}

#[derive(Clone)]
pub struct Renderer {
    templates: Arc<dyn Templates>,
    vocab: Arc<Vocabulary>,
}

impl Renderer {
    pub fn new(templates: Arc<dyn Templates>, vocab: Arc<Vocabulary>) -> Self {
        Self { templates, vocab }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn render_results(
        &self,
        page: &mut Page,
        reference: &QueryReference,
        results: &ResultSet,
    ) -> StatisticsFollowUp {
        page.error.clear();
        page.document.clear();
        let data = ResultsData {
            query_ref: reference.as_str(),
            start: results.first_position(),
            end: results.last_position(),
            total_results: results.total_results,
            results,
        };
        page.results.unfold();
        match self.render(TemplateKind::Results, &data) {
            Some(content) => page.results.set(content),
            None => page.results.clear(),
        }
        match &results.statistics {
            Some(stats) => {
                self.render_stats(page, stats, true);
                StatisticsFollowUp::Rendered
            }
            None => {
                page.facets.clear_synthesized();
                StatisticsFollowUp::FetchRequired
            }
        }
    }

    pub fn render_document(
        &self,
        page: &mut Page,
        reference: &QueryReference,
        record: &DocumentRecord,
    ) {
        page.error.clear();
        page.results.fold();
        let view = DocumentView::from_record(record);
        match self.render(TemplateKind::Document, &view) {
            Some(content) => page.document.set(content),
            None => {
                error!(%reference, "document view left empty");
                page.document.clear();
            }
        }
    }

    /// Results and document are cleared so a failure never sits next to a
    /// stale view of another request.
    pub fn render_error(
        &self,
        page: &mut Page,
        reference: &QueryReference,
        failure: &FetchFailure,
    ) {
        page.document.clear();
        page.results.clear();
        page.results.unfold();
        let data = ErrorData {
            query_ref: reference.as_str(),
            response: failure,
        };
        match self.render(TemplateKind::Error, &data) {
            Some(content) => page.error.set(content),
            None => page.error.set(format!("{reference}: {failure}")),
        }
    }

    pub fn render_stats(&self, page: &mut Page, stats: &StatisticsBlock, allow_dynamic: bool) {
        page.facets.render_stats(stats, allow_dynamic, &self.vocab);
    }

    fn render(&self, kind: TemplateKind, data: &impl Serialize) -> Option<String> {
        let value = match serde_json::to_value(data) {
            Ok(value) => value,
            Err(err) => {
                error!(?kind, error = %err, "failed to build template data");
                return None;
            }
        };
        match self.templates.render(kind, &value) {
            Ok(content) => Some(content),
            Err(err) => {
                error!(?kind, error = %err, "failed to render template");
                None
            }
        }
    }
}
