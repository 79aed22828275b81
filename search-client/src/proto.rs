//! JSON shapes exchanged with the search service.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Body of the vocabulary endpoints: `{ "topic": [ ... ] }`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct VocabularyDocument {
    #[serde(default)]
    pub topic: Vec<VocabularyEntry>,
}

/// A term or shared entity, keyed by its IRI.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    #[serde(default)]
    pub iri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse_of: Option<InverseOf>,
}

impl VocabularyEntry {
    /// First non-empty of `label`, `name`, `altLabel`.
    pub fn display_label(&self) -> Option<&str> {
        [&self.label, &self.name, &self.alt_label]
            .into_iter()
            .filter_map(|candidate| candidate.as_deref())
            .find(|candidate| !candidate.is_empty())
    }

    /// First non-empty of `name`, `altLabel`; how shared entities are shown.
    pub fn entity_name(&self) -> Option<&str> {
        [&self.name, &self.alt_label]
            .into_iter()
            .filter_map(|candidate| candidate.as_deref())
            .find(|candidate| !candidate.is_empty())
    }
}

/// The inverse of a relation term, either embedded or by IRI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InverseOf {
    Iri(String),
    Described {
        #[serde(default)]
        iri: Option<String>,
        #[serde(default)]
        label: Option<String>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticsBlock {
    #[serde(default)]
    pub slices: Vec<FacetSlice>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetSlice {
    pub dimension: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub observations: Vec<Observation>,
}

impl FacetSlice {
    pub fn has_year(&self) -> bool {
        self.observations
            .iter()
            .any(|obs| matches!(obs.value(), Some(ObservationValue::Year(_))))
    }

    pub fn has_ref(&self) -> bool {
        self.observations
            .iter()
            .any(|obs| matches!(obs.value(), Some(ObservationValue::Ref(_))))
    }
}

/// One value of a facet with its occurrence count.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationValue<'a> {
    Year(&'a str),
    Ref(&'a str),
    Term(&'a str),
}

impl Observation {
    pub fn year(year: impl Into<String>, count: u64) -> Self {
        Self {
            year: Some(year.into()),
            count,
            ..Default::default()
        }
    }

    pub fn reference(iri: impl Into<String>, count: u64) -> Self {
        Self {
            reference: Some(iri.into()),
            count,
            ..Default::default()
        }
    }

    pub fn term(iri: impl Into<String>, count: u64) -> Self {
        Self {
            term: Some(iri.into()),
            count,
            ..Default::default()
        }
    }

    /// Year wins over ref, ref over term. Empty strings count as absent.
    pub fn value(&self) -> Option<ObservationValue<'_>> {
        fn present(slot: &Option<String>) -> Option<&str> {
            slot.as_deref().filter(|value| !value.is_empty())
        }
        present(&self.year)
            .map(ObservationValue::Year)
            .or_else(|| present(&self.reference).map(ObservationValue::Ref))
            .or_else(|| present(&self.term).map(ObservationValue::Term))
    }
}

/// One page of search hits.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(default)]
    pub start_index: u64,
    pub items_per_page: u64,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResultSet {
    /// One-based first position on this page.
    pub fn first_position(&self) -> u64 {
        self.start_index.saturating_add(1)
    }

    /// Last position on this page, never past the total.
    pub fn last_position(&self) -> u64 {
        self.start_index
            .saturating_add(self.items_per_page)
            .min(self.total_results)
    }
}

/// A single resource as served by the document endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRecord(pub Map<String, Value>);

impl DocumentRecord {
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// A decoded search response, told apart by the presence of paging fields.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Results(ResultSet),
    Document(DocumentRecord),
}

impl Payload {
    pub fn classify(value: Value) -> Result<Self, serde_json::Error> {
        let paged = value
            .get("itemsPerPage")
            .is_some_and(|field| !field.is_null());
        if paged {
            Ok(Self::Results(serde_json::from_value(value)?))
        } else {
            Ok(Self::Document(serde_json::from_value(value)?))
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
