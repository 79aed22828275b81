//! Query references and the places they come from: the search form, in-page
//! links, and the location hash.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::fmt;

fn compile_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|err| panic!("invalid regex literal {pattern}: {err}"))
}

static RESOURCE_IRI: Lazy<Regex> =
    Lazy::new(|| compile_regex(r"^https?://[^/]+([^#]+?)(/data\.json)?(#.+)?$"));
static SORT_PARAM: Lazy<Regex> = Lazy::new(|| compile_regex(r"&_sort=([^&]+)"));

/// Endpoint path plus query string, e.g. `/-/publ?q=skatt&_page=2`.
///
/// Stored verbatim in the location hash, so it must survive a round trip
/// through [`Location`] unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryReference(String);

impl QueryReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Resolves an in-page link. The leading `#` is dropped; an empty
    /// remainder means the link does not navigate anywhere.
    pub fn from_href(href: &str) -> Option<Self> {
        let mut chars = href.chars();
        chars.next()?;
        let rest = chars.as_str();
        if rest.is_empty() {
            None
        } else {
            Some(Self::new(rest))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// The search form: an action path and its fields in document order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryForm {
    pub action: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

impl Default for QueryForm {
    fn default() -> Self {
        Self {
            action: crate::config::DEFAULT_FORM_ACTION.to_string(),
            fields: Vec::new(),
        }
    }
}

impl QueryForm {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Replaces the first field called `name`, appending it if missing.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => field.value = value,
            None => self.fields.push(FormField {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// `action?name=value&...`, encoded the way a browser serializes a form.
    pub fn to_reference(&self) -> QueryReference {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for field in &self.fields {
            serializer.append_pair(&field.name, &field.value);
        }
        QueryReference::new(format!("{}?{}", self.action, serializer.finish()))
    }

    pub fn statistics_reference(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.action)
    }
}

/// The addressable location of the page. Only the hash fragment matters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    hash: String,
}

impl Location {
    /// Accepts the fragment with or without its leading `#`.
    pub fn new(fragment: &str) -> Self {
        let mut location = Self::default();
        let fragment = fragment.strip_prefix('#').unwrap_or(fragment);
        if !fragment.is_empty() {
            location.hash = format!("#{fragment}");
        }
        location
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn set_hash(&mut self, reference: &QueryReference) {
        self.hash = format!("#{reference}");
    }

    pub fn reference(&self) -> Option<QueryReference> {
        self.hash
            .strip_prefix('#')
            .filter(|rest| !rest.is_empty())
            .map(QueryReference::new)
    }
}

/// Maps a resource IRI onto the JSON endpoint that serves it:
/// `http://host/publ/sfs/1999:175#P1` becomes `/publ/sfs/1999:175/data.json#P1`.
pub fn to_service_ref(iri: &str) -> String {
    RESOURCE_IRI.replace(iri, "$1/data.json$3").into_owned()
}

/// Cycles the sort order of `reference` for `sort_term`: unsorted or sorted by
/// another key, then ascending, then descending, then unsorted again.
pub fn sort_link(reference: &str, sort_term: &str) -> String {
    let current = SORT_PARAM
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or_default();
    let next = if current == format!("-{sort_term}") {
        String::new()
    } else if current == sort_term {
        format!("-{sort_term}")
    } else {
        sort_term.to_string()
    };
    let stripped = SORT_PARAM.replace(reference, "");
    if next.is_empty() {
        stripped.into_owned()
    } else {
        format!("{stripped}&_sort={next}")
    }
}
