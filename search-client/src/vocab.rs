//! Label dictionaries shared by every renderer.
//!
//! Two dictionaries are loaded once per session, `terms` (properties and
//! classes) followed by `common` (shared entities such as publishers), and
//! are read-only afterwards.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::error::Result;
use crate::gateway::ServiceGateway;
use crate::proto::InverseOf;
use crate::proto::VocabularyDocument;
use crate::proto::VocabularyEntry;
use std::collections::HashMap;
use tracing::error;
use tracing::info;

const REVERSE_PREFIX: &str = "rev.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Empty,
    TermsOnly,
    Complete,
}

#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    terms: HashMap<String, VocabularyEntry>,
    common: HashMap<String, VocabularyEntry>,
    state: LoadState,
}

impl Vocabulary {
    pub fn from_entries(
        terms: impl IntoIterator<Item = VocabularyEntry>,
        common: impl IntoIterator<Item = VocabularyEntry>,
    ) -> Self {
        let mut vocab = Self::default();
        vocab.insert_terms(terms);
        vocab.insert_common(common);
        vocab.state = LoadState::Complete;
        vocab
    }

    /// Loads `terms`, then `common`; the second request is only made once the
    /// first has succeeded.
    pub async fn load(gateway: &dyn ServiceGateway, config: &ClientConfig) -> Result<Self> {
        let mut vocab = Self::default();
        vocab.load_into(gateway, config).await?;
        Ok(vocab)
    }

    /// Like [`Vocabulary::load`], but a failure leaves whatever was loaded in
    /// place. Lookups against the missing part fall back to derived labels.
    pub async fn load_or_degrade(gateway: &dyn ServiceGateway, config: &ClientConfig) -> Self {
        let mut vocab = Self::default();
        if let Err(err) = vocab.load_into(gateway, config).await {
            error!(
                error = %err,
                state = ?vocab.state,
                "vocabulary load failed; continuing with partial labels"
            );
        }
        vocab
    }

    async fn load_into(
        &mut self,
        gateway: &dyn ServiceGateway,
        config: &ClientConfig,
    ) -> Result<()> {
        let terms = fetch_topics(gateway, &config.terms_path).await?;
        self.insert_terms(terms.topic);
        self.state = LoadState::TermsOnly;

        let common = fetch_topics(gateway, &config.common_path).await?;
        self.insert_common(common.topic);
        self.state = LoadState::Complete;

        info!(
            terms = self.terms.len(),
            common = self.common.len(),
            "vocabulary loaded"
        );
        Ok(())
    }

    fn insert_terms(&mut self, entries: impl IntoIterator<Item = VocabularyEntry>) {
        insert_keyed(&mut self.terms, entries);
    }

    fn insert_common(&mut self, entries: impl IntoIterator<Item = VocabularyEntry>) {
        insert_keyed(&mut self.common, entries);
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn term(&self, iri: &str) -> Option<&VocabularyEntry> {
        self.terms.get(iri)
    }

    pub fn common_entry(&self, iri: &str) -> Option<&VocabularyEntry> {
        self.common.get(iri)
    }

    /// Human label for a facet dimension or field key.
    ///
    /// `rev.<key>` is labelled with the inverse of `<key>` when the vocabulary
    /// knows one, otherwise the raw key is returned unchanged.
    pub fn term_label(&self, key: &str) -> String {
        if let Some(base) = key.strip_prefix(REVERSE_PREFIX) {
            return self
                .terms
                .get(base)
                .and_then(|entry| entry.inverse_of.as_ref())
                .and_then(|inverse| self.inverse_label(inverse))
                .unwrap_or_else(|| key.to_string());
        }
        self.terms
            .get(key)
            .and_then(VocabularyEntry::display_label)
            .map_or_else(|| key.to_string(), str::to_string)
    }

    fn inverse_label(&self, inverse: &InverseOf) -> Option<String> {
        match inverse {
            InverseOf::Described {
                label: Some(label), ..
            } if !label.is_empty() => Some(label.clone()),
            InverseOf::Described { iri: Some(iri), .. } | InverseOf::Iri(iri) => self
                .terms
                .get(iri)
                .and_then(VocabularyEntry::display_label)
                .map(str::to_string),
            InverseOf::Described { .. } => None,
        }
    }
}

fn insert_keyed(
    target: &mut HashMap<String, VocabularyEntry>,
    entries: impl IntoIterator<Item = VocabularyEntry>,
) {
    for entry in entries {
        if entry.iri.is_empty() {
            continue;
        }
        target.insert(entry.iri.clone(), entry);
    }
}

async fn fetch_topics(gateway: &dyn ServiceGateway, path: &str) -> Result<VocabularyDocument> {
    let value = gateway
        .fetch_json(path)
        .await
        .map_err(|failure| ClientError::Fetch {
            reference: path.to_string(),
            failure,
        })?;
    serde_json::from_value(value).map_err(|source| ClientError::Payload {
        reference: path.to_string(),
        source,
    })
}
