//! Filter controls built from facet statistics.
//!
//! The panel holds two kinds of controls. Static controls come with the page
//! (configured up front, possibly with hand-curated options). Synthesized
//! controls are created from statistics when a search allows it and live in a
//! separate container that is emptied at the start of every refresh.

use crate::config::StaticFacet;
use crate::proto::FacetSlice;
use crate::proto::Observation;
use crate::proto::ObservationValue;
use crate::proto::StatisticsBlock;
use crate::vocab::Vocabulary;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetOption {
    pub value: String,
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum Management {
    /// Options are whatever the page shipped with.
    #[default]
    Unmanaged,
    /// Options were written by a statistics refresh.
    Managed { narrowed: bool },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FacetControl {
    pub id: String,
    pub name: String,
    pub label: String,
    pub options: Vec<FacetOption>,
    pub management: Management,
}

impl FacetControl {
    fn clear(&mut self) {
        self.options.clear();
    }

    pub fn is_narrowed(&self) -> bool {
        matches!(self.management, Management::Managed { narrowed: true })
    }
}

/// What a statistics refresh sees when it looks a dimension up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetControlState {
    Absent,
    StaticUnmanaged,
    DynamicManaged { narrowed: bool },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FacetPanel {
    static_controls: Vec<FacetControl>,
    dynamic_controls: Vec<FacetControl>,
}

impl FacetPanel {
    pub fn from_static(facets: &[StaticFacet]) -> Self {
        let static_controls = facets
            .iter()
            .map(|facet| FacetControl {
                id: facet.id.clone(),
                name: facet.name.clone().unwrap_or_else(|| facet.id.clone()),
                label: facet.label.clone().unwrap_or_else(|| facet.id.clone()),
                options: facet
                    .options
                    .iter()
                    .map(|option| FacetOption {
                        value: option.value.clone(),
                        label: option.label.clone(),
                    })
                    .collect(),
                management: Management::Unmanaged,
            })
            .collect();
        Self {
            static_controls,
            dynamic_controls: Vec::new(),
        }
    }

    pub fn control(&self, id: &str) -> Option<&FacetControl> {
        self.controls().find(|control| control.id == id)
    }

    /// Static controls first, then synthesized ones in creation order.
    pub fn controls(&self) -> impl Iterator<Item = &FacetControl> {
        self.static_controls
            .iter()
            .chain(self.dynamic_controls.iter())
    }

    pub fn synthesized(&self) -> &[FacetControl] {
        &self.dynamic_controls
    }

    pub fn clear_synthesized(&mut self) {
        self.dynamic_controls.clear();
    }

    pub fn state(&self, id: &str) -> FacetControlState {
        match self.control(id).map(|control| control.management) {
            None => FacetControlState::Absent,
            Some(Management::Unmanaged) => FacetControlState::StaticUnmanaged,
            Some(Management::Managed { narrowed }) => {
                FacetControlState::DynamicManaged { narrowed }
            }
        }
    }

    /// Merges `stats` into the panel.
    ///
    /// With `allow_dynamic` (statistics embedded in a search response) every
    /// touched control is replaced and flagged narrowed, and dimensions the
    /// page lacks get a synthesized control. Without it (the standalone
    /// statistics endpoint) only narrowed or empty controls are refilled, so
    /// hand-curated option lists survive, and synthesized controls are kept.
    pub fn render_stats(
        &mut self,
        stats: &StatisticsBlock,
        allow_dynamic: bool,
        vocab: &Vocabulary,
    ) {
        if allow_dynamic {
            self.dynamic_controls.clear();
        }
        for slice in &stats.slices {
            if slice.observations.is_empty() {
                continue;
            }
            let Some(control) = self.prepare_control(slice, allow_dynamic, vocab) else {
                continue;
            };
            control.options.extend(
                slice
                    .observations
                    .iter()
                    .filter_map(|observation| facet_option(observation, vocab)),
            );
        }
    }

    fn prepare_control(
        &mut self,
        slice: &FacetSlice,
        allow_dynamic: bool,
        vocab: &Vocabulary,
    ) -> Option<&mut FacetControl> {
        let position = self
            .static_controls
            .iter()
            .position(|control| control.id == slice.dimension);
        let Some(position) = position else {
            if !allow_dynamic {
                debug!(dimension = %slice.dimension, "no control for dimension");
                return None;
            }
            let existing = self
                .dynamic_controls
                .iter()
                .position(|control| control.id == slice.dimension);
            return match existing {
                Some(index) => {
                    let control = &mut self.dynamic_controls[index];
                    control.clear();
                    Some(control)
                }
                None => {
                    self.dynamic_controls.push(synthesize_control(slice, vocab));
                    self.dynamic_controls.last_mut()
                }
            };
        };

        let control = &mut self.static_controls[position];
        if allow_dynamic {
            control.clear();
            control.management = Management::Managed { narrowed: true };
        } else if control.is_narrowed() {
            control.clear();
            control.management = Management::Managed { narrowed: false };
        } else if !control.options.is_empty() {
            return None;
        }
        Some(control)
    }
}

fn synthesize_control(slice: &FacetSlice, vocab: &Vocabulary) -> FacetControl {
    let prefix = if slice.has_year() { "year-" } else { "" };
    let suffix = if slice.has_ref() { ".iri" } else { "" };
    FacetControl {
        id: slice.dimension.clone(),
        name: format!("{prefix}{}{suffix}", slice.dimension),
        label: vocab.term_label(&slice.dimension),
        options: Vec::new(),
        management: Management::Managed { narrowed: false },
    }
}

fn facet_option(observation: &Observation, vocab: &Vocabulary) -> Option<FacetOption> {
    let (value, label) = match observation.value()? {
        ObservationValue::Year(year) => (year.to_string(), year.to_string()),
        ObservationValue::Ref(iri) => {
            let leaf = leaf_segment(iri);
            let label = match vocab.common_entry(iri) {
                Some(entry) => entry.entity_name().unwrap_or(leaf).to_string(),
                None => {
                    warn!("Unknown object: {iri}");
                    leaf.to_string()
                }
            };
            (format!("*/{leaf}"), label)
        }
        ObservationValue::Term(term) => {
            let label = match vocab.term(term).and_then(|entry| entry.display_label()) {
                Some(label) => label.to_string(),
                None => {
                    warn!("Unknown term: {term}");
                    term.to_string()
                }
            };
            (term.to_string(), label)
        }
    };
    Some(FacetOption {
        value,
        label: format!("{label} ({})", observation.count),
    })
}

fn leaf_segment(iri: &str) -> &str {
    iri.rsplit_once('/').map_or(iri, |(_, leaf)| leaf)
}
