use crate::config::ClientConfig;
use crate::facets::FacetPanel;

/// A region of the page that receives rendered template output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pane {
    content: Option<String>,
    folded: bool,
}

impl Pane {
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty)
    }

    pub fn is_folded(&self) -> bool {
        self.folded
    }

    pub fn set(&mut self, content: String) {
        self.content = Some(content);
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    /// Collapses a non-empty pane; its content stays available.
    pub fn fold(&mut self) {
        if !self.is_empty() {
            self.folded = true;
        }
    }

    pub fn unfold(&mut self) {
        self.folded = false;
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub results: Pane,
    pub document: Pane,
    pub error: Pane,
    pub facets: FacetPanel,
}

impl Page {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            facets: FacetPanel::from_static(&config.static_facets),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pane_does_not_fold() {
        let mut pane = Pane::default();
        pane.fold();
        assert!(!pane.is_folded());

        pane.set("1–10 of 23".to_string());
        pane.fold();
        assert!(pane.is_folded());
        assert_eq!(pane.content(), Some("1–10 of 23"));

        pane.unfold();
        assert!(!pane.is_folded());
    }
}
