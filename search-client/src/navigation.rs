//! Routing between the location hash and the search service.
//!
//! The controller owns the page. Navigation events rewrite the location hash
//! and start a fetch; completions come back over a channel and are applied in
//! the order they arrive, except that a search response is dropped when a
//! newer navigation has been started since it was requested.

use crate::config::ClientConfig;
use crate::error::FetchFailure;
use crate::gateway::ServiceGateway;
use crate::page::Page;
use crate::progress::ProgressIndicator;
use crate::progress::ProgressTarget;
use crate::proto::Payload;
use crate::proto::StatisticsBlock;
use crate::query::Location;
use crate::query::QueryForm;
use crate::query::QueryReference;
use crate::render::Renderer;
use crate::render::StatisticsFollowUp;
use crate::templates::Templates;
use crate::vocab::Vocabulary;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    /// Page load: process whatever the location hash holds.
    Load,
    /// The location hash was changed from outside (back/forward, bookmarks).
    HashChanged(String),
    /// The search form was submitted.
    Submit(QueryForm),
    /// An in-page link or sort control was followed; carries its `href`.
    LinkClicked(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NavState {
    #[default]
    Idle,
    Loading,
    Displayed,
    Error,
}

/// How the most recent applied navigation ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavOutcome {
    Results(QueryReference),
    Document(QueryReference),
    Failed(QueryReference),
}

#[derive(Clone, Debug)]
struct Navigation {
    token: u64,
    reference: QueryReference,
}

#[derive(Debug)]
enum Completion {
    Query {
        token: u64,
        reference: QueryReference,
        result: Result<Value, FetchFailure>,
    },
    Statistics {
        result: Result<Value, FetchFailure>,
    },
}

enum Step {
    Event(Option<NavEvent>),
    Completion(Completion),
}

pub struct NavigationController {
    gateway: Arc<dyn ServiceGateway>,
    renderer: Renderer,
    page: Page,
    location: Location,
    form: QueryForm,
    statistics_ref: String,
    progress: ProgressIndicator,
    state: NavState,
    current: Option<Navigation>,
    next_token: u64,
    in_flight: usize,
    last_outcome: Option<NavOutcome>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl NavigationController {
    pub fn new(
        config: &ClientConfig,
        gateway: Arc<dyn ServiceGateway>,
        vocab: Arc<Vocabulary>,
        templates: Arc<dyn Templates>,
        location: Location,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            renderer: Renderer::new(templates, vocab),
            page: Page::new(config),
            location,
            form: config.query_form.clone(),
            statistics_ref: config.statistics_reference(),
            progress: ProgressIndicator::new(config.pulse_period()),
            state: NavState::Idle,
            current: None,
            next_token: 0,
            in_flight: 0,
            last_outcome: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Loads the vocabulary, then fetches global statistics and whatever the
    /// location hash points at.
    pub async fn bootstrap(
        config: &ClientConfig,
        gateway: Arc<dyn ServiceGateway>,
        templates: Arc<dyn Templates>,
        location: Location,
    ) -> Self {
        let vocab = Vocabulary::load_or_degrade(gateway.as_ref(), config).await;
        let mut controller = Self::new(config, gateway, Arc::new(vocab), templates, location);
        controller.start();
        controller
    }

    /// Statistics are requested even when the hash is empty so the facet
    /// controls are populated before the first search.
    pub fn start(&mut self) {
        self.load_statistics();
        self.dispatch(NavEvent::Load);
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn last_outcome(&self) -> Option<&NavOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.renderer.vocabulary()
    }

    pub fn progress(&self) -> &ProgressIndicator {
        &self.progress
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn dispatch(&mut self, event: NavEvent) {
        match event {
            NavEvent::Load => {
                if let Some(reference) = self.location.reference() {
                    self.query(reference);
                } else {
                    debug!("empty location hash; nothing to load");
                }
            }
            NavEvent::HashChanged(fragment) => {
                let previous = self.location.reference();
                self.location = Location::new(&fragment);
                match self.location.reference() {
                    Some(reference) if Some(&reference) != previous.as_ref() => {
                        self.query(reference);
                    }
                    Some(_) => debug!("location hash unchanged"),
                    None => debug!("location hash cleared"),
                }
            }
            NavEvent::Submit(form) => {
                let reference = form.to_reference();
                self.form = form;
                self.navigate(reference);
            }
            NavEvent::LinkClicked(href) => match QueryReference::from_href(&href) {
                Some(reference) => self.navigate(reference),
                None => debug!(%href, "link without a service reference"),
            },
        }
    }

    /// Processes events until the sender goes away, then drains whatever is
    /// still in flight.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<NavEvent>) {
        loop {
            let step = tokio::select! {
                event = events.recv() => Step::Event(event),
                Some(completion) = self.completions_rx.recv() => Step::Completion(completion),
            };
            match step {
                Step::Event(Some(event)) => self.dispatch(event),
                Step::Event(None) => break,
                Step::Completion(completion) => self.apply(completion),
            }
        }
        self.settle().await;
    }

    /// Applies completions until no request is outstanding.
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            let Some(completion) = self.completions_rx.recv().await else {
                break;
            };
            self.apply(completion);
        }
    }

    fn navigate(&mut self, reference: QueryReference) {
        self.location.set_hash(&reference);
        self.query(reference);
    }

    fn query(&mut self, reference: QueryReference) {
        self.next_token += 1;
        let token = self.next_token;
        debug!(%reference, token, "query");
        self.current = Some(Navigation {
            token,
            reference: reference.clone(),
        });
        self.state = NavState::Loading;
        self.progress.start(ProgressTarget::Content);
        self.in_flight += 1;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = gateway.fetch_json(reference.as_str()).await;
            let _ = tx.send(Completion::Query {
                token,
                reference,
                result,
            });
        });
    }

    fn load_statistics(&mut self) {
        self.progress.start(ProgressTarget::QueryBox);
        self.in_flight += 1;

        let gateway = Arc::clone(&self.gateway);
        let tx = self.completions_tx.clone();
        let reference = self.statistics_ref.clone();
        tokio::spawn(async move {
            let result = gateway.fetch_json(&reference).await;
            let _ = tx.send(Completion::Statistics { result });
        });
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match completion {
            Completion::Query {
                token,
                reference,
                result,
            } => {
                self.progress.stop(ProgressTarget::Content);
                let is_current = self
                    .current
                    .as_ref()
                    .is_some_and(|current| current.token == token);
                if !is_current {
                    debug!(%reference, token, "dropping response for superseded navigation");
                    return;
                }
                self.apply_query(reference, result);
            }
            Completion::Statistics { result } => {
                self.progress.stop(ProgressTarget::QueryBox);
                self.apply_statistics(result);
            }
        }
    }

    fn apply_query(&mut self, reference: QueryReference, result: Result<Value, FetchFailure>) {
        let payload = result.and_then(|value| {
            Payload::classify(value)
                .map_err(|err| FetchFailure::transport(format!("unexpected payload: {err}")))
        });
        match payload {
            Ok(Payload::Results(results)) => {
                self.state = NavState::Displayed;
                let follow_up = self
                    .renderer
                    .render_results(&mut self.page, &reference, &results);
                if follow_up == StatisticsFollowUp::FetchRequired {
                    self.load_statistics();
                }
                self.last_outcome = Some(NavOutcome::Results(reference));
            }
            Ok(Payload::Document(record)) => {
                self.state = NavState::Displayed;
                self.renderer
                    .render_document(&mut self.page, &reference, &record);
                self.last_outcome = Some(NavOutcome::Document(reference));
            }
            Err(failure) => {
                self.state = NavState::Error;
                warn!(%reference, error = %failure, "query failed");
                self.renderer
                    .render_error(&mut self.page, &reference, &failure);
                self.last_outcome = Some(NavOutcome::Failed(reference));
            }
        }
        debug!(state = ?self.state, "navigation finished");
        self.state = NavState::Idle;
    }

    fn apply_statistics(&mut self, result: Result<Value, FetchFailure>) {
        let stats = match result {
            Ok(value) => serde_json::from_value::<StatisticsBlock>(value),
            Err(failure) => {
                warn!(reference = %self.statistics_ref, error = %failure, "statistics unavailable");
                return;
            }
        };
        match stats {
            Ok(stats) => self.renderer.render_stats(&mut self.page, &stats, false),
            Err(err) => warn!(error = %err, "malformed statistics"),
        }
    }
}
