//! Outbound build trigger fired after a wiki page is saved.
//!
//! Failures never propagate to the saving side: they are logged and the
//! caller carries on.

use reqwest::Client;
use tracing::debug;
use tracing::error;
use tracing::info;

pub const DEFAULT_BUILD_TRIGGER_URL: &str =
    "http://localhost/devel/build?repo=mediawiki&action=update&stream=true&basefile=";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveEvent {
    pub title: String,
    pub is_minor: bool,
}

impl SaveEvent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_minor: false,
        }
    }

    pub fn minor(mut self) -> Self {
        self.is_minor = true;
        self
    }
}

#[derive(Clone, Debug)]
pub struct BuildTrigger {
    http: Client,
    /// Everything up to the value of the `basefile` parameter.
    endpoint: String,
}

impl Default for BuildTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_BUILD_TRIGGER_URL)
    }
}

impl BuildTrigger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn url_for(&self, title: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
        format!("{}{encoded}", self.endpoint)
    }

    /// Minor edits do not rebuild anything. Returns whether a request was
    /// delivered and answered with a success status.
    pub async fn on_save(&self, event: &SaveEvent) -> bool {
        if event.is_minor {
            debug!(title = %event.title, "minor edit; build not triggered");
            return false;
        }
        self.notify(&event.title).await
    }

    pub async fn notify(&self, title: &str) -> bool {
        let url = self.url_for(title);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(%url, error = %err, "build trigger request failed");
                return false;
            }
        };
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%url, %status, %body, "build trigger rejected");
            return false;
        }
        info!(%title, "build triggered");
        true
    }
}
