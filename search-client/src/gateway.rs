use crate::error::FetchFailure;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Asynchronous JSON source for every endpoint the client talks to.
///
/// Each call runs to completion on its own; nothing is cancelled or
/// de-duplicated here.
#[async_trait]
pub trait ServiceGateway: Send + Sync {
    async fn fetch_json(&self, reference: &str) -> Result<Value, FetchFailure>;
}

#[derive(Clone, Debug)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, reference: &str) -> String {
        format!("{}{reference}", self.base_url)
    }
}

#[async_trait]
impl ServiceGateway for HttpGateway {
    async fn fetch_json(&self, reference: &str) -> Result<Value, FetchFailure> {
        let url = self.url_for(reference);
        debug!(%url, "fetching");
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| FetchFailure::transport(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.ok();
            let reason = status.canonical_reason().unwrap_or("error");
            return Err(FetchFailure::http(status.as_u16(), reason, body));
        }
        resp.json::<Value>().await.map_err(|err| {
            FetchFailure::http(status.as_u16(), format!("parsererror: {err}"), None)
        })
    }
}
