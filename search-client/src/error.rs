use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request for {reference} failed: {failure}")]
    Fetch {
        reference: String,
        failure: FetchFailure,
    },

    #[error("unexpected payload from {reference}: {source}")]
    Payload {
        reference: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// What the gateway knows about a request that did not produce a JSON body.
///
/// This is handed verbatim to the error template, so it serializes.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{status_text}")]
pub struct FetchFailure {
    pub status: Option<u16>,
    pub status_text: String,
    pub response_text: Option<String>,
}

impl FetchFailure {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            status_text: message.into(),
            response_text: None,
        }
    }

    pub fn http(status: u16, status_text: impl Into<String>, body: Option<String>) -> Self {
        Self {
            status: Some(status),
            status_text: status_text.into(),
            response_text: body.filter(|text| !text.is_empty()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("missing field `{0}` in template data")]
    MissingField(&'static str),
}
