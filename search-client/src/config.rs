use crate::error::ConfigError;
use crate::query::QueryForm;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_TERMS_PATH: &str = "/var/terms";
pub const DEFAULT_COMMON_PATH: &str = "/var/common";
pub const DEFAULT_STATS_SUFFIX: &str = ";stats";
pub const DEFAULT_FORM_ACTION: &str = "/-/publ";
const DEFAULT_PULSE_MILLIS: u64 = 1000;

/// Client configuration, usually read from a `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Prefix prepended to every endpoint path.
    #[serde(default)]
    pub base_url: String,

    #[serde(default = "default_terms_path")]
    pub terms_path: String,

    #[serde(default = "default_common_path")]
    pub common_path: String,

    /// Appended to the query form action to address the statistics endpoint.
    #[serde(default = "default_stats_suffix")]
    pub stats_suffix: String,

    #[serde(default)]
    pub query_form: QueryForm,

    /// Half period of the progress pulse (fade out, then fade back in).
    #[serde(default = "default_pulse_millis")]
    pub pulse_millis: u64,

    /// Unset means requests may take as long as they take.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Facet controls that exist before any statistics arrive.
    #[serde(default)]
    pub static_facets: Vec<StaticFacet>,

    /// Target of the build trigger fired after a page is saved.
    #[serde(default)]
    pub build_trigger_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticFacet {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub options: Vec<StaticOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticOption {
    pub value: String,
    pub label: String,
}

fn default_terms_path() -> String {
    DEFAULT_TERMS_PATH.to_string()
}

fn default_common_path() -> String {
    DEFAULT_COMMON_PATH.to_string()
}

fn default_stats_suffix() -> String {
    DEFAULT_STATS_SUFFIX.to_string()
}

fn default_pulse_millis() -> u64 {
    DEFAULT_PULSE_MILLIS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            terms_path: default_terms_path(),
            common_path: default_common_path(),
            stats_suffix: default_stats_suffix(),
            query_form: QueryForm::default(),
            pulse_millis: default_pulse_millis(),
            request_timeout_secs: None,
            static_facets: Vec::new(),
            build_trigger_url: None,
        }
    }
}

impl ClientConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pulse_millis == 0 {
            return Err(ConfigError::Invalid("pulse_millis must be > 0".to_string()));
        }
        if self.query_form.action.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "query_form.action must not be empty".to_string(),
            ));
        }
        if let Some(facet) = self.static_facets.iter().find(|facet| facet.id.is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "static facet with label {:?} has no id",
                facet.label
            )));
        }
        Ok(())
    }

    pub fn pulse_period(&self) -> Duration {
        Duration::from_millis(self.pulse_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn statistics_reference(&self) -> String {
        self.query_form.statistics_reference(&self.stats_suffix)
    }
}
