//! Faceted search client for a ferenda legal-document site.
//!
//! The client keeps a page model in step with a location hash:
//!
//! ```text
//! NavEvent ──> NavigationController ──> ServiceGateway (JSON over HTTP)
//!                      │                       │
//!                      │<──── completion ──────┘
//!                      ├─> Renderer ──> Templates ──> Page panes
//!                      └─> FacetPanel <── StatisticsBlock + Vocabulary
//! ```
//!
//! [`NavigationController::bootstrap`] loads the shared vocabulary, requests
//! the global facet statistics and processes the initial hash.

pub mod config;
pub mod error;
pub mod facets;
pub mod gateway;
pub mod navigation;
pub mod page;
pub mod progress;
pub mod proto;
pub mod query;
pub mod render;
pub mod save_hook;
pub mod templates;
pub mod vocab;

pub use config::ClientConfig;
pub use error::ClientError;
pub use error::FetchFailure;
pub use error::Result;
pub use gateway::HttpGateway;
pub use gateway::ServiceGateway;
pub use navigation::NavEvent;
pub use navigation::NavOutcome;
pub use navigation::NavState;
pub use navigation::NavigationController;
pub use page::Page;
pub use query::Location;
pub use query::QueryForm;
pub use query::QueryReference;
pub use save_hook::BuildTrigger;
pub use save_hook::SaveEvent;
pub use templates::Templates;
pub use templates::TextTemplates;
pub use vocab::Vocabulary;
