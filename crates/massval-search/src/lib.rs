//! SIRET directory lookups for massval.
//!
//! An establishment may only be imported when the national company directory
//! lists its SIRET as administratively active. This crate provides the
//! [`SiretDirectory`] abstraction, an Elasticsearch-backed implementation
//! ([`http::ElasticBackend`]), an in-memory one for tests and offline runs
//! ([`MemoryDirectory`]), and the configuration for the search endpoint.

pub mod config;
pub mod http;
pub mod memory;
pub mod query;

pub use config::SearchConfig;
pub use memory::MemoryDirectory;
pub use query::{is_active_response, siret_query, SearchResponse};

use massval_schema::Siret;
use thiserror::Error;

/// Value of `etatAdministratifEtablissement` for an active establishment.
pub const ACTIVE: &str = "A";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("search HTTP error: {0}")]
    Http(String),
    #[error("search index not found: {0}")]
    IndexNotFound(String),
    #[error("search serialization error: {0}")]
    Serialization(String),
    #[error("search config error: {0}")]
    Config(String),
    #[error("search TLS error: {0}")]
    Tls(String),
}

/// A source of truth for establishment SIRETs.
pub trait SiretDirectory: Send + Sync {
    /// True when the directory knows the SIRET and lists it as active.
    fn is_active(&self, siret: &Siret) -> Result<bool, SearchError>;

    /// Short human-readable description, used in logs and diagnostics.
    fn describe(&self) -> String;
}
