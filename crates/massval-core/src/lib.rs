//! Validation orchestration for massval.
//!
//! This crate ties together workbook reading, row validation, and SIRET
//! directory lookups into the `Validator`, the central API for checking a bulk
//! import workbook. It produces a `Submission` that can be rendered as a
//! serializable `ValidationReport` or, when valid, exported as the two CSV
//! files consumed by the import tooling.

pub mod export;
pub mod report;
pub mod validator;

pub use export::{ExportDocuments, ExportResult, ETABLISSEMENTS_CSV, ROLES_CSV};
pub use report::{ErrorReport, RowReport, SiretErrorReport, TabReport, ValidationReport};
pub use validator::{Submission, Validator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("workbook error: {0}")]
    Schema(#[from] massval_schema::SchemaError),
    #[error("search error: {0}")]
    Search(#[from] massval_search::SearchError),
    #[error("invalid submission: {errors} error(s) found, nothing exported")]
    InvalidSubmission { errors: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
