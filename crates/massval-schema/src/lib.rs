//! Row models, field validators, worksheet reading and CSV rendering for massval.
//!
//! This crate defines the schema layer of a bulk company import: the
//! `Établissements` and `Rôles` workbook tabs (`EtabRows`, `RoleRows`), the
//! per-field checks applied to each row (`RowError`), the closed catalogues of
//! company types and roles, and the CSV documents handed to the import tooling.

pub mod catalog;
pub mod cell;
pub mod render;
pub mod rows;
pub mod types;
pub mod validate;
pub mod workbook;

pub use catalog::{get_company_type, is_company_type, is_role, CompanyType, COMPANY_TYPES, ROLES};
pub use rows::{
    EtabRow, EtabRows, ErrorKind, Row, RoleRow, RoleRows, RowError, Rows, SiretError, ERROR_STR,
    ETABLISSEMENTS_FIELDS, ETABLISSEMENTS_TAB, ROLES_TAB, ROLE_FIELDS, VALID_STR,
};
pub use types::{Siret, TabName, SIRET_LEN};
pub use validate::{email_is_valid, phone_number_is_valid};
pub use workbook::{Workbook, REQUIRED_TABS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read workbook: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook has no '{0}' tab")]
    MissingSheet(String),
    #[error("row {row} of '{tab}' has not been validated yet")]
    NotValidated { tab: String, row: usize },
    #[error("failed to render CSV: {0}")]
    Csv(#[from] csv::Error),
}
