use crate::{CoreError, Submission};
use massval_schema::{ErrorKind, Row, RowError, Rows, SiretError};
use serde::{Deserialize, Serialize};

/// Serializable outcome of a validation, shared by the CLI `--json` output and
/// the HTTP API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    /// RFC 3339 timestamp.
    pub generated_at: String,
    pub sirets_checked: bool,
    pub error_count: usize,
    pub etablissements: TabReport,
    pub roles: TabReport,
    pub siret_errors: Vec<SiretErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabReport {
    pub tab: String,
    pub fields: Vec<String>,
    pub is_valid: bool,
    pub row_count: usize,
    pub rows: Vec<RowReport>,
    pub errors: Vec<ErrorReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowReport {
    pub index: usize,
    pub values: Vec<String>,
    /// `Valide` or `Erreur`.
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub row_number: usize,
    pub field_name: String,
    pub field_value: String,
    pub kind: ErrorKind,
    pub summary: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiretErrorReport {
    pub siret: String,
    pub message: String,
}

impl From<&RowError> for ErrorReport {
    fn from(e: &RowError) -> Self {
        Self {
            row_number: e.row_number,
            field_name: e.field_name.clone(),
            field_value: e.field_value.clone(),
            kind: e.kind,
            summary: e.as_str(),
            message: e.verbose().to_owned(),
        }
    }
}

impl From<&SiretError> for SiretErrorReport {
    fn from(e: &SiretError) -> Self {
        Self {
            siret: e.siret.to_string(),
            message: e.verbose().to_owned(),
        }
    }
}

impl TabReport {
    pub fn from_rows<R: Row>(rows: &Rows<R>) -> Result<Self, CoreError> {
        let mut reports = Vec::with_capacity(rows.len());
        for row in rows {
            let mut list = row.as_list()?;
            let status = list.pop().unwrap_or_default();
            reports.push(RowReport {
                index: row.index(),
                values: list.split_off(1),
                status,
            });
        }
        Ok(Self {
            tab: R::TAB.to_owned(),
            fields: R::FIELDS.iter().map(|f| (*f).to_owned()).collect(),
            is_valid: rows.is_valid,
            row_count: rows.len(),
            rows: reports,
            errors: rows.errors().map(ErrorReport::from).collect(),
        })
    }
}

impl ValidationReport {
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Submission {
    /// Build the report. Fails only if a row was never validated, which a
    /// `Submission` built by the `Validator` rules out.
    pub fn report(&self) -> Result<ValidationReport, CoreError> {
        Ok(ValidationReport {
            is_valid: self.is_valid(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            sirets_checked: self.sirets_checked,
            error_count: self.error_count(),
            etablissements: TabReport::from_rows(&self.etablissements)?,
            roles: TabReport::from_rows(&self.roles)?,
            siret_errors: self.siret_errors.iter().map(SiretErrorReport::from).collect(),
        })
    }
}
