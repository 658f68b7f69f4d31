use crate::CoreError;
use massval_schema::{EtabRows, RoleRows, Siret, SiretError, Workbook};
use massval_search::SiretDirectory;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Central entry point for validating a bulk import.
///
/// Without a directory only the workbook content is checked. With one, every
/// well-formed establishment SIRET is also looked up and must be active.
#[derive(Clone, Default)]
pub struct Validator {
    directory: Option<Arc<dyn SiretDirectory>>,
}

/// A validated workbook: both tabs with their row errors, plus the SIRETs the
/// directory rejected.
#[derive(Debug, Clone)]
pub struct Submission {
    pub etablissements: EtabRows,
    pub roles: RoleRows,
    pub siret_errors: Vec<SiretError>,
    /// Whether establishment SIRETs were looked up in a directory.
    pub sirets_checked: bool,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(directory: Arc<dyn SiretDirectory>) -> Self {
        Self {
            directory: Some(directory),
        }
    }

    pub fn has_directory(&self) -> bool {
        self.directory.is_some()
    }

    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<Submission, CoreError> {
        let path = path.as_ref();
        let mut workbook = Workbook::open(path)?;
        let etabs = workbook.etablissements()?;
        let roles = workbook.roles()?;
        info!(
            "validating {} ({} establishments, {} roles)",
            path.display(),
            etabs.len(),
            roles.len()
        );
        self.validate_rows(etabs, roles)
    }

    pub fn validate_bytes(&self, data: Vec<u8>) -> Result<Submission, CoreError> {
        let mut workbook = Workbook::from_bytes(data)?;
        let etabs = workbook.etablissements()?;
        let roles = workbook.roles()?;
        self.validate_rows(etabs, roles)
    }

    /// Validate establishments, then roles against the establishment SIRETs,
    /// then look establishment SIRETs up in the directory if one is set.
    pub fn validate_rows(
        &self,
        mut etablissements: EtabRows,
        mut roles: RoleRows,
    ) -> Result<Submission, CoreError> {
        etablissements.validate();
        let etab_sirets = etablissements.sirets();
        roles.validate(&etab_sirets);

        let siret_errors = match self.directory {
            Some(ref directory) => check_sirets(directory.as_ref(), &etab_sirets)?,
            None => Vec::new(),
        };

        let submission = Submission {
            etablissements,
            roles,
            siret_errors,
            sirets_checked: self.directory.is_some(),
        };
        info!(
            "validation finished: {} row error(s), {} SIRET error(s)",
            submission.row_error_count(),
            submission.siret_errors.len()
        );
        Ok(submission)
    }
}

/// Look up every well-formed SIRET. Malformed ones already carry a row error.
fn check_sirets<'a>(
    directory: &dyn SiretDirectory,
    sirets: impl IntoIterator<Item = &'a Siret>,
) -> Result<Vec<SiretError>, CoreError> {
    debug!("checking SIRETs against {}", directory.describe());
    let mut errors = Vec::new();
    for siret in sirets {
        if !siret.is_well_formed() {
            continue;
        }
        if !directory.is_active(siret)? {
            debug!("siret {siret} is not active");
            errors.push(SiretError {
                siret: siret.clone(),
            });
        }
    }
    Ok(errors)
}

impl Submission {
    pub fn is_valid(&self) -> bool {
        self.etablissements.is_valid && self.roles.is_valid && self.siret_errors.is_empty()
    }

    pub fn row_error_count(&self) -> usize {
        self.etablissements.errors().count() + self.roles.errors().count()
    }

    /// Row errors plus SIRET errors.
    pub fn error_count(&self) -> usize {
        self.row_error_count() + self.siret_errors.len()
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field(
                "directory",
                &self.directory.as_ref().map(|d| d.describe()),
            )
            .finish()
    }
}
