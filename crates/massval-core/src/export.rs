use crate::{CoreError, Submission};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

pub const ETABLISSEMENTS_CSV: &str = "etablissements.csv";
pub const ROLES_CSV: &str = "roles.csv";

/// The two CSV documents of a valid submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocuments {
    pub etablissements: String,
    pub roles: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResult {
    pub etablissements_path: PathBuf,
    pub roles_path: PathBuf,
    pub etablissements_rows: usize,
    pub roles_rows: usize,
}

impl Submission {
    /// Render both tabs as CSV. Refuses to render an invalid submission.
    pub fn to_csv(&self) -> Result<ExportDocuments, CoreError> {
        if !self.is_valid() {
            return Err(CoreError::InvalidSubmission {
                errors: self.error_count(),
            });
        }
        Ok(ExportDocuments {
            etablissements: self.etablissements.to_csv()?,
            roles: self.roles.to_csv()?,
        })
    }

    /// Write `etablissements.csv` and `roles.csv` into `dir`, creating it if
    /// needed. Both files are staged before either is renamed into place; if
    /// the second rename fails the first file is rolled back, so the pair is
    /// never left mismatched.
    pub fn export(&self, dir: &Path) -> Result<ExportResult, CoreError> {
        let docs = self.to_csv()?;
        fs::create_dir_all(dir)?;

        let etablissements_path = dir.join(ETABLISSEMENTS_CSV);
        let roles_path = dir.join(ROLES_CSV);
        let previous = read_existing(&etablissements_path)?;

        let etablissements_tmp = stage(dir, docs.etablissements.as_bytes())?;
        let roles_tmp = stage(dir, docs.roles.as_bytes())?;

        etablissements_tmp
            .persist(&etablissements_path)
            .map_err(|e| CoreError::Io(e.error))?;
        if let Err(e) = roles_tmp.persist(&roles_path) {
            warn!(
                "failed to write {}, rolling back {}",
                roles_path.display(),
                etablissements_path.display()
            );
            restore(dir, &etablissements_path, previous.as_deref());
            return Err(CoreError::Io(e.error));
        }
        sync_dir(dir);

        info!(
            "exported {} establishments and {} roles to {}",
            self.etablissements.len(),
            self.roles.len(),
            dir.display()
        );
        Ok(ExportResult {
            etablissements_path,
            roles_path,
            etablissements_rows: self.etablissements.len(),
            roles_rows: self.roles.len(),
        })
    }
}

/// Write `content` to a synced temp file in `dir`. Dropping it removes it.
fn stage(dir: &Path, content: &[u8]) -> Result<NamedTempFile, CoreError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, CoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Put `path` back the way it was before the export: its previous content,
/// or no file at all.
fn restore(dir: &Path, path: &Path, previous: Option<&[u8]>) {
    let result = match previous {
        Some(bytes) => stage(dir, bytes)
            .and_then(|tmp| tmp.persist(path).map(drop).map_err(|e| CoreError::Io(e.error))),
        None => fs::remove_file(path).map_err(CoreError::from),
    };
    if let Err(e) = result {
        warn!("rollback of {} failed: {e}", path.display());
    }
    sync_dir(dir);
}

fn sync_dir(dir: &Path) {
    if let Ok(f) = fs::File::open(dir) {
        let _ = f.sync_all();
    }
}
