use crate::rows::{EtabRows, RoleRows, Row, Rows, ETABLISSEMENTS_TAB, ROLES_TAB};
use crate::SchemaError;
use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tracing::debug;

/// A spreadsheet holding the `Établissements` and `Rôles` tabs.
///
/// Any format calamine understands is accepted (xlsx, xlsm, xls, ods).
pub struct Workbook<RS> {
    sheets: Sheets<RS>,
}

impl Workbook<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SchemaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        debug!("opening workbook {}", path.display());
        Ok(Self {
            sheets: open_workbook_auto(path)?,
        })
    }
}

impl Workbook<Cursor<Vec<u8>>> {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, SchemaError> {
        debug!("reading workbook from {} bytes", data.len());
        Ok(Self {
            sheets: open_workbook_auto_from_rs(Cursor::new(data))?,
        })
    }
}

impl<RS> Workbook<RS>
where
    RS: std::io::Read + std::io::Seek,
{
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    /// Resolve a tab by exact name, falling back to a case-insensitive match.
    fn resolve_sheet(&self, wanted: &str) -> Result<String, SchemaError> {
        let names = self.sheet_names();
        if names.iter().any(|n| n == wanted) {
            return Ok(wanted.to_owned());
        }
        let lowered = wanted.to_lowercase();
        names
            .into_iter()
            .find(|n| n.trim().to_lowercase() == lowered)
            .ok_or_else(|| SchemaError::MissingSheet(wanted.to_owned()))
    }

    fn range(&mut self, wanted: &str) -> Result<Range<Data>, SchemaError> {
        let name = self.resolve_sheet(wanted)?;
        Ok(self.sheets.worksheet_range(&name)?)
    }

    fn rows<R: Row>(&mut self) -> Result<Rows<R>, SchemaError> {
        let range = self.range(R::TAB)?;
        let rows = Rows::<R>::from_worksheet(&range);
        debug!("read {} rows from '{}'", rows.len(), R::TAB);
        Ok(rows)
    }

    pub fn etablissements(&mut self) -> Result<EtabRows, SchemaError> {
        self.rows()
    }

    pub fn roles(&mut self) -> Result<RoleRows, SchemaError> {
        self.rows()
    }
}

/// Tab names a workbook template must contain, in order.
pub const REQUIRED_TABS: &[&str] = &[ETABLISSEMENTS_TAB, ROLES_TAB];
