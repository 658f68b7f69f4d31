use crate::catalog::{is_company_type, is_role};
use crate::cell::{grid_from_range, split_list};
use crate::types::{Siret, TabName};
use crate::validate::{email_is_valid, phone_number_is_valid};
use crate::SchemaError;
use calamine::{Data, Range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub const ETABLISSEMENTS_TAB: &str = "Établissements";
pub const ROLES_TAB: &str = "Rôles";

/// Column order of the `Établissements` tab, also used as the CSV header.
pub const ETABLISSEMENTS_FIELDS: &[&str] = &[
    "siret",
    "gerepId",
    "companyTypes",
    "givenName",
    "contactEmail",
    "contactPhone",
    "website",
];

/// Column order of the `Rôles` tab, also used as the CSV header.
pub const ROLE_FIELDS: &[&str] = &["siret", "email", "role"];

/// 1-based worksheet row where reading starts. That row holds the header.
pub const FIRST_ETAB_ROW: usize = 1;
pub const FIRST_ROLE_ROW: usize = 1;

pub const VALID_STR: &str = "Valide";
pub const ERROR_STR: &str = "Erreur";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Field,
    SiretMissingFromEtab,
}

/// A validation failure on one cell of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_number: usize,
    pub field_name: String,
    pub field_value: String,
    pub kind: ErrorKind,
    pub tab: TabName,
}

impl RowError {
    pub fn field(tab: &str, row_number: usize, field_name: &str, field_value: &str) -> Self {
        Self {
            row_number,
            field_name: field_name.to_owned(),
            field_value: field_value.to_owned(),
            kind: ErrorKind::Field,
            tab: TabName::from(tab),
        }
    }

    pub fn missing_siret(row_number: usize, siret: &Siret) -> Self {
        Self {
            row_number,
            field_name: "siret".to_owned(),
            field_value: siret.to_string(),
            kind: ErrorKind::SiretMissingFromEtab,
            tab: TabName::from(ROLES_TAB),
        }
    }

    /// Short technical form, e.g. `Siret error on row n°3 value=123`.
    pub fn as_str(&self) -> String {
        format!(
            "{} error on row n°{} value={}",
            capitalize(&self.field_name),
            self.row_number,
            self.field_value
        )
    }

    /// Message shown to the person who filled in the workbook.
    pub fn verbose(&self) -> &'static str {
        match self.kind {
            ErrorKind::Field => "Valeur incorrecte",
            ErrorKind::SiretMissingFromEtab => "Siret absent de l'onglet établissements",
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

/// An establishment SIRET that the company directory does not list as active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiretError {
    pub siret: Siret,
}

impl SiretError {
    pub fn verbose(&self) -> &'static str {
        "Ce siret est non diffusible"
    }
}

/// First letter uppercased, the rest lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn status_str(valid: bool) -> &'static str {
    if valid {
        VALID_STR
    } else {
        ERROR_STR
    }
}

/// Behaviour shared by the rows of both tabs.
pub trait Row: Sized {
    const TAB: &'static str;
    const FIELDS: &'static [&'static str];
    const FIRST_ROW: usize;

    /// Build a row from its cells. Returns `None` when every cell is blank.
    fn from_cells(index: usize, cells: &[String]) -> Option<Self>;

    fn index(&self) -> usize;
    fn siret(&self) -> &Siret;
    fn errors(&self) -> &[RowError];
    fn is_validated(&self) -> bool;

    /// Field values in column order, as written to CSV.
    fn csv_record(&self) -> Vec<String>;

    fn is_valid(&self) -> Result<bool, SchemaError> {
        if !self.is_validated() {
            return Err(SchemaError::NotValidated {
                tab: Self::TAB.to_owned(),
                row: self.index(),
            });
        }
        Ok(self.errors().is_empty())
    }

    /// Index, field values, then the status string.
    fn as_list(&self) -> Result<Vec<String>, SchemaError> {
        let status = status_str(self.is_valid()?);
        let mut out = Vec::with_capacity(Self::FIELDS.len() + 2);
        out.push(self.index().to_string());
        out.extend(self.csv_record());
        out.push(status.to_owned());
        Ok(out)
    }
}

fn cell(cells: &[String], i: usize) -> String {
    cells.get(i).cloned().unwrap_or_default()
}

/// One line of the `Établissements` tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtabRow {
    pub index: usize,
    pub siret: Siret,
    pub gerep_id: String,
    pub company_types: Vec<String>,
    pub given_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub website: String,
    #[serde(default)]
    pub errors: Vec<RowError>,
    #[serde(default)]
    pub validated: bool,
}

impl EtabRow {
    pub fn as_str(&self) -> String {
        format!("{} {} {}", self.siret, self.given_name, self.contact_email)
    }

    pub fn company_types_are_valid(&self) -> bool {
        self.company_types.iter().all(|t| is_company_type(t))
    }

    pub fn phone_number_is_valid(&self) -> bool {
        self.contact_phone.is_empty() || phone_number_is_valid(&self.contact_phone)
    }

    pub fn email_is_valid(&self) -> bool {
        self.contact_email.is_empty() || email_is_valid(&self.contact_email)
    }

    pub fn validate(&mut self) {
        self.errors.clear();
        if !self.siret.is_well_formed() {
            self.push_error("siret", &self.siret.to_string());
        }
        if !self.company_types_are_valid() {
            self.push_error("companyTypes", &self.company_types.join(","));
        }
        if !self.phone_number_is_valid() {
            self.push_error("contactPhone", &self.contact_phone.clone());
        }
        if !self.email_is_valid() {
            self.push_error("contactEmail", &self.contact_email.clone());
        }
        self.validated = true;
    }

    fn push_error(&mut self, field: &str, value: &str) {
        self.errors
            .push(RowError::field(Self::TAB, self.index, field, value));
    }
}

impl Row for EtabRow {
    const TAB: &'static str = ETABLISSEMENTS_TAB;
    const FIELDS: &'static [&'static str] = ETABLISSEMENTS_FIELDS;
    const FIRST_ROW: usize = FIRST_ETAB_ROW;

    fn from_cells(index: usize, cells: &[String]) -> Option<Self> {
        if cells.iter().all(String::is_empty) {
            return None;
        }
        Some(Self {
            index,
            siret: Siret::new(cell(cells, 0)),
            gerep_id: cell(cells, 1),
            company_types: split_list(&cell(cells, 2)),
            given_name: cell(cells, 3),
            contact_email: cell(cells, 4),
            contact_phone: cell(cells, 5),
            website: cell(cells, 6),
            errors: Vec::new(),
            validated: false,
        })
    }

    fn index(&self) -> usize {
        self.index
    }

    fn siret(&self) -> &Siret {
        &self.siret
    }

    fn errors(&self) -> &[RowError] {
        &self.errors
    }

    fn is_validated(&self) -> bool {
        self.validated
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.siret.to_string(),
            self.gerep_id.clone(),
            self.company_types.join(","),
            self.given_name.clone(),
            self.contact_email.clone(),
            self.contact_phone.clone(),
            self.website.clone(),
        ]
    }
}

/// One line of the `Rôles` tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRow {
    pub index: usize,
    pub siret: Siret,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub errors: Vec<RowError>,
    #[serde(default)]
    pub validated: bool,
}

impl RoleRow {
    pub fn as_str(&self) -> String {
        format!("{} {} {}", self.siret, self.role, self.email)
    }

    pub fn role_is_valid(&self) -> bool {
        is_role(&self.role)
    }

    pub fn siret_belongs_to(&self, etab_sirets: &BTreeSet<Siret>) -> bool {
        etab_sirets.contains(&self.siret)
    }

    /// Unlike the establishment contact email, the role email is mandatory.
    pub fn email_is_valid(&self) -> bool {
        email_is_valid(&self.email)
    }

    pub fn validate(&mut self, etab_sirets: &BTreeSet<Siret>) {
        self.errors.clear();
        if !self.role_is_valid() {
            self.errors
                .push(RowError::field(Self::TAB, self.index, "role", &self.role));
        }
        if !self.siret.is_well_formed() {
            self.errors.push(RowError::field(
                Self::TAB,
                self.index,
                "siret",
                &self.siret,
            ));
        }
        if !self.siret_belongs_to(etab_sirets) {
            self.errors
                .push(RowError::missing_siret(self.index, &self.siret));
        }
        if !self.email_is_valid() {
            self.errors
                .push(RowError::field(Self::TAB, self.index, "email", &self.email));
        }
        self.validated = true;
    }
}

impl Row for RoleRow {
    const TAB: &'static str = ROLES_TAB;
    const FIELDS: &'static [&'static str] = ROLE_FIELDS;
    const FIRST_ROW: usize = FIRST_ROLE_ROW;

    fn from_cells(index: usize, cells: &[String]) -> Option<Self> {
        if cells.iter().all(String::is_empty) {
            return None;
        }
        Some(Self {
            index,
            siret: Siret::new(cell(cells, 0)),
            email: cell(cells, 1),
            role: cell(cells, 2),
            errors: Vec::new(),
            validated: false,
        })
    }

    fn index(&self) -> usize {
        self.index
    }

    fn siret(&self) -> &Siret {
        &self.siret
    }

    fn errors(&self) -> &[RowError] {
        &self.errors
    }

    fn is_validated(&self) -> bool {
        self.validated
    }

    fn csv_record(&self) -> Vec<String> {
        vec![
            self.siret.to_string(),
            self.email.clone(),
            self.role.clone(),
        ]
    }
}

/// All data rows of one tab, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rows<R> {
    pub rows: Vec<R>,
    /// Set by `validate`: true when every row passed.
    pub is_valid: bool,
}

pub type EtabRows = Rows<EtabRow>;
pub type RoleRows = Rows<RoleRow>;

impl<R> Default for Rows<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            is_valid: false,
        }
    }
}

impl<R: Row> Rows<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            is_valid: false,
        }
    }

    /// Build rows from a grid whose first line is worksheet row 1.
    ///
    /// Reading starts at `R::FIRST_ROW`; that row is the header and is
    /// skipped. Rows are numbered from 1 at the first row read, and blank rows
    /// are dropped without shifting the numbering.
    pub fn from_grid(grid: &[Vec<String>]) -> Self {
        let rows = grid
            .iter()
            .skip(R::FIRST_ROW.saturating_sub(1))
            .enumerate()
            .skip(1)
            .filter_map(|(i, cells)| R::from_cells(i + 1, cells))
            .collect();
        Self::new(rows)
    }

    pub fn from_worksheet(range: &Range<Data>) -> Self {
        Self::from_grid(&grid_from_range(range, R::FIELDS.len()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    /// Distinct non-empty SIRETs, sorted.
    pub fn sirets(&self) -> BTreeSet<Siret> {
        self.rows
            .iter()
            .map(Row::siret)
            .filter(|s| !s.is_empty())
            .cloned()
            .collect()
    }

    /// Every row error, in row order.
    pub fn errors(&self) -> impl Iterator<Item = &RowError> {
        self.rows.iter().flat_map(Row::errors)
    }

    /// Render the tab as CSV: a header of field names then one record per row.
    pub fn to_csv(&self) -> Result<String, SchemaError> {
        crate::render::csv_document(R::FIELDS, self.rows.iter().map(Row::csv_record))
    }

    fn refresh_validity(&mut self) {
        self.is_valid = self.rows.iter().all(|r| r.errors().is_empty());
    }
}

impl<'a, R> IntoIterator for &'a Rows<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Rows<EtabRow> {
    pub fn validate(&mut self) {
        for row in &mut self.rows {
            row.validate();
        }
        self.refresh_validity();
    }
}

impl Rows<RoleRow> {
    pub fn validate(&mut self, etab_sirets: &BTreeSet<Siret>) {
        for row in &mut self.rows {
            row.validate(etab_sirets);
        }
        self.refresh_validity();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| (*c).to_owned()).collect())
            .collect()
    }

    fn etab_header() -> &'static [&'static str] {
        ETABLISSEMENTS_FIELDS
    }

    fn valid_etab(siret: &str) -> Vec<String> {
        vec![
            siret.to_owned(),
            "GEREP01".to_owned(),
            "PRODUCER,TRANSPORTER".to_owned(),
            "Acme".to_owned(),
            "contact@acme.fr".to_owned(),
            "01 23 45 67 89".to_owned(),
            "https://acme.fr".to_owned(),
        ]
    }

    #[test]
    fn from_grid_skips_header_and_blank_rows() {
        let mut g = grid(&[etab_header()]);
        g.push(valid_etab("12345678901234"));
        g.push(vec![String::new(); 7]);
        g.push(valid_etab("23456789012345"));

        let rows = EtabRows::from_grid(&g);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.rows[0].index, 2);
        // Blank row 3 still consumes its number.
        assert_eq!(rows.rows[1].index, 4);
        assert_eq!(
            rows.rows[0].company_types,
            vec!["PRODUCER", "TRANSPORTER"]
        );
    }

    #[test]
    fn from_grid_tolerates_short_rows() {
        let g = grid(&[&["siret", "email", "role"], &["12345678901234"]]);
        let rows = RoleRows::from_grid(&g);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows.rows[0].email, "");
        assert_eq!(rows.rows[0].role, "");
    }

    #[test]
    fn valid_etab_row_has_no_errors() {
        let mut row = EtabRow::from_cells(2, &valid_etab("12345678901234")).unwrap();
        row.validate();
        assert!(row.is_valid().unwrap());
        assert_eq!(row.as_list().unwrap().last().unwrap(), VALID_STR);
    }

    #[test]
    fn etab_optional_contact_fields_may_be_blank() {
        let cells = vec![
            "12345678901234".to_owned(),
            String::new(),
            String::new(),
            "Acme".to_owned(),
        ];
        let mut row = EtabRow::from_cells(2, &cells).unwrap();
        row.validate();
        assert!(row.is_valid().unwrap());
    }

    #[test]
    fn etab_errors_are_reported_in_field_order() {
        let cells = vec![
            "123".to_owned(),
            String::new(),
            "PRODUCER,ALIEN".to_owned(),
            "Acme".to_owned(),
            "not-an-email".to_owned(),
            "12".to_owned(),
            String::new(),
        ];
        let mut row = EtabRow::from_cells(5, &cells).unwrap();
        row.validate();

        let fields: Vec<&str> = row.errors.iter().map(|e| e.field_name.as_str()).collect();
        assert_eq!(
            fields,
            vec!["siret", "companyTypes", "contactPhone", "contactEmail"]
        );
        assert!(row.errors.iter().all(|e| e.row_number == 5));
        assert!(row.errors.iter().all(|e| e.tab == ETABLISSEMENTS_TAB));
        assert_eq!(row.errors[1].field_value, "PRODUCER,ALIEN");
        assert_eq!(row.as_list().unwrap().last().unwrap(), ERROR_STR);
    }

    #[test]
    fn validating_twice_does_not_duplicate_errors() {
        let mut row = EtabRow::from_cells(2, &valid_etab("1")).unwrap();
        row.validate();
        row.validate();
        assert_eq!(row.errors.len(), 1);
    }

    #[test]
    fn is_valid_before_validation_fails() {
        let row = EtabRow::from_cells(2, &valid_etab("12345678901234")).unwrap();
        let err = row.is_valid().unwrap_err();
        assert!(matches!(err, SchemaError::NotValidated { row: 2, .. }));
        assert!(row.as_list().is_err());
    }

    #[test]
    fn role_row_checks_membership_in_etab_tab() {
        let sirets: BTreeSet<Siret> = [Siret::from("12345678901234")].into_iter().collect();

        let mut ok = RoleRow::from_cells(
            2,
            &["12345678901234".into(), "jane@acme.fr".into(), "ADMIN".into()],
        )
        .unwrap();
        ok.validate(&sirets);
        assert!(ok.is_valid().unwrap());

        let mut orphan = RoleRow::from_cells(
            3,
            &["99999999999999".into(), "jane@acme.fr".into(), "MEMBER".into()],
        )
        .unwrap();
        orphan.validate(&sirets);
        assert_eq!(orphan.errors.len(), 1);
        assert_eq!(orphan.errors[0].kind, ErrorKind::SiretMissingFromEtab);
        assert_eq!(orphan.errors[0].tab, ROLES_TAB);
        assert_eq!(
            orphan.errors[0].verbose(),
            "Siret absent de l'onglet établissements"
        );
    }

    #[test]
    fn role_row_requires_email_and_known_role() {
        let sirets = BTreeSet::new();
        let mut row =
            RoleRow::from_cells(4, &["123".into(), String::new(), "OWNER".into()]).unwrap();
        row.validate(&sirets);

        let fields: Vec<(&str, ErrorKind)> = row
            .errors
            .iter()
            .map(|e| (e.field_name.as_str(), e.kind))
            .collect();
        assert_eq!(
            fields,
            vec![
                ("role", ErrorKind::Field),
                ("siret", ErrorKind::Field),
                ("siret", ErrorKind::SiretMissingFromEtab),
                ("email", ErrorKind::Field),
            ]
        );
    }

    #[test]
    fn row_error_as_str_capitalizes_field() {
        let err = RowError::field(ETABLISSEMENTS_TAB, 7, "companyTypes", "ALIEN");
        assert_eq!(err.as_str(), "Companytypes error on row n°7 value=ALIEN");
        assert_eq!(err.to_string(), err.as_str());
        assert_eq!(err.verbose(), "Valeur incorrecte");
    }

    #[test]
    fn siret_error_verbose() {
        let err = SiretError {
            siret: Siret::from("12345678901234"),
        };
        assert_eq!(err.verbose(), "Ce siret est non diffusible");
    }

    #[test]
    fn collections_track_validity_and_sirets() {
        let mut g = grid(&[etab_header()]);
        g.push(valid_etab("12345678901234"));
        g.push(valid_etab("12345678901234"));
        g.push(valid_etab("bad"));
        let mut etabs = EtabRows::from_grid(&g);
        etabs.validate();

        assert!(!etabs.is_valid);
        assert_eq!(etabs.errors().count(), 1);
        let sirets: Vec<String> = etabs.sirets().into_iter().map(Siret::into_inner).collect();
        assert_eq!(sirets, vec!["12345678901234", "bad"]);

        let mut roles = RoleRows::from_grid(&grid(&[
            ROLE_FIELDS,
            &["12345678901234", "jane@acme.fr", "ADMIN"],
        ]));
        roles.validate(&etabs.sirets());
        assert!(roles.is_valid);
    }

    #[test]
    fn empty_tab_is_valid_once_validated() {
        let mut etabs = EtabRows::from_grid(&grid(&[etab_header()]));
        assert!(!etabs.is_valid);
        etabs.validate();
        assert!(etabs.is_valid);
        assert!(etabs.is_empty());
    }

    #[test]
    fn as_str_forms() {
        let etab = EtabRow::from_cells(2, &valid_etab("12345678901234")).unwrap();
        assert_eq!(etab.as_str(), "12345678901234 Acme contact@acme.fr");
        let role = RoleRow::from_cells(
            2,
            &["12345678901234".into(), "jane@acme.fr".into(), "ADMIN".into()],
        )
        .unwrap();
        assert_eq!(role.as_str(), "12345678901234 ADMIN jane@acme.fr");
    }
}
