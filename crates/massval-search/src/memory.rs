use crate::{SearchError, SiretDirectory, ACTIVE};
use massval_schema::Siret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// An in-memory SIRET directory: maps a SIRET to its administrative state
/// (`"A"` active, `"F"` closed).
///
/// Serialized as `{"entries": {"<siret>": "<state>"}}` so that a snapshot of
/// the directory can be kept next to a workbook for offline validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryDirectory {
    pub entries: BTreeMap<Siret, String>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, SearchError> {
        serde_json::from_slice(data)
            .map_err(|e| SearchError::Serialization(format!("invalid directory snapshot: {e}")))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SearchError> {
        serde_json::to_vec_pretty(self).map_err(|e| SearchError::Serialization(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Insert or update the state of a SIRET.
    pub fn insert(&mut self, siret: impl Into<Siret>, state: &str) {
        self.entries.insert(siret.into(), state.to_owned());
    }

    #[must_use]
    pub fn with_active(mut self, siret: &str) -> Self {
        self.insert(siret, ACTIVE);
        self
    }

    pub fn state_of(&self, siret: &Siret) -> Option<&str> {
        self.entries.get(siret).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SiretDirectory for MemoryDirectory {
    fn is_active(&self, siret: &Siret) -> Result<bool, SearchError> {
        Ok(self.state_of(siret) == Some(ACTIVE))
    }

    fn describe(&self) -> String {
        format!("in-memory directory ({} entries)", self.entries.len())
    }
}
