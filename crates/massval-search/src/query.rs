use crate::{SearchError, ACTIVE};
use massval_schema::Siret;
use serde::Deserialize;
use serde_json::{json, Value};

/// Elasticsearch body matching documents whose `siret` field equals `siret`.
pub fn siret_query(siret: &Siret) -> Value {
    json!({
        "query": {
            "bool": {
                "must": [
                    { "match": { "siret": siret.as_str() } }
                ]
            }
        }
    })
}

/// The subset of a `_search` response we read.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Option<Hits>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Hits {
    #[serde(default)]
    pub hits: Vec<Hit>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Hit {
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

impl Hit {
    fn administrative_state(&self) -> Option<&str> {
        self.source
            .as_ref()?
            .get("etatAdministratifEtablissement")?
            .as_str()
    }
}

impl SearchResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self, SearchError> {
        serde_json::from_slice(body)
            .map_err(|e| SearchError::Serialization(format!("invalid search response: {e}")))
    }

    /// True when at least one hit is an active establishment.
    pub fn has_active_hit(&self) -> bool {
        self.hits
            .as_ref()
            .is_some_and(|h| h.hits.iter().any(|hit| hit.administrative_state() == Some(ACTIVE)))
    }
}

/// Parse a raw `_search` body and report whether it holds an active hit.
pub fn is_active_response(body: &[u8]) -> Result<bool, SearchError> {
    Ok(SearchResponse::from_slice(body)?.has_active_hit())
}
