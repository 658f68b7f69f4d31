use crate::query::{siret_query, SearchResponse};
use crate::{SearchConfig, SearchError, SiretDirectory};
use massval_schema::Siret;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use ureq::tls::{Certificate, PemItem, RootCerts, TlsConfig};

/// Elasticsearch-backed SIRET directory.
///
/// Issues one `POST {url}/{index}/_search` per lookup with a `match` query on
/// the `siret` field. An establishment is active when any hit carries
/// `etatAdministratifEtablissement = "A"`.
pub struct ElasticBackend {
    config: SearchConfig,
    agent: ureq::Agent,
}

impl ElasticBackend {
    pub fn new(config: SearchConfig) -> Result<Self, SearchError> {
        let mut builder = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)));
        if let Some(ref ca) = config.ca_cert {
            let certs = load_ca_bundle(ca)?;
            builder = builder.tls_config(
                TlsConfig::builder()
                    .root_certs(RootCerts::new_with_certs(&certs))
                    .build(),
            );
        }
        let agent = ureq::Agent::new_with_config(builder.build());
        Ok(Self { config, agent })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn do_search(&self, body: &[u8]) -> Result<Vec<u8>, SearchError> {
        let url = self.config.search_url();
        let mut req = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json");
        if let Some(ref key) = self.config.api_key {
            req = req.header("Authorization", &format!("ApiKey {key}"));
        }
        let resp = match req.send(body) {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(404)) => {
                return Err(SearchError::IndexNotFound(self.config.index.clone()));
            }
            Err(ureq::Error::StatusCode(code)) => {
                return Err(SearchError::Http(format!("HTTP {code} for {url}")));
            }
            Err(e) => {
                return Err(SearchError::Http(e.to_string()));
            }
        };

        let code = resp.status().as_u16();
        if code >= 400 {
            return Err(SearchError::Http(format!("HTTP {code} for {url}")));
        }

        let mut reader = resp.into_body().into_reader();
        let mut out = Vec::new();
        reader
            .read_to_end(&mut out)
            .map_err(|e| SearchError::Http(e.to_string()))?;
        Ok(out)
    }
}

impl SiretDirectory for ElasticBackend {
    fn is_active(&self, siret: &Siret) -> Result<bool, SearchError> {
        let body = serde_json::to_vec(&siret_query(siret))
            .map_err(|e| SearchError::Serialization(e.to_string()))?;
        tracing::debug!("POST {} siret={siret}", self.config.search_url());
        let response = SearchResponse::from_slice(&self.do_search(&body)?)?;
        let active = response.has_active_hit();
        tracing::debug!("siret {siret} active={active}");
        Ok(active)
    }

    fn describe(&self) -> String {
        format!("elasticsearch {} (index {})", self.config.url, self.config.index)
    }
}

fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate<'static>>, SearchError> {
    let pem = std::fs::read(path)?;
    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(&pem) {
        match item.map_err(|e| SearchError::Tls(format!("{}: {e}", path.display())))? {
            PemItem::Certificate(cert) => certs.push(cert.to_owned()),
            _ => tracing::warn!("ignoring non-certificate PEM item in {}", path.display()),
        }
    }
    if certs.is_empty() {
        return Err(SearchError::Tls(format!(
            "no certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}
