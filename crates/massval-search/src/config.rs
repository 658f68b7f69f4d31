use crate::SearchError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_URL: &str = "MASSVAL_SEARCH_URL";
pub const ENV_INDEX: &str = "MASSVAL_SEARCH_INDEX";
pub const ENV_CA_CERT: &str = "MASSVAL_SEARCH_CA_CERT";
pub const ENV_API_KEY: &str = "MASSVAL_SEARCH_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchConfig {
    pub url: String,
    pub index: String,
    /// PEM bundle used as the only TLS trust root when set.
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl SearchConfig {
    pub fn new(url: &str, index: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_owned(),
            index: index.to_owned(),
            ca_cert: None,
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    #[must_use]
    pub fn with_ca_cert(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_cert = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.api_key = Some(key.to_owned());
        self
    }

    /// Load config from `~/.config/massval/search.json`, then apply
    /// environment overrides.
    pub fn load_default() -> Result<Self, SearchError> {
        let path = default_config_path()?;
        if path.exists() {
            let config = Self::load(&path)?;
            return config.with_env_overrides(|k| std::env::var(k).ok());
        }
        Self::from_env(|k| std::env::var(k).ok())
    }

    pub fn load(path: &Path) -> Result<Self, SearchError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| SearchError::Config(format!("invalid search config: {e}")))?;
        config.validated()
    }

    pub fn save(&self, path: &Path) -> Result<(), SearchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SearchError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a config purely from the environment. URL and index are required.
    pub fn from_env(get: impl Fn(&str) -> Option<String>) -> Result<Self, SearchError> {
        let url = get(ENV_URL)
            .ok_or_else(|| SearchError::Config(format!("no config file and {ENV_URL} not set")))?;
        let index = get(ENV_INDEX)
            .ok_or_else(|| SearchError::Config(format!("{ENV_URL} set but {ENV_INDEX} missing")))?;
        Self::new(&url, &index).with_env_overrides(get)
    }

    /// Environment variables win over file values.
    pub fn with_env_overrides(
        mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SearchError> {
        if let Some(url) = get(ENV_URL) {
            self.url = url;
        }
        if let Some(index) = get(ENV_INDEX) {
            self.index = index;
        }
        if let Some(ca) = get(ENV_CA_CERT) {
            self.ca_cert = Some(PathBuf::from(ca));
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        self.validated()
    }

    /// Normalize the URL and reject empty or zero values.
    pub fn validated(mut self) -> Result<Self, SearchError> {
        self.url = self.url.trim_end_matches('/').to_owned();
        if self.url.is_empty() {
            return Err(SearchError::Config("search url must not be empty".to_owned()));
        }
        if self.index.trim().is_empty() {
            return Err(SearchError::Config("search index must not be empty".to_owned()));
        }
        if self.timeout_secs == 0 {
            return Err(SearchError::Config("timeout_secs must be positive".to_owned()));
        }
        Ok(self)
    }

    /// `{url}/{index}/_search`
    pub fn search_url(&self) -> String {
        format!("{}/{}/_search", self.url, self.index)
    }
}

pub fn default_config_path() -> Result<PathBuf, SearchError> {
    let home = std::env::var("HOME").map_err(|_| SearchError::Config("HOME not set".to_owned()))?;
    Ok(PathBuf::from(home).join(".config/massval/search.json"))
}
