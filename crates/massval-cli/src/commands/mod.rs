pub mod check_siret;
pub mod completions;
pub mod config;
pub mod doctor;
pub mod export;
pub mod man_pages;
pub mod validate;

use indicatif::{ProgressBar, ProgressStyle};
use massval_core::Validator;
use massval_search::http::ElasticBackend;
use massval_search::{MemoryDirectory, SearchConfig, SiretDirectory};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INVALID: u8 = 2;
pub const EXIT_WORKBOOK_ERROR: u8 = 3;
pub const EXIT_SEARCH_ERROR: u8 = 4;

/// Where SIRET lookups go: an offline snapshot, an explicit config file, or
/// the default config file plus environment.
#[derive(Debug, Clone, Default)]
pub struct DirectoryOptions {
    pub search_config: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_status(status: &str) -> String {
    use console::Style;
    match status {
        massval_schema::VALID_STR | "active" => Style::new().green().apply_to(status).to_string(),
        massval_schema::ERROR_STR | "inactive" => {
            Style::new().red().bold().apply_to(status).to_string()
        }
        "malformed" => Style::new().yellow().apply_to(status).to_string(),
        other => other.to_owned(),
    }
}

/// Map an error message to a process exit code by its prefix.
pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("workbook error:") || msg.starts_with("failed to read workbook") {
        EXIT_WORKBOOK_ERROR
    } else if msg.starts_with("search") {
        EXIT_SEARCH_ERROR
    } else {
        EXIT_FAILURE
    }
}

pub fn config_path(opts: &DirectoryOptions) -> Result<PathBuf, String> {
    match opts.search_config {
        Some(ref p) => Ok(p.clone()),
        None => massval_search::config::default_config_path().map_err(|e| e.to_string()),
    }
}

pub fn load_search_config(opts: &DirectoryOptions) -> Result<SearchConfig, String> {
    let config = match opts.search_config {
        Some(ref path) => SearchConfig::load(path)
            .and_then(|c| c.with_env_overrides(|k| std::env::var(k).ok())),
        None => SearchConfig::load_default(),
    };
    config.map_err(|e| e.to_string())
}

pub fn make_directory(opts: &DirectoryOptions) -> Result<Arc<dyn SiretDirectory>, String> {
    if let Some(ref snapshot) = opts.snapshot {
        let directory = MemoryDirectory::load(snapshot).map_err(|e| e.to_string())?;
        tracing::debug!("using directory snapshot {}", snapshot.display());
        return Ok(Arc::new(directory));
    }
    let config = load_search_config(opts)?;
    let backend = ElasticBackend::new(config).map_err(|e| e.to_string())?;
    Ok(Arc::new(backend))
}

pub fn make_validator(opts: &DirectoryOptions, check_sirets: bool) -> Result<Validator, String> {
    if check_sirets {
        Ok(Validator::with_directory(make_directory(opts)?))
    } else {
        Ok(Validator::new())
    }
}
