use super::{config_path, json_pretty, DirectoryOptions, EXIT_SUCCESS};
use massval_search::SearchConfig;
use std::path::PathBuf;

pub fn show(opts: &DirectoryOptions, json: bool) -> Result<u8, String> {
    let path = config_path(opts)?;
    if !path.exists() {
        return Err(format!(
            "search config error: no config at {} (use 'massval config set')",
            path.display()
        ));
    }
    let config = SearchConfig::load(&path).map_err(|e| e.to_string())?;

    if json {
        let mut value = serde_json::to_value(&config).map_err(|e| e.to_string())?;
        if config.api_key.is_some() {
            value["api_key"] = serde_json::Value::from(MASKED);
        }
        value["path"] = serde_json::Value::from(path.display().to_string());
        println!("{}", json_pretty(&value)?);
    } else {
        println!("config:   {}", path.display());
        println!("url:      {}", config.url);
        println!("index:    {}", config.index);
        println!(
            "ca_cert:  {}",
            config
                .ca_cert
                .as_ref()
                .map_or_else(|| "(system roots)".to_owned(), |p| p.display().to_string())
        );
        println!(
            "api_key:  {}",
            if config.api_key.is_some() { MASKED } else { "(none)" }
        );
        println!("timeout:  {}s", config.timeout_secs);
    }
    Ok(EXIT_SUCCESS)
}

pub struct SetArgs {
    pub url: String,
    pub index: String,
    pub ca_cert: Option<PathBuf>,
    pub api_key: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn set(opts: &DirectoryOptions, args: SetArgs, json: bool) -> Result<u8, String> {
    let path = config_path(opts)?;
    let mut config = SearchConfig::new(&args.url, &args.index);
    config.ca_cert = args.ca_cert;
    config.api_key = args.api_key;
    if let Some(secs) = args.timeout_secs {
        config.timeout_secs = secs;
    }
    let config = config.validated().map_err(|e| e.to_string())?;
    config.save(&path).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "path": path,
            "url": config.url,
            "index": config.index,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("search config written to {}", path.display());
    }
    Ok(EXIT_SUCCESS)
}

const MASKED: &str = "********";
