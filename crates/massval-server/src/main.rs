use clap::Parser;
use massval_search::http::ElasticBackend;
use massval_search::{MemoryDirectory, SearchConfig, SiretDirectory};
use massval_server::AppState;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "massval-server", about = "massval validation HTTP API")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value_t = 8322)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Search config file (default: ~/.config/massval/search.json).
    #[arg(long)]
    search_config: Option<PathBuf>,

    /// Serve SIRET lookups from a JSON directory snapshot.
    #[arg(long, conflicts_with = "search_config")]
    directory: Option<PathBuf>,
}

fn load_directory(cli: &Cli) -> Result<Option<Arc<dyn SiretDirectory>>, String> {
    if let Some(ref path) = cli.directory {
        let snapshot = MemoryDirectory::load(path).map_err(|e| e.to_string())?;
        info!("directory snapshot: {} ({} entries)", path.display(), snapshot.len());
        return Ok(Some(Arc::new(snapshot)));
    }
    let config = match cli.search_config {
        Some(ref path) => SearchConfig::load(path)
            .and_then(|c| c.with_env_overrides(|k| std::env::var(k).ok()))
            .map_err(|e| e.to_string())?,
        None => match SearchConfig::load_default() {
            Ok(c) => c,
            Err(e) => {
                warn!("SIRET lookups disabled: {e}");
                return Ok(None);
            }
        },
    };
    let backend = ElasticBackend::new(config).map_err(|e| e.to_string())?;
    info!("directory: {}", backend.describe());
    Ok(Some(Arc::new(backend)))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MASSVAL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let directory = match load_directory(&cli) {
        Ok(d) => d,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let addr = format!("{}:{}", cli.bind, cli.port);
    info!("starting massval-server on {addr}");

    let state = AppState::new(directory);
    match massval_server::run_server(&state, &addr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("failed to serve on {addr}: {e}");
            ExitCode::FAILURE
        }
    }
}
