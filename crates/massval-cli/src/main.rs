mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::DirectoryOptions;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "massval",
    version,
    about = "Validate bulk company and role imports before they reach the database"
)]
struct Cli {
    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    /// Search config file (default: ~/.config/massval/search.json).
    #[arg(long, global = true)]
    search_config: Option<PathBuf>,

    /// Look SIRETs up in a JSON directory snapshot instead of the search index.
    #[arg(long, global = true)]
    directory: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate an import workbook and print every error found.
    Validate {
        /// Path to the .xlsx/.xls/.ods workbook.
        workbook: PathBuf,
        /// Also check that every establishment SIRET is active.
        #[arg(long, default_value_t = false)]
        check_sirets: bool,
    },
    /// Validate a workbook and, when valid, write etablissements.csv and roles.csv.
    Export {
        /// Path to the .xlsx/.xls/.ods workbook.
        workbook: PathBuf,
        /// Output directory for the CSV files.
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
        /// Also check that every establishment SIRET is active.
        #[arg(long, default_value_t = false)]
        check_sirets: bool,
    },
    /// Look one or more SIRETs up in the company directory.
    CheckSiret {
        #[arg(required = true)]
        sirets: Vec<String>,
    },
    /// Show or write the search endpoint configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check the search configuration and index reachability.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the current search configuration.
    Show,
    /// Write the search configuration file.
    Set {
        /// Elasticsearch base URL.
        #[arg(long)]
        url: String,
        /// Index holding the establishments.
        #[arg(long)]
        index: String,
        /// PEM bundle to trust instead of the system roots.
        #[arg(long)]
        ca_cert: Option<PathBuf>,
        /// Elasticsearch API key.
        #[arg(long)]
        api_key: Option<String>,
        /// Request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("MASSVAL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let opts = DirectoryOptions {
        search_config: cli.search_config,
        snapshot: cli.directory,
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Validate {
            workbook,
            check_sirets,
        } => commands::validate::run(&workbook, &opts, check_sirets, json_output),
        Commands::Export {
            workbook,
            out,
            check_sirets,
        } => commands::export::run(&workbook, &out, &opts, check_sirets, json_output),
        Commands::CheckSiret { sirets } => commands::check_siret::run(&sirets, &opts, json_output),
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&opts, json_output),
            ConfigAction::Set {
                url,
                index,
                ca_cert,
                api_key,
                timeout_secs,
            } => commands::config::set(
                &opts,
                commands::config::SetArgs {
                    url,
                    index,
                    ca_cert,
                    api_key,
                    timeout_secs,
                },
                json_output,
            ),
        },
        Commands::Doctor => commands::doctor::run(&opts, json_output),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(commands::exit_code_for(&msg))
        }
    }
}
