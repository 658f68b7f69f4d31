use super::{config_path, load_search_config, DirectoryOptions, EXIT_FAILURE, EXIT_SUCCESS};
use massval_schema::Siret;
use massval_search::http::ElasticBackend;
use massval_search::{MemoryDirectory, SearchError, SiretDirectory};

/// A SIRET that is never issued; used to probe the index without caring about
/// the answer.
const PROBE_SIRET: &str = "00000000000000";

pub fn run(opts: &DirectoryOptions, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();
    let mut all_pass = true;

    if let Some(ref snapshot) = opts.snapshot {
        match MemoryDirectory::load(snapshot) {
            Ok(dir) => checks.push(Check::pass(
                "directory_snapshot",
                &format!("Snapshot {} loaded ({} entries)", snapshot.display(), dir.len()),
            )),
            Err(e) => {
                all_pass = false;
                checks.push(Check::fail(
                    "directory_snapshot",
                    &format!("Cannot load snapshot {}: {e}", snapshot.display()),
                ));
            }
        }
        return print_results(&checks, all_pass, json_output);
    }

    match config_path(opts) {
        Ok(path) if path.exists() => checks.push(Check::pass(
            "config_file",
            &format!("Config file {}", path.display()),
        )),
        Ok(path) => checks.push(Check::info(
            "config_file",
            &format!(
                "No config file at {} (falling back to environment)",
                path.display()
            ),
        )),
        Err(e) => checks.push(Check::warn("config_file", &e)),
    }

    match load_search_config(opts) {
        Ok(config) => {
            checks.push(Check::pass(
                "search_config",
                &format!("Search endpoint {} (index {})", config.url, config.index),
            ));
            match ElasticBackend::new(config) {
                Ok(backend) => check_index(&backend, &mut checks, &mut all_pass),
                Err(e) => {
                    all_pass = false;
                    checks.push(Check::fail("search_client", &e.to_string()));
                }
            }
        }
        Err(e) => {
            all_pass = false;
            checks.push(Check::fail("search_config", &e));
        }
    }

    print_results(&checks, all_pass, json_output)
}

fn check_index(directory: &dyn SiretDirectory, checks: &mut Vec<Check>, all_pass: &mut bool) {
    match directory.is_active(&Siret::from(PROBE_SIRET)) {
        Ok(_) => checks.push(Check::pass("search_index", "Search index reachable")),
        Err(SearchError::IndexNotFound(index)) => {
            *all_pass = false;
            checks.push(Check::fail(
                "search_index",
                &format!("Index '{index}' does not exist"),
            ));
        }
        Err(e) => {
            *all_pass = false;
            checks.push(Check::fail(
                "search_index",
                &format!("Search index unreachable: {e}"),
            ));
        }
    }
}

fn print_results(checks: &[Check], all_pass: bool, json_output: bool) -> Result<u8, String> {
    if json_output {
        let json = serde_json::json!({
            "healthy": all_pass,
            "checks": checks.iter().map(|c| serde_json::json!({
                "name": c.name,
                "status": c.status,
                "message": c.message,
            })).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).map_err(|e| e.to_string())?
        );
    } else {
        println!("massval doctor\n");
        for check in checks {
            let icon = match check.status {
                "pass" => "✓",
                "fail" => "✗",
                "warn" => "⚠",
                _ => "ℹ",
            };
            println!("  {icon} {}", check.message);
        }
        println!();
        if all_pass {
            println!("All checks passed.");
        } else {
            println!("Some checks failed. See above for details.");
        }
    }
    Ok(if all_pass { EXIT_SUCCESS } else { EXIT_FAILURE })
}

struct Check {
    name: &'static str,
    status: &'static str,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: &'static str, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, "pass", message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, "fail", message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, "warn", message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, "info", message)
    }
}
