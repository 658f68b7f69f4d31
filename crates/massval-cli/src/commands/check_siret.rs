use super::{
    colorize_status, json_pretty, make_directory, spin_fail, spin_ok, spinner, DirectoryOptions,
    EXIT_INVALID, EXIT_SUCCESS,
};
use massval_schema::Siret;
use massval_search::SiretDirectory;

pub fn run(sirets: &[String], opts: &DirectoryOptions, json: bool) -> Result<u8, String> {
    let directory = make_directory(opts)?;
    tracing::debug!("checking {} SIRET(s) against {}", sirets.len(), directory.describe());

    let results = if json {
        lookup_all(directory.as_ref(), sirets)?
    } else {
        let pb = spinner(&format!("checking {} SIRET(s)…", sirets.len()));
        let results = lookup_all(directory.as_ref(), sirets).map_err(|e| {
            spin_fail(&pb, "lookup failed");
            e
        })?;
        spin_ok(&pb, "lookup complete");
        results
    };

    let all_active = results.iter().all(|(_, status)| *status == "active");

    if json {
        let payload: Vec<_> = results
            .iter()
            .map(|(siret, status)| {
                serde_json::json!({
                    "siret": siret,
                    "status": status,
                    "active": *status == "active",
                })
            })
            .collect();
        println!("{}", json_pretty(&payload)?);
    } else {
        for (siret, status) in &results {
            println!("{siret}  {}", colorize_status(status));
        }
    }
    Ok(if all_active { EXIT_SUCCESS } else { EXIT_INVALID })
}

fn lookup_all(
    directory: &dyn SiretDirectory,
    sirets: &[String],
) -> Result<Vec<(Siret, &'static str)>, String> {
    let mut results = Vec::with_capacity(sirets.len());
    for raw in sirets {
        let siret = Siret::from(raw.trim());
        let status = if !siret.is_well_formed() {
            "malformed"
        } else if directory.is_active(&siret).map_err(|e| e.to_string())? {
            "active"
        } else {
            "inactive"
        };
        results.push((siret, status));
    }
    Ok(results)
}
