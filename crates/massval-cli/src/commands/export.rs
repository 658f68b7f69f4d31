use super::validate::{print_report, validate_workbook};
use super::{json_pretty, make_validator, DirectoryOptions, EXIT_INVALID, EXIT_SUCCESS};
use std::path::Path;

pub fn run(
    workbook: &Path,
    out: &Path,
    opts: &DirectoryOptions,
    check_sirets: bool,
    json: bool,
) -> Result<u8, String> {
    let validator = make_validator(opts, check_sirets)?;
    let submission = validate_workbook(&validator, workbook, json)?;

    if !submission.is_valid() {
        let report = submission.report().map_err(|e| e.to_string())?;
        print_report(&report, json)?;
        if !json {
            eprintln!("nothing exported");
        }
        return Ok(EXIT_INVALID);
    }

    let result = submission.export(out).map_err(|e| e.to_string())?;

    if json {
        let payload = serde_json::json!({
            "etablissements": {
                "path": result.etablissements_path,
                "rows": result.etablissements_rows,
            },
            "roles": {
                "path": result.roles_path,
                "rows": result.roles_rows,
            },
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "wrote {} ({} establishments)",
            result.etablissements_path.display(),
            result.etablissements_rows
        );
        println!(
            "wrote {} ({} roles)",
            result.roles_path.display(),
            result.roles_rows
        );
    }
    Ok(EXIT_SUCCESS)
}
