use super::{
    colorize_status, json_pretty, make_validator, spin_fail, spin_ok, spinner, DirectoryOptions,
    EXIT_INVALID, EXIT_SUCCESS,
};
use massval_core::{Submission, TabReport, ValidationReport, Validator};
use std::path::Path;

pub fn run(
    workbook: &Path,
    opts: &DirectoryOptions,
    check_sirets: bool,
    json: bool,
) -> Result<u8, String> {
    let validator = make_validator(opts, check_sirets)?;
    let submission = validate_workbook(&validator, workbook, json)?;
    let report = submission.report().map_err(|e| e.to_string())?;
    print_report(&report, json)?;
    Ok(if report.is_valid {
        EXIT_SUCCESS
    } else {
        EXIT_INVALID
    })
}

/// Run the validator, with a spinner when lookups may be slow.
pub fn validate_workbook(
    validator: &Validator,
    workbook: &Path,
    json: bool,
) -> Result<Submission, String> {
    if json || !validator.has_directory() {
        return validator.validate_path(workbook).map_err(|e| e.to_string());
    }
    let pb = spinner("validating workbook and checking SIRETs…");
    let submission = validator.validate_path(workbook).map_err(|e| {
        spin_fail(&pb, "validation failed");
        e.to_string()
    })?;
    spin_ok(&pb, "validation complete");
    Ok(submission)
}

pub fn print_report(report: &ValidationReport, json: bool) -> Result<(), String> {
    if json {
        println!("{}", json_pretty(report)?);
        return Ok(());
    }

    print_tab(&report.etablissements);
    print_tab(&report.roles);

    if report.sirets_checked {
        if report.siret_errors.is_empty() {
            println!("SIRETs: all active");
        } else {
            println!("SIRETs:");
            for e in &report.siret_errors {
                println!("  ✗ {} {}", e.siret, e.message);
            }
        }
        println!();
    }

    if report.is_valid {
        println!("✓ submission is valid");
    } else {
        println!("✗ {} error(s) found", report.error_count);
    }
    Ok(())
}

fn print_tab(tab: &TabReport) {
    println!(
        "{} ({} rows): {}",
        tab.tab,
        tab.row_count,
        colorize_status(status_of(tab.is_valid))
    );
    if !tab.rows.is_empty() {
        println!("  {:>5}  {:<7} {}", "ROW", "STATUS", tab.fields.join(" | "));
        for row in &tab.rows {
            println!(
                "  {:>5}  {:<7} {}",
                row.index,
                colorize_status(&row.status),
                row.values.join(" | ")
            );
        }
    }
    for e in &tab.errors {
        println!("  ✗ {}: {}", e.summary, e.message);
    }
    println!();
}

fn status_of(valid: bool) -> &'static str {
    if valid {
        massval_schema::VALID_STR
    } else {
        massval_schema::ERROR_STR
    }
}
