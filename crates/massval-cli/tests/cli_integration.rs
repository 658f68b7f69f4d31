//! CLI subprocess integration tests.
//!
//! These tests invoke the `massval` binary as a subprocess and verify
//! exit codes, stdout content, and JSON output stability.

use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use std::process::Command;

const ETAB_HEADER: [&str; 7] = [
    "siret",
    "gerepId",
    "companyTypes",
    "givenName",
    "contactEmail",
    "contactPhone",
    "website",
];
const ROLE_HEADER: [&str; 3] = ["siret", "email", "role"];

fn massval_bin(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_massval"));
    // Keep the user's config and environment out of the tests.
    cmd.env("HOME", home)
        .env_remove("MASSVAL_SEARCH_URL")
        .env_remove("MASSVAL_SEARCH_INDEX")
        .env_remove("MASSVAL_SEARCH_CA_CERT")
        .env_remove("MASSVAL_SEARCH_API_KEY")
        .env_remove("MASSVAL_LOG");
    cmd
}

fn write_workbook(dir: &Path, etabs: &[&[&str]], roles: &[&[&str]]) -> PathBuf {
    let mut book = Workbook::new();
    for (name, header, rows) in [
        ("Établissements", &ETAB_HEADER[..], etabs),
        ("Rôles", &ROLE_HEADER[..], roles),
    ] {
        let sheet = book.add_worksheet();
        sheet.set_name(name).unwrap();
        for (c, value) in header.iter().enumerate() {
            sheet.write_string(0, c as u16, *value).unwrap();
        }
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                sheet.write_string(r as u32 + 1, c as u16, *value).unwrap();
            }
        }
    }
    let path = dir.join("import.xlsx");
    book.save(&path).unwrap();
    path
}

fn valid_workbook(dir: &Path) -> PathBuf {
    write_workbook(
        dir,
        &[&[
            "12345678901234",
            "",
            "PRODUCER",
            "Acme",
            "contact@acme.fr",
            "01.23.45.67.89",
            "",
        ]],
        &[&["12345678901234", "jane@acme.fr", "ADMIN"]],
    )
}

fn invalid_workbook(dir: &Path) -> PathBuf {
    write_workbook(
        dir,
        &[&["1234", "", "PRODUCER", "Acme"]],
        &[&["12345678901234", "jane", "OWNER"]],
    )
}

fn write_snapshot(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let map: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(s, state)| ((*s).to_owned(), serde_json::Value::from(*state)))
        .collect();
    let path = dir.join("directory.json");
    std::fs::write(&path, serde_json::json!({ "entries": map }).to_string()).unwrap();
    path
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

#[test]
fn cli_version_exits_zero() {
    let home = tempfile::tempdir().unwrap();
    let output = massval_bin(home.path()).arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("massval"));
}

#[test]
fn cli_help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    let output = massval_bin(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["validate", "export", "check-siret", "config", "doctor"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}': {stdout}");
    }
}

#[test]
fn validate_valid_workbook_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = valid_workbook(dir.path());
    let output = massval_bin(dir.path())
        .args(["validate"])
        .arg(&workbook)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Établissements (1 rows)"), "{stdout}");
    assert!(stdout.contains("submission is valid"), "{stdout}");
}

#[test]
fn validate_invalid_workbook_exits_two_and_lists_errors() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = invalid_workbook(dir.path());
    let output = massval_bin(dir.path())
        .arg("validate")
        .arg(&workbook)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Siret error on row n°2 value=1234"), "{stdout}");
    assert!(stdout.contains("Role error on row n°2 value=OWNER"), "{stdout}");
    assert!(stdout.contains("Siret absent de l'onglet établissements"), "{stdout}");
}

#[test]
fn validate_json_output_is_report() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = invalid_workbook(dir.path());
    let output = massval_bin(dir.path())
        .args(["--json", "validate"])
        .arg(&workbook)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(report["is_valid"], false);
    assert_eq!(report["sirets_checked"], false);
    assert_eq!(report["etablissements"]["rows"][0]["status"], "Erreur");
    assert_eq!(report["roles"]["errors"].as_array().unwrap().len(), 3);
}

#[test]
fn validate_with_snapshot_reports_inactive_sirets() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = valid_workbook(dir.path());
    let snapshot = write_snapshot(dir.path(), &[("12345678901234", "F")]);
    let output = massval_bin(dir.path())
        .args(["--json", "--directory"])
        .arg(&snapshot)
        .args(["validate", "--check-sirets"])
        .arg(&workbook)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let report = stdout_json(&output);
    assert_eq!(report["sirets_checked"], true);
    assert_eq!(report["siret_errors"][0]["siret"], "12345678901234");
    assert_eq!(
        report["siret_errors"][0]["message"],
        "Ce siret est non diffusible"
    );
}

#[test]
fn validate_missing_tab_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one-tab.xlsx");
    let mut book = Workbook::new();
    book.add_worksheet().set_name("Établissements").unwrap();
    book.save(&path).unwrap();

    let output = massval_bin(dir.path())
        .arg("validate")
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Rôles"));
}

#[test]
fn validate_missing_file_exits_three() {
    let dir = tempfile::tempdir().unwrap();
    let output = massval_bin(dir.path())
        .args(["validate", "/nonexistent/massval/import.xlsx"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn check_sirets_without_config_exits_four() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = valid_workbook(dir.path());
    let output = massval_bin(dir.path())
        .args(["validate", "--check-sirets"])
        .arg(&workbook)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn unreachable_search_endpoint_exits_four() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("search.json");
    std::fs::write(
        &config,
        r#"{"url": "http://127.0.0.1:1", "index": "idx", "timeout_secs": 2}"#,
    )
    .unwrap();
    let output = massval_bin(dir.path())
        .arg("--search-config")
        .arg(&config)
        .args(["check-siret", "12345678901234"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn export_writes_csv_files() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = valid_workbook(dir.path());
    let out = dir.path().join("csv");
    let output = massval_bin(dir.path())
        .args(["--json", "export"])
        .arg(&workbook)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["etablissements"]["rows"], 1);

    let roles = std::fs::read_to_string(out.join("roles.csv")).unwrap();
    assert_eq!(
        roles,
        "\"siret\",\"email\",\"role\"\n\"12345678901234\",\"jane@acme.fr\",\"ADMIN\"\n"
    );
    assert!(out.join("etablissements.csv").exists());
}

#[test]
fn export_invalid_workbook_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let workbook = invalid_workbook(dir.path());
    let out = dir.path().join("csv");
    let output = massval_bin(dir.path())
        .arg("export")
        .arg(&workbook)
        .arg("--out")
        .arg(&out)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!out.join("etablissements.csv").exists());
    assert!(!out.join("roles.csv").exists());
}

#[test]
fn check_siret_against_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(
        dir.path(),
        &[("12345678901234", "A"), ("23456789012345", "F")],
    );

    let output = massval_bin(dir.path())
        .args(["--json", "--directory"])
        .arg(&snapshot)
        .args(["check-siret", "12345678901234"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)[0]["active"], true);

    let output = massval_bin(dir.path())
        .args(["--json", "--directory"])
        .arg(&snapshot)
        .args(["check-siret", "12345678901234", "23456789012345", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let json = stdout_json(&output);
    assert_eq!(json[1]["status"], "inactive");
    assert_eq!(json[2]["status"], "malformed");
}

#[test]
fn config_set_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("conf/search.json");

    let output = massval_bin(dir.path())
        .arg("--search-config")
        .arg(&config)
        .args([
            "config",
            "set",
            "--url",
            "https://es.example.com:9200/",
            "--index",
            "stocketablissement",
            "--api-key",
            "secret",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(config.exists());

    let output = massval_bin(dir.path())
        .args(["--json", "--search-config"])
        .arg(&config)
        .args(["config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = stdout_json(&output);
    assert_eq!(json["url"], "https://es.example.com:9200");
    assert_eq!(json["index"], "stocketablissement");
    assert_ne!(json["api_key"], "secret");
}

#[test]
fn config_show_without_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = massval_bin(dir.path())
        .args(["config", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("massval config set"));
}

#[test]
fn doctor_with_snapshot_is_healthy() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), &[("12345678901234", "A")]);
    let output = massval_bin(dir.path())
        .args(["--json", "--directory"])
        .arg(&snapshot)
        .arg("doctor")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout_json(&output)["healthy"], true);
}

#[test]
fn doctor_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = massval_bin(dir.path())
        .args(["--json", "doctor"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["healthy"], false);
}

#[test]
fn completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    let output = massval_bin(dir.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("massval"));
}

#[test]
fn man_pages_written() {
    let dir = tempfile::tempdir().unwrap();
    let man = dir.path().join("man");
    let output = massval_bin(dir.path())
        .arg("man-pages")
        .arg(&man)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(man.join("massval.1").exists());
    assert!(man.join("massval-validate.1").exists());
}
