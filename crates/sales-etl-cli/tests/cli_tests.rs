//! CLI integration tests for sales-etl.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes for the error classes, and small end-to-end runs against
//! scratch SQLite files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

const ORDERS_CSV: &str = "order_id,customer_name,state,order_date,amount\n\
                          1,Ana,CA,2024-01-05,10.5\n\
                          2,Ben,NY,2024-01-06,abc\n";

const RAW_SALES_CSV: &str = "date,store_id,region,product,quantity,price_usd\n\
                             2024-01-01,NY01,north east,Widget,2,5.00 USD\n\
                             2024-01-01,NY01,north east,Widget,2,5.00 USD\n\
                             2024-01-02,NY01,north east,Gadget,,9.50 USD\n\
                             2024-01-03,LA02,west,Widget,4,5.00 USD\n";

const RATES_JSON: &str = r#"{"bpi": {"USD": {"code": "USD", "rate_float": 42000.0},
                                     "EUR": {"code": "EUR", "rate_float": 38500.5}}}"#;

/// Get a command for the sales-etl binary, isolated from the caller's
/// database environment and run inside `dir`.
fn cmd_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sales-etl").unwrap();
    cmd.current_dir(dir);
    for var in ["DB_HOST", "DB_PORT", "DB_USER", "DB_PASS", "DB_NAME", "DB_URL"] {
        cmd.env_remove(var);
    }
    cmd
}

fn cmd() -> Command {
    Command::cargo_bin("sales-etl").unwrap()
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("load"))
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("aggregate"))
        .stdout(predicate::str::contains("rates"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_load_subcommand_help() {
    cmd()
        .args(["load", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--csv"))
        .stdout(predicate::str::contains("--db-path"))
        .stdout(predicate::str::contains("--conn"))
        .stdout(predicate::str::contains("--if-exists"))
        .stdout(predicate::str::contains("[default: replace]"))
        .stdout(predicate::str::contains("[default: sales_data.csv]"));
}

#[test]
fn test_rates_subcommand_help() {
    cmd()
        .args(["rates", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--fallback"))
        .stdout(predicate::str::contains("--timeout"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("sales-etl"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_global_flags_exist() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"))
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_invalid_verbosity_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["--verbosity", "loud", "clean"])
        .assert()
        .code(1);
}

// =============================================================================
// Exit Code Tests - Config Errors (Exit Code 1 / 7)
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_invalid_if_exists_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(&dir, "sales_data.csv", ORDERS_CSV);
    cmd_in(dir.path())
        .args(["load", "--csv", &csv, "--if-exists", "upsert"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("upsert"));
}

#[test]
fn test_invalid_destination_exits_with_code_1() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["load", "--to", "oracle"])
        .assert()
        .code(1);
}

// =============================================================================
// Exit Code Tests - Load Errors (Exit Codes 2 / 3 / 4)
// =============================================================================

#[test]
fn test_missing_csv_exits_with_code_2() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["load", "--csv", "no_such_file.csv"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no_such_file.csv"));
}

#[test]
fn test_engine_without_connection_exits_with_code_3() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(&dir, "sales_data.csv", ORDERS_CSV);
    cmd_in(dir.path())
        .args(["load", "--csv", &csv, "--to", "engine"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Missing connection string"));
}

#[test]
fn test_missing_csv_reported_before_missing_connection() {
    let dir = TempDir::new().unwrap();
    cmd_in(dir.path())
        .args(["load", "--csv", "no_such_file.csv", "--to", "engine"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no_such_file.csv"));
}

#[test]
fn test_fail_policy_on_existing_table_exits_with_code_4() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(&dir, "sales_data.csv", ORDERS_CSV);
    let db = dir.path().join("sales.db");
    let db = db.to_str().unwrap();

    cmd_in(dir.path())
        .args(["load", "--csv", &csv, "--db-path", db, "--if-exists", "fail"])
        .assert()
        .success();

    cmd_in(dir.path())
        .args(["load", "--csv", &csv, "--db-path", db, "--if-exists", "fail"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("already exists"));
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_load_into_sqlite_outputs_json() {
    let dir = TempDir::new().unwrap();
    let csv = write_file(&dir, "sales_data.csv", ORDERS_CSV);
    let db = dir.path().join("sales.db");

    cmd_in(dir.path())
        .args([
            "--output-json",
            "load",
            "--csv",
            &csv,
            "--db-path",
            db.to_str().unwrap(),
            "--table",
            "orders",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows_written\": 2"))
        .stdout(predicate::str::contains("\"table\": \"orders\""));

    assert!(db.exists());
}

#[test]
fn test_clean_then_aggregate() {
    let dir = TempDir::new().unwrap();
    let raw = write_file(&dir, "sales_data.csv", RAW_SALES_CSV);
    let cleaned = dir.path().join("cleaned_sales_data.csv");

    cmd_in(dir.path())
        .args(["clean", "--input", &raw, "--output", cleaned.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clean completed!"));

    let content = std::fs::read_to_string(&cleaned).unwrap();
    assert!(content.starts_with("date,store_id,region,product,quantity,price_usd,total_sales"));
    assert!(content.contains("North East"));
    assert_eq!(content.lines().count(), 4);

    cmd_in(dir.path())
        .args(["--output-json", "aggregate", "--store", "NY01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"rows_matched\": 2"))
        .stdout(predicate::str::contains("Widget"))
        .stdout(predicate::str::contains("Gadget"));
}

#[test]
fn test_rates_falls_back_to_local_file() {
    let dir = TempDir::new().unwrap();
    let fallback = write_file(&dir, "sample_data.json", RATES_JSON);
    let db = dir.path().join("rates.db");

    cmd_in(dir.path())
        .args([
            "--output-json",
            "rates",
            "--url",
            "http://127.0.0.1:1/currentprice.json",
            "--timeout",
            "2",
            "--fallback",
            &fallback,
            "--db-path",
            db.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"source\": \"fallback\""))
        .stdout(predicate::str::contains("\"rows_written\": 2"))
        .stdout(predicate::str::contains("\"table\": \"crypto_rates\""));
}

#[test]
fn test_rates_without_fallback_exits_with_code_5() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("rates.db");

    cmd_in(dir.path())
        .args([
            "rates",
            "--url",
            "http://127.0.0.1:1/currentprice.json",
            "--timeout",
            "2",
            "--fallback",
            "missing_sample.json",
            "--db-path",
            db.to_str().unwrap(),
        ])
        .assert()
        .code(5);
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
