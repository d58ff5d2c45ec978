//! Robot-mode end-to-end tests.

use crate::common::cli::CliRunner;
use crate::common::init_test_logging;

#[test]
fn robot_quick_start_outputs_json() {
    init_test_logging();
    let cli = CliRunner::new();
    let json = cli.run(&["--robot"]).assert_success().json();

    assert_eq!(json["tool"], "hwinv");
    assert!(json.get("records").is_some());
    assert!(json.get("output_modes").is_some());
}

#[test]
fn robot_add_list_delete_cycle() {
    init_test_logging();
    let cli = CliRunner::new();

    let added = cli.add("Laptop", "SN1", "2024-01-01", "Office");
    assert_eq!(added["ok"], true);
    assert_eq!(added["action"], "added");
    assert_eq!(added["device"]["identifier"], "SN1-Laptop");
    let code_path = added["code_path"].as_str().unwrap().to_string();
    assert!(std::path::Path::new(&code_path).is_file());
    assert!(code_path.starts_with(cli.data_dir().to_str().unwrap()));

    cli.add("Monitor", "MON-7", "2023-06-15", "Lab");

    let listed = cli.run_robot(&["list"]).assert_success().json();
    assert_eq!(listed["count"], 2);
    assert_eq!(listed["devices"][0]["serial"], "SN1");

    let searched = cli.run_robot(&["search", "mon"]).assert_success().json();
    assert_eq!(searched["count"], 1);
    assert_eq!(searched["filter"], "mon");

    let deleted = cli.run_robot(&["delete", "SN1"]).assert_success().json();
    assert_eq!(deleted["deleted"], true);
    assert_eq!(deleted["code_removed"], true);
    assert!(!std::path::Path::new(&code_path).exists());

    let again = cli.run_robot(&["delete", "SN1"]).assert_success().json();
    assert_eq!(again["deleted"], false);
}

#[test]
fn robot_validation_error_lists_missing_fields() {
    init_test_logging();
    let cli = CliRunner::new();
    let result = cli.run_robot(&["add", "--name", "Laptop", "--serial", "SN1"]);
    result.assert_failure();
    assert_eq!(result.exit_code, 1);
    assert!(result.stdout.trim().is_empty());

    let error = result.error_json();
    assert_eq!(error["error"], true);
    assert_eq!(error["recoverable"], true);
    assert_eq!(error["missing"][0], "purchase_date");
    assert_eq!(error["missing"][1], "location");

    let listed = cli.run_robot(&["list"]).assert_success().json();
    assert_eq!(listed["count"], 0);
}

#[test]
fn robot_duplicate_serial_is_error() {
    init_test_logging();
    let cli = CliRunner::new();
    cli.add("Laptop", "SN1", "2024-01-01", "Office");

    let result = cli.run_robot(&["add", "-n", "Tablet", "-s", "SN1", "-d", "2024-02-02", "-l", "Lab"]);
    result.assert_failure();
    let error = result.error_json();
    assert!(error["message"].as_str().unwrap().contains("SN1"));

    let shown = cli.run_robot(&["show", "SN1"]).assert_success().json();
    assert_eq!(shown["device"]["name"], "Laptop");
}

#[test]
fn robot_edit_keeps_unspecified_fields() {
    init_test_logging();
    let cli = CliRunner::new();
    cli.add("Laptop", "SN1", "2024-01-01", "Office");

    let edited = cli
        .run_robot(&["edit", "SN1", "--name", "Notebook"])
        .assert_success()
        .json();
    assert_eq!(edited["action"], "edited");
    assert_eq!(edited["device"]["identifier"], "SN1-Notebook");
    assert_eq!(edited["device"]["location"], "Office");
    assert_eq!(edited["previous_identifier"], "SN1-Laptop");

    let result = cli.run_robot(&["lookup", "SN1-Laptop"]);
    result.assert_failure();

    let found = cli.run_robot(&["lookup", "SN1-Notebook"]).assert_success().json();
    assert_eq!(found["device"]["serial"], "SN1");
}

#[test]
fn robot_edit_unknown_serial_fails() {
    let cli = CliRunner::new();
    let result = cli.run_robot(&["edit", "SN404", "--name", "Ghost"]);
    result.assert_failure();
    assert!(result.error_json()["suggestion"].is_string());
}

#[test]
fn robot_code_base64() {
    use base64::Engine;

    init_test_logging();
    let cli = CliRunner::new();
    cli.add("Laptop", "SN1", "2024-01-01", "Office");

    let json = cli
        .run_robot(&["code", "SN1", "--base64"])
        .assert_success()
        .json();
    assert_eq!(json["identifier"], "SN1-Laptop");
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(json["png_base64"].as_str().unwrap())
        .unwrap();
    let image = image::load_from_memory(&bytes).unwrap();
    assert_eq!(
        hwinv::scanner::decode_frame(&image).as_deref(),
        Some("SN1-Laptop")
    );
}

#[test]
fn robot_status_and_compact_format() {
    init_test_logging();
    let cli = CliRunner::new();
    cli.add("Laptop", "SN1", "2024-01-01", "Office");

    let result = cli.run(&["status", "--format", "json-compact"]);
    result.assert_success();
    assert_eq!(result.stdout.trim().lines().count(), 1);

    let json = result.json();
    assert_eq!(json["devices"], 1);
    assert_eq!(json["missing_codes"], 0);
    assert_eq!(json["scan"]["interval_ms"], 30);
    assert!(json["config_file"].is_null());
}

#[test]
fn robot_settings_file_is_used() {
    init_test_logging();
    let cli = CliRunner::new();
    let config = cli.root().join("settings.toml");
    std::fs::write(&config, "[scan]\ninterval_ms = 5\n\n[codes]\nmodule_size = 3\n").unwrap();
    let config = config.to_str().unwrap().to_string();

    let json = cli
        .run_robot(&["--config", &config, "status"])
        .assert_success()
        .json();
    assert_eq!(json["scan"]["interval_ms"], 5);
    assert_eq!(json["codes"]["module_size"], 3);
    assert_eq!(json["config_file"], config.as_str());

    let result = cli.run_robot(&["--config", "/nonexistent/hwinv.toml", "status"]);
    result.assert_failure();
}

#[test]
fn robot_oversized_name_is_not_stored() {
    init_test_logging();
    let cli = CliRunner::new();
    let huge = "N".repeat(3000);

    let result = cli.run_robot(&[
        "add", "--name", &huge, "--serial", "SN1", "--purchase-date", "2024-01-01",
        "--location", "Office",
    ]);
    result.assert_failure();
    assert_eq!(result.error_json()["error"], true);

    let listed = cli.run_robot(&["list"]).assert_success().json();
    assert_eq!(listed["count"], 0);

    // The failed add did not claim the serial
    let added = cli.add("Laptop", "SN1", "2024-01-01", "Office");
    assert_eq!(added["ok"], true);
}

#[test]
fn robot_out_of_range_module_size_is_rejected() {
    init_test_logging();
    let cli = CliRunner::new();
    let config = cli.root().join("settings.toml");
    std::fs::write(&config, "[codes]\nmodule_size = 100000\n").unwrap();
    let config = config.to_str().unwrap().to_string();

    let result = cli.run_robot(&[
        "--config", &config, "add", "--name", "Laptop", "--serial", "SN1",
        "--purchase-date", "2024-01-01", "--location", "Office",
    ]);
    result.assert_failure();
    assert!(result.error_json()["message"]
        .as_str()
        .unwrap()
        .contains("module_size"));
}

#[test]
fn robot_version_fields() {
    let cli = CliRunner::new();
    let json = cli.run(&["version", "--format=json"]).assert_success().json();
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    assert!(json["git_dirty"].is_boolean());
}
