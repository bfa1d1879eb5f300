//! Integration tests for the onboard CLI
//!
//! These tests drive the binary end to end against temporary project directories.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create an onboard Command
fn onboard() -> Command {
    cargo_bin_cmd!("onboard")
}

/// Helper to create a temporary project directory
fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

/// Helper to initialize a portal in a temp directory
fn init_portal(dir: &TempDir) {
    onboard()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();
}

fn write_json(path: &Path, value: serde_json::Value) {
    fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn insurance_record() -> serde_json::Value {
    json!({
        "fullName": "A. Kumar",
        "dateOfBirth": "1990-04-12",
        "gender": "male",
        "mobileNumber": "9876543210",
        "email": "a@example.com",
        "declarationAccepted": true,
        "signature": "data:image/png;base64,iVBORw0KGgo="
    })
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_onboard_help() {
        onboard()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("validate"));
    }

    #[test]
    fn test_onboard_version() {
        onboard().arg("--version").assert().success();
    }

    #[test]
    fn test_init_creates_structure() {
        let dir = create_temp_project();

        onboard()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("Initialized onboarding portal"));

        assert!(dir.path().join(".onboard/onboard.toml").exists());
        assert!(dir.path().join(".onboard/exports").exists());
        assert!(dir.path().join(".onboard/logs").exists());
    }

    #[test]
    fn test_init_idempotent() {
        let dir = create_temp_project();
        init_portal(&dir);

        onboard()
            .current_dir(dir.path())
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("already initialized"));
    }

    #[test]
    fn test_project_dir_flag() {
        let dir = create_temp_project();

        onboard()
            .arg("--project-dir")
            .arg(dir.path())
            .arg("init")
            .assert()
            .success();

        assert!(dir.path().join(".onboard").exists());
    }
}

// =============================================================================
// Step Catalog
// =============================================================================

mod steps {
    use super::*;

    #[test]
    fn test_steps_lists_catalog_in_order() {
        let dir = create_temp_project();

        let output = onboard()
            .current_dir(dir.path())
            .arg("steps")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let stdout = String::from_utf8(output).unwrap();

        let titles = [
            "Joining Form",
            "EPF Form 11",
            "Gratuity Form F",
            "PF Nomination",
            "Medical Insurance",
            "Self Declaration",
        ];
        let positions: Vec<usize> = titles
            .iter()
            .map(|t| stdout.find(t).unwrap_or_else(|| panic!("missing {}", t)))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
        assert!(stdout.contains("shares must total 100%"));
    }

    #[test]
    fn test_steps_applies_required_overrides() {
        let dir = create_temp_project();
        init_portal(&dir);
        fs::write(
            dir.path().join(".onboard/onboard.toml"),
            "[steps.overrides.\"insurance\"]\nrequired = [\"bloodGroup\"]\n",
        )
        .unwrap();

        onboard()
            .current_dir(dir.path())
            .arg("steps")
            .assert()
            .success()
            .stdout(predicate::str::contains("bloodGroup"));
    }
}

// =============================================================================
// Offline Validation
// =============================================================================

mod validate {
    use super::*;

    #[test]
    fn test_valid_record_passes() {
        let dir = create_temp_project();
        let record = dir.path().join("insurance.json");
        write_json(&record, insurance_record());

        onboard()
            .current_dir(dir.path())
            .args(["validate", "--step", "insurance"])
            .arg(&record)
            .assert()
            .success()
            .stdout(predicate::str::contains("passes validation"));
    }

    #[test]
    fn test_missing_field_fails_with_field_name() {
        let dir = create_temp_project();
        let record = dir.path().join("insurance.json");
        let mut value = insurance_record();
        value["email"] = json!("   ");
        write_json(&record, value);

        onboard()
            .current_dir(dir.path())
            .args(["validate", "--step", "insurance"])
            .arg(&record)
            .assert()
            .failure()
            .stdout(predicate::str::contains("email"));
    }

    #[test]
    fn test_share_total_mismatch_fails() {
        let dir = create_temp_project();
        let record = dir.path().join("pf.json");
        write_json(
            &record,
            json!({
                "fullName": "A. Kumar",
                "fatherName": "R. Kumar",
                "dateOfBirth": "1990-04-12",
                "gender": "male",
                "maritalStatus": "married",
                "permanentAddress": "12 Lake Road",
                "declarationAccepted": true,
                "signature": "data:image/png;base64,iVBORw0KGgo=",
                "nominees": [
                    {"name": "Meera", "relationship": "Spouse", "sharePercent": "60"},
                    {"name": "Ravi", "relationship": "Son", "sharePercent": 30}
                ]
            }),
        );

        onboard()
            .current_dir(dir.path())
            .args(["validate", "--step", "pfNomination"])
            .arg(&record)
            .assert()
            .failure()
            .stdout(predicate::str::contains("total 90.00%"));
    }

    #[test]
    fn test_help_step_examples_are_accepted() {
        let dir = create_temp_project();
        let record = dir.path().join("r.json");
        write_json(&record, json!({}));

        onboard()
            .args(["validate", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"pf_nomination\""));

        for step in ["form11", "pf_nomination"] {
            onboard()
                .current_dir(dir.path())
                .args(["validate", "--step", step])
                .arg(&record)
                .assert()
                .failure()
                .stdout(predicate::str::contains("fullName"))
                .stderr(predicate::str::contains("Unknown step").not());
        }
    }

    #[test]
    fn test_unknown_step_fails() {
        let dir = create_temp_project();
        let record = dir.path().join("r.json");
        write_json(&record, json!({}));

        onboard()
            .current_dir(dir.path())
            .args(["validate", "--step", "payroll"])
            .arg(&record)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown step"));
    }

    #[test]
    fn test_malformed_record_fails() {
        let dir = create_temp_project();
        let record = dir.path().join("r.json");
        fs::write(&record, "not json").unwrap();

        onboard()
            .current_dir(dir.path())
            .args(["validate", "--step", "insurance"])
            .arg(&record)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to parse record JSON"));
    }
}

// =============================================================================
// Export
// =============================================================================

mod export {
    use super::*;
    use onboard::portal::PortalDb;
    use onboard::record::ApplicantRecord;

    fn seed_applicant(dir: &TempDir) {
        let db = PortalDb::new(&dir.path().join(".onboard/onboard.db")).unwrap();
        let record: ApplicantRecord = serde_json::from_value(json!({
            "fullName": "A. Kumar",
            "email": "a@example.com",
            "form11": {"uan": "100200300400"},
            "insurance": {"bloodGroup": "O+", "declarationAccepted": true}
        }))
        .unwrap();
        db.create_applicant("a-1", &record).unwrap();
    }

    #[test]
    fn test_export_sheet_row() {
        let dir = create_temp_project();
        init_portal(&dir);
        seed_applicant(&dir);

        onboard()
            .current_dir(dir.path())
            .args(["export", "a-1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("A. Kumar"))
            .stdout(predicate::str::contains("100200300400"));
    }

    #[test]
    fn test_export_form_fill_plan() {
        let dir = create_temp_project();
        init_portal(&dir);
        seed_applicant(&dir);

        onboard()
            .current_dir(dir.path())
            .args(["export", "a-1", "--form", "insurance"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"blood_group\""))
            .stdout(predicate::str::contains("O+"));
    }

    #[test]
    fn test_export_unknown_applicant_fails() {
        let dir = create_temp_project();
        init_portal(&dir);

        onboard()
            .current_dir(dir.path())
            .args(["export", "missing"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Applicant missing not found"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = create_temp_project();

        onboard()
            .current_dir(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No onboard.toml found"))
            .stdout(predicate::str::contains("port = 8080"));
    }

    #[test]
    fn test_config_init_then_validate() {
        let dir = create_temp_project();

        onboard()
            .current_dir(dir.path())
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created onboard.toml"));

        onboard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid."));
    }

    #[test]
    fn test_config_validate_reports_warnings() {
        let dir = create_temp_project();
        init_portal(&dir);
        fs::write(
            dir.path().join(".onboard/onboard.toml"),
            "[validation]\nshare_tolerance = 5.0\n\n[steps.overrides.\"payroll*\"]\nrequired = [\"x\"]\n",
        )
        .unwrap();

        onboard()
            .current_dir(dir.path())
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("share_tolerance"))
            .stdout(predicate::str::contains("does not match any step"));
    }
}
