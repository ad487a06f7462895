//! Integration tests for the validate and plan commands
//!
//! Tests cover:
//! - Validate report and exit codes
//! - Plan against an empty account and against a snapshot
//! - Text output
//! - Unreadable or invalid snapshots

use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

use roster_cli::commands::plan::{self, PlanArgs};
use roster_cli::commands::validate::{self, ValidateArgs};
use roster_cli::commands::{InputArgs, OutputFormat};
use roster_cli::error::CliError;
use roster_provisioning::ProvisioningConfig;

const SCENARIO: &str = "first_name,last_name,department,job_title\n\
                        Michael,Scott,Education,Regional Manager\n\
                        Dwight,Schrute,Sales,Assistant to the Regional Manager\n";

fn temp_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn input(path: PathBuf) -> InputArgs {
    InputArgs {
        input: path,
        delimiter: "comma".to_string(),
        mappings: Vec::new(),
        max_rows: None,
    }
}

fn run_plan(args: &PlanArgs, config: ProvisioningConfig) -> Result<String, CliError> {
    let mut out = Vec::new();
    plan::execute(args, config, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn run_validate(args: &ValidateArgs) -> (Result<(), CliError>, String) {
    let mut out = Vec::new();
    let result = validate::execute(args, ProvisioningConfig::default(), &mut out);
    (result, String::from_utf8(out).unwrap())
}

// =========================================================================
// validate
// =========================================================================

#[test]
fn test_validate_clean_file() {
    let csv = temp_file(SCENARIO);
    let args = ValidateArgs {
        input: input(csv.path().to_path_buf()),
        output: OutputFormat::Json,
    };

    let (result, output) = run_validate(&args);
    assert!(result.is_ok());

    let report: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(report["total_rows"], 2);
    assert_eq!(report["accepted"], 2);
    assert_eq!(report["users"][0]["key"], "mscott");
    assert_eq!(report["users"][0]["group"], "Education");
    assert_eq!(report["users"][1]["group"], "Unassigned");
}

#[test]
fn test_validate_reports_rejections_and_fails() {
    let csv = temp_file(&format!("{SCENARIO}Jim,,Sales,Salesman\n"));
    let args = ValidateArgs {
        input: input(csv.path().to_path_buf()),
        output: OutputFormat::Text,
    };

    let (result, output) = run_validate(&args);
    let err = result.unwrap_err();
    assert_eq!(err.exit_code(), 4);
    assert!(matches!(
        err,
        CliError::RejectedRecords {
            rejected: 1,
            row_errors: 0
        }
    ));
    assert!(output.contains("line    4  rejected:"));
    assert!(output.contains("3 row(s), 2 accepted, 1 rejected, 0 unreadable"));
}

// =========================================================================
// plan
// =========================================================================

#[test]
fn test_plan_against_empty_account() {
    let csv = temp_file(SCENARIO);
    let args = PlanArgs {
        input: input(csv.path().to_path_buf()),
        observed: None,
        output: OutputFormat::Json,
    };
    let config = ProvisioningConfig {
        console_access: false,
        ..ProvisioningConfig::default()
    };

    let output = run_plan(&args, config).unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();
    let ops = report["changes"]["operations"].as_array().unwrap();
    let summary: Vec<(&str, &str)> = ops
        .iter()
        .map(|op| {
            let target = op.get("key").or_else(|| op.get("group")).unwrap();
            (op["op"].as_str().unwrap(), target.as_str().unwrap())
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("create_user", "mscott"),
            ("create_user", "dschrute"),
            ("set_group_membership", "Education"),
            ("set_group_membership", "Unassigned"),
        ]
    );
    assert!(report["rejected"].as_array().unwrap().is_empty());
}

#[test]
fn test_plan_against_snapshot_text_output() {
    let csv = temp_file(SCENARIO);
    let snapshot = temp_file(
        r#"{
            "users": [
                {
                    "key": "mscott",
                    "tags": {
                        "Department": "Education",
                        "DisplayName": "Michael Scott",
                        "JobTitle": "Regional Manager"
                    },
                    "console_access": true
                }
            ],
            "memberships": { "Education": ["mscott"] }
        }"#,
    );
    let args = PlanArgs {
        input: input(csv.path().to_path_buf()),
        observed: Some(snapshot.path().to_path_buf()),
        output: OutputFormat::Text,
    };

    let output = run_plan(&args, ProvisioningConfig::default()).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines[..3],
        [
            "+ CreateUser(dschrute)",
            "+ EnableConsoleAccess(dschrute)",
            "+ SetGroupMembership(Unassigned, 1 members)",
        ]
    );
    assert!(lines[3].starts_with("Plan: 3 operation(s)"));
}

#[test]
fn test_plan_with_unreadable_snapshot() {
    let csv = temp_file(SCENARIO);
    let snapshot = temp_file("{ not json");
    let args = PlanArgs {
        input: input(csv.path().to_path_buf()),
        observed: Some(snapshot.path().to_path_buf()),
        output: OutputFormat::Json,
    };

    let err = run_plan(&args, ProvisioningConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::Observed { .. }));
    assert_eq!(err.exit_code(), 4);
}

#[test]
fn test_plan_rejects_snapshot_with_invalid_user_name() {
    let csv = temp_file(SCENARIO);
    let snapshot = temp_file(r#"{ "users": [ { "key": "m scott" } ] }"#);
    let args = PlanArgs {
        input: input(csv.path().to_path_buf()),
        observed: Some(snapshot.path().to_path_buf()),
        output: OutputFormat::Json,
    };

    let err = run_plan(&args, ProvisioningConfig::default()).unwrap_err();
    match err {
        CliError::Observed { message, .. } => assert!(message.contains("m scott")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_plan_with_mapped_columns() {
    let csv = temp_file(
        "Given Name;Surname;Department;Title\n\
         Michael;Scott;Education;Regional Manager\n",
    );
    let args = PlanArgs {
        input: InputArgs {
            input: csv.path().to_path_buf(),
            delimiter: ";".to_string(),
            mappings: vec![
                "Given Name=first_name".to_string(),
                "Surname=last_name".to_string(),
                "Title=job_title".to_string(),
            ],
            max_rows: None,
        },
        observed: None,
        output: OutputFormat::Text,
    };

    let output = run_plan(&args, ProvisioningConfig::default()).unwrap();
    assert!(output.starts_with("+ CreateUser(mscott)\n"));
}

#[test]
fn test_plan_missing_input_file() {
    let args = PlanArgs {
        input: input(PathBuf::from("/nonexistent/people.csv")),
        observed: None,
        output: OutputFormat::Json,
    };
    let err = run_plan(&args, ProvisioningConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::Import(_)));
}
