//! CSV import feeding the provisioning engine.

use std::io::Write;

use roster_connector::ObservedState;
use roster_import::{read_file, read_records, CsvDelimiter, ImportConfig};
use roster_provisioning::{ProvisioningConfig, ProvisioningEngine, RecordError};

fn engine(console_access: bool) -> ProvisioningEngine {
    ProvisioningEngine::new(ProvisioningConfig {
        console_access,
        ..ProvisioningConfig::default()
    })
    .unwrap()
}

#[test]
fn test_file_to_plan() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        "First Name,Last Name,Department,Job Title\n\
         Michael,Scott,Education,Regional Manager\n\
         Dwight,Schrute,Sales,Assistant to the Regional Manager\n"
    )
    .unwrap();

    let imported = read_file(file.path(), &ImportConfig::new()).unwrap();
    assert!(imported.errors.is_empty());

    let plan = engine(false)
        .plan(imported.records, &ObservedState::new())
        .unwrap();
    let rendered: Vec<String> = plan.changes.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "CreateUser(mscott)",
            "CreateUser(dschrute)",
            "SetGroupMembership(Education, 1 members)",
            "SetGroupMembership(Unassigned, 1 members)",
        ]
    );
}

#[test]
fn test_short_row_rejected_with_source_line() {
    let csv = "first_name;last_name;department;job_title\n\
               Michael;Scott;Education;Regional Manager\n\
               Jim;Halpert\n";
    let config = ImportConfig::new().with_delimiter(CsvDelimiter::Semicolon);
    let imported = read_records(csv.as_bytes(), &config).unwrap();

    let plan = engine(true)
        .plan(imported.records, &ObservedState::new())
        .unwrap();
    assert_eq!(plan.desired.users.len(), 1);
    assert!(matches!(
        &plan.rejected[..],
        [RecordError::InvalidRecord { line: 3, fields, .. }]
            if fields == &vec!["department".to_string(), "job_title".to_string()]
    ));
}

#[test]
fn test_delimiter_from_name() {
    let delimiter: CsvDelimiter = "pipe".parse().unwrap();
    let imported = read_records(
        b"first_name|last_name|department|job_title\nPam|Beesly|Reception|Receptionist\n",
        &ImportConfig::new().with_delimiter(delimiter),
    )
    .unwrap();
    assert_eq!(imported.records[0].get("department"), Some("Reception"));
}
