//! Tests for the team export loader

use std::io::Write;

use tempfile::TempDir;
use valo2tm::pipeline::{filter_unmanaged, load_teams, parse_teams, LoadError, ValoTeam};
use valo2tm::tm::SlimTeam;

fn write_export(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("teams.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}", content).unwrap();
    path
}

#[test]
fn test_load_valid_export() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_export(
        &temp_dir,
        r#"[
            {
                "id": "g1",
                "title": "Marketing",
                "siteUrl": "https://contoso.sharepoint.com/sites/marketing",
                "dynamicMetadata": {
                    "ctId": "0x0100",
                    "fieldValues": [
                        {"fieldName": "Dept", "fieldType": "Text", "values": ["Sales"]},
                        {"fieldName": "Owner", "fieldType": "User"}
                    ]
                }
            },
            {"id": "g2", "title": "Bare", "dynamicMetadata": null}
        ]"#,
    );

    let teams = load_teams(&path).unwrap();

    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].field_values().len(), 2);
    assert_eq!(teams[0].field_values()[1].values, None);
    assert!(teams[1].field_values().is_empty(), "Null metadata reads as no values");
}

#[test]
fn test_record_without_title_rejects_whole_file() {
    let err = parse_teams(r#"[{"id":"g1","title":"Ok"},{"id":"g2"}]"#).unwrap_err();

    assert!(
        matches!(err, LoadError::InvalidRecord { index: 1, key: "title" }),
        "Unexpected error: {err}"
    );
}

#[test]
fn test_non_string_id_is_rejected() {
    let err = parse_teams(r#"[{"id":42,"title":"Numbers"}]"#).unwrap_err();

    assert!(matches!(err, LoadError::InvalidRecord { index: 0, key: "id" }));
}

#[test]
fn test_object_instead_of_array_is_rejected() {
    assert!(matches!(
        parse_teams(r#"{"id":"g1","title":"Lonely"}"#),
        Err(LoadError::NotAnArray)
    ));
}

#[test]
fn test_invalid_json_is_rejected() {
    assert!(matches!(parse_teams("[{"), Err(LoadError::Json(_))));
}

#[test]
fn test_missing_file_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing.json");

    let err = load_teams(&path).unwrap_err();

    assert!(err.to_string().contains("missing.json"));
}

#[test]
fn test_filter_unmanaged_drops_managed_ids() {
    let teams = vec![
        ValoTeam::new("g1", "One"),
        ValoTeam::new("g2", "Two"),
        ValoTeam::new("g3", "Three"),
    ];
    let managed = vec![SlimTeam {
        team_id: "g2".to_string(),
        display_name: "Two".to_string(),
    }];

    let remaining = filter_unmanaged(teams, &managed);

    let ids: Vec<&str> = remaining.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g3"]);
}
