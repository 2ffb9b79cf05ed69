use std::fs;

use ogd_dataset::{ChartType, ColumnType, DataSource, FeatureLevel, Sampling, Value};
use ogd_ingest::{load_dataset, LoadOptions};

fn population_export() -> String {
    let mut header = vec!["SessionCount".to_string(), "ActiveJobs".to_string()];
    let mut row = vec!["120".to_string(), r#"["kelp-welcome"]"#.to_string()];
    for (i, name) in ["kelp-welcome", "kelp-urchins"].iter().enumerate() {
        for sub in ogd_dataset::charts::JOBS_ATTEMPTED_SUBFEATURES {
            header.push(format!("job{i}_{sub}"));
            row.push(if sub.ends_with("job-name") {
                name.to_string()
            } else {
                "4".to_string()
            });
        }
    }
    format!("{}\n{}\n", header.join("\t"), row.join("\t"))
}

#[test]
fn loads_population_export_with_level_from_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir
        .path()
        .join("AQUALAB_20230101_to_20230131_5c61198_population-features.tsv");
    fs::write(&path, population_export()).unwrap();

    let ds = load_dataset(&path, &LoadOptions::default()).unwrap();
    assert_eq!(ds.id(), "AQUALAB_20230101_to_20230131_5c61198_population-features");
    assert_eq!(ds.level(), FeatureLevel::Population);
    assert_eq!(
        ds.source(),
        &DataSource::File {
            name: "AQUALAB_20230101_to_20230131_5c61198_population-features.tsv".into()
        }
    );
    assert_eq!(ds.rows()[0]["SessionCount"], Value::Number(120.0));
    assert_eq!(ds.column_type("ActiveJobs"), Some(ColumnType::Categorical));
    assert!(ds.supports(ChartType::JobGraph));
    assert!(ds.supports(ChartType::JobSankey));
}

#[test]
fn all_rows_sampling_demotes_mixed_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.tsv");
    fs::write(&path, "score\tclass\n1\tA\noops\tB\n3\tA\n").unwrap();

    let first = load_dataset(
        &path,
        &LoadOptions {
            level: Some(FeatureLevel::Session),
            ..LoadOptions::default()
        },
    )
    .unwrap();
    assert_eq!(first.column_type("score"), Some(ColumnType::Numeric));

    let all = load_dataset(
        &path,
        &LoadOptions {
            level: Some(FeatureLevel::Session),
            sampling: Sampling::AllRows,
            max_rows: None,
        },
    )
    .unwrap();
    assert_eq!(all.column_type("score"), Some(ColumnType::Categorical));
}

#[test]
fn unknown_level_and_missing_file_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.tsv");
    fs::write(&path, "a\n1\n").unwrap();
    let err = load_dataset(&path, &LoadOptions::default()).unwrap_err();
    assert!(err.to_string().contains("feature level"));

    let missing = dir.path().join("SHIPWRECKS_20210701_to_20210731_session.tsv");
    let err = load_dataset(&missing, &LoadOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read"));
}

#[test]
fn max_rows_caps_loaded_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.tsv");
    fs::write(&path, "x\n1\n2\n3\n4\n").unwrap();
    let ds = load_dataset(
        &path,
        &LoadOptions {
            level: Some(FeatureLevel::Player),
            sampling: Sampling::FirstRow,
            max_rows: Some(2),
        },
    )
    .unwrap();
    assert_eq!(ds.rows().len(), 2);
}
