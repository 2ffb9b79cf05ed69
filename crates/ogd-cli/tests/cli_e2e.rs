use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn ogd_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ogd"))
}

fn run(args: &[&str]) -> Output {
    run_with_env(args, &[])
}

fn run_with_env(args: &[&str], vars: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(ogd_bin());
    cmd.args(args)
        .env_remove("OGD_CONFIG")
        .env_remove("OGD_INFERENCE")
        .env_remove("OGD_HISTOGRAM_BINS")
        .env_remove("OGD_MAX_ROWS")
        .env_remove("OGD_LOG");
    for (key, value) in vars {
        cmd.env(key, value);
    }
    cmd.output().expect("run ogd")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "ogd failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("utf8 stdout")
}

const SESSIONS: &str = "\
session_id\tlevel\tclass\tplay_time
s1\t1\tA\t30
s2\t3\tB\t45.5
s3\t5\tA\t60
s4\t8\tC\t
s5\t10\tB\t120
";

fn session_export(dir: &Path) -> PathBuf {
    let path = dir.join("AQUALAB_20230101_to_20230131_abc123_session-features.tsv");
    fs::write(&path, SESSIONS).expect("write sessions");
    path
}

fn population_export(dir: &Path, completions: &str) -> PathBuf {
    let path = dir.join("AQUALAB_20230101_to_20230131_abc123_population-features.tsv");
    let header = [
        "SessionCount",
        "job0_JobsAttempted-job-name",
        "job0_JobsAttempted-num-starts",
        "job1_JobsAttempted-job-name",
        "job1_JobsAttempted-num-starts",
        "job2_JobsAttempted-job-name",
        "job2_JobsAttempted-num-starts",
        "TopJobCompletionDestinations",
    ];
    let row = [
        "120",
        "kelp-welcome",
        "40",
        "kelp-urchins",
        "31",
        "arctic-ice",
        "12",
        completions,
    ];
    fs::write(&path, format!("{}\n{}\n", header.join("\t"), row.join("\t")))
        .expect("write population");
    path
}

#[test]
fn inspect_reports_schema_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let out = stdout(&run(&["inspect", path.to_str().unwrap(), "--format", "json"]));
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["level"], "session");
    assert_eq!(report["rows"], 5);
    assert_eq!(report["column_types"]["level"], "numeric");
    assert_eq!(report["column_types"]["class"], "categorical");
    assert_eq!(report["export"]["game"], "AQUALAB");
    assert!(report["chart_types"]
        .as_array()
        .unwrap()
        .contains(&serde_json::json!("histogram")));
}

#[test]
fn filter_writes_matching_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let out = stdout(&run(&[
        "filter",
        path.to_str().unwrap(),
        "--range",
        "level=0:3,9:10",
        "--allow",
        "class=A,B",
    ]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "session_id\tlevel\tclass\tplay_time");
    let ids: Vec<&str> = lines[1..]
        .iter()
        .map(|l| l.split('\t').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["s1", "s2", "s5"]);
}

#[test]
fn filter_rejects_range_on_categorical_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let output = run(&["filter", path.to_str().unwrap(), "--range", "class=0:1"]);
    assert!(!output.status.success());
}

#[test]
fn split_writes_both_children() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let out_dir = dir.path().join("split");
    stdout(&run(&[
        "split",
        path.to_str().unwrap(),
        "--feature",
        "level",
        "--threshold",
        "5",
        "--out-dir",
        out_dir.to_str().unwrap(),
        "--compare",
        "play_time",
    ]));
    let stem = "AQUALAB_20230101_to_20230131_abc123_session-features";
    let accepted = fs::read_to_string(out_dir.join(format!("{stem}.accepted.tsv"))).unwrap();
    let rejected = fs::read_to_string(out_dir.join(format!("{stem}.rejected.tsv"))).unwrap();
    // Header plus rows.
    assert_eq!(accepted.lines().count(), 1 + 2);
    assert_eq!(rejected.lines().count(), 1 + 3);
}

#[test]
fn describe_column_emits_histogram() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let out = stdout(&run(&[
        "describe",
        path.to_str().unwrap(),
        "--column",
        "play_time",
        "--bins",
        "3",
        "--format",
        "json",
    ]));
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["summary"]["stats"]["kind"], "numeric");
    assert_eq!(report["summary"]["stats"]["missing"], 1);
    let bins = report["histogram"].as_array().unwrap();
    assert_eq!(bins.len(), 3);
    let total: u64 = bins.iter().map(|b| b["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 4);
}

#[test]
fn graph_derives_completion_links() {
    let dir = tempfile::tempdir().unwrap();
    let path = population_export(
        dir.path(),
        concat!(
            r#"{"kelp-welcome":{"kelp-urchins":["p1","p2"],"kelp-welcome":["p3"]},"#,
            r#""kelp-urchins":{"arctic-ice":["p1"]}}"#,
        ),
    );
    let out = stdout(&run(&[
        "graph",
        path.to_str().unwrap(),
        "--mode",
        "top-job-completion-destinations",
        "--sankey",
    ]));
    let layout: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(layout["columns"], 3);
    assert_eq!(layout["links"].as_array().unwrap().len(), 2);
}

#[test]
fn sankey_fails_on_cycles() {
    let dir = tempfile::tempdir().unwrap();
    let path = population_export(
        dir.path(),
        r#"{"kelp-welcome":{"kelp-urchins":["p1"]},"kelp-urchins":{"kelp-welcome":["p2"]}}"#,
    );
    let output = run(&[
        "graph",
        path.to_str().unwrap(),
        "--mode",
        "TopJobCompletionDestinations",
        "--sankey",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("kelp-welcome"), "stderr: {stderr}");

    // Without --sankey the cyclic graph is still rendered.
    let dot = stdout(&run(&[
        "graph",
        path.to_str().unwrap(),
        "--mode",
        "TopJobCompletionDestinations",
        "--format",
        "dot",
    ]));
    assert!(dot.contains("\"kelp-urchins\" -> \"kelp-welcome\""));
}

fn write_config(dir: &Path, name: &str, bins: usize) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!(r#"{{"histogram_bins": {bins}}}"#)).expect("write config");
    path
}

fn histogram_len(output: &Output) -> usize {
    let report: serde_json::Value = serde_json::from_str(&stdout(output)).unwrap();
    report["histogram"].as_array().unwrap().len()
}

#[test]
fn histogram_bins_follow_config_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let env_config = write_config(dir.path(), "env.json", 3);
    let flag_config = write_config(dir.path(), "flag.json", 4);
    let describe = [
        "describe",
        path.to_str().unwrap(),
        "--column",
        "play_time",
        "--format",
        "json",
    ];
    let config_env = ("OGD_CONFIG", env_config.to_str().unwrap());

    assert_eq!(histogram_len(&run(&describe)), 10);
    assert_eq!(histogram_len(&run_with_env(&describe, &[config_env])), 3);
    assert_eq!(
        histogram_len(&run_with_env(
            &describe,
            &[config_env, ("OGD_HISTOGRAM_BINS", "5")]
        )),
        5
    );

    let with_bins: Vec<&str> = describe.iter().copied().chain(["--bins", "2"]).collect();
    assert_eq!(
        histogram_len(&run_with_env(
            &with_bins,
            &[config_env, ("OGD_HISTOGRAM_BINS", "5")]
        )),
        2
    );

    let with_config: Vec<&str> = describe
        .iter()
        .copied()
        .chain(["--config", flag_config.to_str().unwrap()])
        .collect();
    assert_eq!(histogram_len(&run_with_env(&with_config, &[config_env])), 4);
}

#[test]
fn invalid_env_override_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = session_export(dir.path());
    let output = run_with_env(
        &["describe", path.to_str().unwrap(), "--column", "play_time"],
        &[("OGD_HISTOGRAM_BINS", "many")],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OGD_HISTOGRAM_BINS"), "stderr: {stderr}");
}
