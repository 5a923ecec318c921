use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rvw_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("rvw");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(
        data_dir.join("Manual_Review.csv"),
        "Batch,batch_count,portal_status,reason\n\
         B001,1,Pending,\n\
         B001,2,Accepted,Approved by agent\n\
         B001,3,Accepted,\n\
         B002,1,Rejected,\"Missing information, resubmit\"\n",
    )
    .unwrap();

    let config_content = format!(
        r#"[catalog]
path = "{}/data/Manual_Review.csv"

[server]
bind = "127.0.0.1:7341"
"#,
        root.display()
    );

    let config_path = config_dir.join("rvw.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_rvw(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rvw_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rvw binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_catalog_expands_each_row_into_two_records() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_rvw(&config_path, &["catalog"]);
    assert!(success, "catalog failed: stdout={}, stderr={}", stdout, stderr);

    // 4 table rows, two records each.
    assert!(stdout.contains("8 records"));
    assert!(stdout.contains("CI/B001/B001_1.pdf"));
    assert!(stdout.contains("PL/B001/B001_1.pdf"));
    assert!(stdout.contains("CI/B002/B002_1.pdf"));
}

#[test]
fn test_catalog_shares_status_across_both_types() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_rvw(&config_path, &["catalog"]);
    assert!(success);

    let rejected_rows: Vec<&str> = stdout
        .lines()
        .filter(|line| line.contains("Rejected"))
        .collect();
    assert_eq!(rejected_rows.len(), 2);
    assert!(rejected_rows.iter().any(|l| l.contains("CI/B002")));
    assert!(rejected_rows.iter().any(|l| l.contains("PL/B002")));
}

#[test]
fn test_catalog_falls_back_to_seed_fixture() {
    let (_tmp, config_path) = setup_test_env();

    // Point the config at a missing file; seed_fallback defaults to true.
    let tmp2 = TempDir::new().unwrap();
    let config_content = format!(
        r#"[catalog]
path = "{}/absent.csv"

[server]
bind = "127.0.0.1:7341"
"#,
        tmp2.path().display()
    );
    fs::write(&config_path, config_content).unwrap();

    let (stdout, _, success) = run_rvw(&config_path, &["catalog"]);
    assert!(success);
    // 5 seed rows, two records each.
    assert!(stdout.contains("10 records"));
}

#[test]
fn test_catalog_malformed_table_fails() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        tmp.path().join("data").join("Manual_Review.csv"),
        "wrong,header\nB001,1\n",
    )
    .unwrap();

    let (_, stderr, success) = run_rvw(&config_path, &["catalog"]);
    assert!(!success, "catalog should fail on a malformed table");
    assert!(stderr.contains("catalog source error"));
}

#[test]
fn test_pairs_adjacent_plus_first_last_in_order() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_rvw(&config_path, &["pairs", "B001"]);
    assert!(success, "pairs failed: stdout={}, stderr={}", stdout, stderr);

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["Ver 1 vs 2", "Ver 2 vs 3", "Ver 1 vs 3"]);
}

#[test]
fn test_pairs_two_versions_single_pair() {
    let (tmp, config_path) = setup_test_env();

    fs::write(
        tmp.path().join("data").join("Manual_Review.csv"),
        "Batch,batch_count,portal_status,reason\nB001,1,Pending,\nB001,2,Pending,\n",
    )
    .unwrap();

    let (stdout, _, success) = run_rvw(&config_path, &["pairs", "B001"]);
    assert!(success);
    assert_eq!(stdout.lines().collect::<Vec<_>>(), vec!["Ver 1 vs 2"]);
}

#[test]
fn test_pairs_single_version_not_comparable() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_rvw(&config_path, &["pairs", "B002", "--doc-type", "PL"]);
    assert!(success);
    assert!(stdout.contains("Not enough versions available"));
}

#[test]
fn test_pairs_unknown_batch_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_rvw(&config_path, &["pairs", "B999"]);
    assert!(!success);
    assert!(stderr.contains("unknown batch"));
}

#[test]
fn test_pairs_rejects_unknown_doc_type() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_rvw(&config_path, &["pairs", "B001", "--doc-type", "ZZ"]);
    assert!(!success);
    assert!(stderr.contains("unknown document type"));
}

#[test]
fn test_sources_reports_catalog_and_storage() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, _, success) = run_rvw(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("catalog"));
    assert!(stdout.contains("storage"));
    assert!(stdout.contains("NOT CONFIGURED"));
    assert!(stdout.contains("viewer chain"));
}
