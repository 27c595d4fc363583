use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::fs;
use tempfile::TempDir;

const NOW: &str = "2024-06-30T00:00:00Z";

// open + mergeable (5 days old), merged after 2 days, closed after 3 days
const PRS: &str = r#"[
  {"number": 1, "user": {"id": 1, "login": "alice"},
   "created_at": "2024-06-25T00:00:00Z", "merged_at": null, "closed_at": null,
   "mergeable": true},
  {"number": 2, "user": {"id": 2, "login": "bob"},
   "created_at": "2024-06-01T00:00:00Z",
   "merged_at": "2024-06-03T00:00:00Z", "closed_at": "2024-06-03T00:00:00Z",
   "merged_by": {"id": 1, "login": "alice"}},
  {"number": 3, "user": {"id": 1, "login": "alice"},
   "created_at": "2024-06-01T00:00:00Z",
   "merged_at": null, "closed_at": "2024-06-04T00:00:00Z"}
]"#;

fn fixture() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prs.json");
    fs::write(&input, PRS).unwrap();
    (dir, input)
}

fn report_cmd(dir: &TempDir, input: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("prstats").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PRSTATS_LOG")
        .arg("report")
        .arg("octo")
        .arg("repo")
        .arg("--input")
        .arg(input)
        .arg("--now")
        .arg(NOW);
    cmd
}

#[test]
fn test_text_report_from_input_file() {
    let (dir, input) = fixture();
    report_cmd(&dir, &input)
        .assert()
        .success()
        .stdout(contains("Total Pull Requests: 3"))
        .stdout(contains("Open Mergeable Pull Requests: 1"))
        .stdout(contains("Percentage Merged Pull Requests: 33%"))
        .stdout(contains("Minimum Days Open: 5"))
        .stdout(contains("  100% (2 Days to Merge): 1"));
}

#[test]
fn test_all_sections() {
    let (dir, input) = fixture();
    let out = report_cmd(&dir, &input)
        .arg("--all")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Total Users: 2"));
    assert!(text.contains("Max Pull Requests by User: 2 [alice]"));
    assert!(text.contains("Total Merging Users: 1"));
    assert!(text.contains("Max Pull Requests Merged by User: 1 [alice]"));
    assert!(text.contains("Percentage Self Merged Pull Requests: 0%"));

    // alice (2 records) is listed before bob in the detailed author section
    let re = regex::Regex::new(r"(?m)^alice\n(?s:.*)^bob\n").unwrap();
    assert!(re.is_match(&text));
}

#[test]
fn test_json_report_to_file() {
    let (dir, input) = fixture();
    let out = dir.path().join("report.json");
    report_cmd(&dir, &input)
        .arg("--format")
        .arg("json")
        .arg("--user-summary")
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["source"], "octo/repo");
    assert_eq!(json["overall"]["total"], 3);
    assert_eq!(json["overall"]["days_to_close"]["min"], 3);
    assert_eq!(json["user_summary"]["total_users"], 2);
    assert!(json.get("merge_summary").is_none());
}

#[test]
fn test_record_created_after_now_is_skipped() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prs.json");
    fs::write(
        &input,
        r#"[
  {"number": 1, "user": {"id": 1, "login": "alice"},
   "created_at": "2024-06-25T00:00:00Z"},
  {"number": 2, "user": {"id": 1, "login": "alice"},
   "created_at": "2024-07-09T00:00:00Z"}
]"#,
    )
    .unwrap();
    report_cmd(&dir, &input)
        .assert()
        .success()
        .stdout(contains("Total Pull Requests: 1"))
        .stdout(contains("Skipped Pull Requests: 1"))
        .stderr(contains("record_skipped"));
}

#[test]
fn test_config_file_sections() {
    let (dir, input) = fixture();
    fs::write(
        dir.path().join("prstats.yaml"),
        "version: 1\nsections:\n  merge_summary: true\npercentiles: [50]\n",
    )
    .unwrap();
    report_cmd(&dir, &input)
        .assert()
        .success()
        .stdout(contains("Total Merging Users: 1"))
        .stdout(contains("  50% (5 Days Open): 1"))
        .stdout(contains("  25%").not());
}

#[test]
fn test_bad_config_is_config_error() {
    let (dir, input) = fixture();
    fs::write(dir.path().join("prstats.yaml"), "version: 9\n").unwrap();
    report_cmd(&dir, &input)
        .assert()
        .code(2)
        .stderr(contains("unsupported config version 9"));
}

#[test]
fn test_bad_now_is_config_error() {
    let (dir, input) = fixture();
    let mut cmd = Command::cargo_bin("prstats").unwrap();
    cmd.current_dir(dir.path())
        .args(["report", "octo", "repo", "--now", "last tuesday", "--input"])
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("invalid --now"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    report_cmd(&dir, &dir.path().join("nope.json"))
        .assert()
        .code(2)
        .stderr(contains("failed to read input"));
}

#[test]
fn test_init_writes_sample_config_once() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("prstats")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stderr(contains("created prstats.yaml"));
    assert!(dir.path().join("prstats.yaml").exists());

    Command::cargo_bin("prstats")
        .unwrap()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stderr(contains("already exists"));
}

#[test]
fn test_version() {
    Command::cargo_bin("prstats")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}
