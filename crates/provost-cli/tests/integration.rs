use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let config_path = dir.path().join("provost.yaml");
    let yaml = format!(
        "version: 1\ndatabase_path: {}\nqueue_path: {}\n",
        dir.path().join("provost.db").display(),
        dir.path().join("queue.redb").display(),
    );
    std::fs::write(&config_path, yaml).unwrap();
    config_path
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("provost")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("retry"));
}

#[test]
fn courses_on_fresh_store_is_empty() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    Command::cargo_bin("provost")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "courses"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn status_for_unknown_course_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    Command::cargo_bin("provost")
        .unwrap()
        .args([
            "--config",
            config.to_str().unwrap(),
            "status",
            "00000000-0000-0000-0000-000000000000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("course not found"));
}

#[test]
fn config_reports_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);
    Command::cargo_bin("provost")
        .unwrap()
        .args(["--config", config.to_str().unwrap(), "config"])
        .env_remove("PROVOST_CHAT_TOKEN")
        .env_remove("PROVOST_REPOS_TOKEN")
        .assert()
        .success()
        .stdout(predicate::str::contains("repos.org"));
}
