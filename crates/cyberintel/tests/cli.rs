use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::process::Command;

fn cyberintel_cmd() -> Command {
  let mut cmd = Command::cargo_bin("cyberintel").expect("binary exists");
  cmd.env_remove("CYBERINTEL_SERVER").env_remove("CYBERINTEL_DATA_DIR");
  cmd
}

#[test]
fn test_help_lists_commands() {
  cyberintel_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(contains("crawl").and(contains("ingest")).and(contains("ask")).and(contains("status")));
}

#[test]
fn test_unknown_crawl_target_is_rejected() {
  cyberintel_cmd().args(["crawl", "eu"]).assert().failure().stderr(contains("invalid value"));
}

#[test]
fn test_ask_requires_a_question() {
  cyberintel_cmd().arg("ask").assert().failure();
}

#[test]
#[serial]
fn test_ingest_without_crawler_output_does_nothing() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("notes.json").write_str("[]").unwrap();

  cyberintel_cmd()
    .args(["ingest", "--input-dir"])
    .arg(temp.path())
    .arg("--data-dir")
    .arg(temp.path().join("index"))
    .assert()
    .success()
    .stdout(contains("No documents to ingest"));

  temp.child("index").assert(predicate::path::missing());
  temp.close().unwrap();
}

#[test]
#[serial]
fn test_ingest_with_empty_output_file_does_nothing() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("output.json").write_str("[]").unwrap();

  cyberintel_cmd()
    .args(["ingest", "--input-dir"])
    .arg(temp.path())
    .assert()
    .success()
    .stdout(contains("output.json (0 items)").and(contains("No documents to ingest")));

  temp.close().unwrap();
}

#[test]
fn test_ingest_missing_directory_fails() {
  cyberintel_cmd()
    .args(["ingest", "--input-dir", "/definitely/not/a/dir"])
    .assert()
    .failure()
    .stderr(contains("Failed to read input directory"));
}

#[test]
#[serial]
fn test_ask_reports_unreachable_server() {
  cyberintel_cmd()
    .args(["ask", "What", "is", "phishing?", "--server", "http://127.0.0.1:9"])
    .assert()
    .failure()
    .stderr(contains("Could not reach cyberintel server"));
}

#[test]
#[serial]
fn test_server_env_var_is_used() {
  cyberintel_cmd()
    .env("CYBERINTEL_SERVER", "http://127.0.0.1:9")
    .arg("status")
    .assert()
    .failure()
    .stderr(contains("http://127.0.0.1:9"));
}

#[test]
fn test_server_help_shows_retrieval_options() {
  Command::cargo_bin("cyberintel_server")
    .expect("binary exists")
    .arg("--help")
    .assert()
    .success()
    .stdout(contains("--relevance-threshold").and(contains("--no-llm")).and(contains("--bind")));
}
