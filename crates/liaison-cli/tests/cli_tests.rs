//! End-to-end tests for the `liaison` binary
//!
//! Each test gets its own database and config file in a temp directory.

use std::path::Path;
use std::process::{Command, Output};

fn liaison(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_liaison"))
        .arg("--db")
        .arg(dir.join("liaison.db"))
        .arg("--config")
        .arg(dir.join("config.toml"))
        .arg("--no-color")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run liaison")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn add_person(dir: &Path, name: &str, gender: &str) -> String {
    stdout(&liaison(
        dir,
        &["--format", "quiet", "actor", "add", name, "--gender", gender],
    ))
}

#[test]
fn test_link_and_list_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ana = add_person(dir.path(), "Ana", "female");
    let luis = add_person(dir.path(), "Luis", "male");
    let marta = add_person(dir.path(), "Marta", "female");

    let first = stdout(&liaison(
        dir.path(),
        &["--format", "quiet", "link", &luis, &ana, "--sub-type", "spouse"],
    ));
    let second = stdout(&liaison(
        dir.path(),
        &["--format", "quiet", "link", &luis, &marta, "--sub-type", "spouse"],
    ));

    let current = stdout(&liaison(dir.path(), &["--format", "quiet", "list", &luis]));
    assert_eq!(current, second);

    let all = stdout(&liaison(dir.path(), &["--format", "quiet", "list", &luis, "--all"]));
    assert!(all.contains(&first));
    assert!(all.contains(&second));

    let json = stdout(&liaison(dir.path(), &["--format", "json", "show", &first]));
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["state"], "ended");
}

#[test]
fn test_self_link_fails() {
    let dir = tempfile::tempdir().unwrap();
    let ana = add_person(dir.path(), "Ana", "female");

    let output = liaison(dir.path(), &["link", &ana, &ana, "--type", "commercial"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Validation error"));
}

#[test]
fn test_end_twice_reports_invalid_state() {
    let dir = tempfile::tempdir().unwrap();
    let ana = add_person(dir.path(), "Ana", "female");
    let luis = add_person(dir.path(), "Luis", "male");
    let link = stdout(&liaison(
        dir.path(),
        &["--format", "quiet", "link", &ana, &luis, "--sub-type", "sibling"],
    ));

    stdout(&liaison(dir.path(), &["end", &link]));
    let output = liaison(dir.path(), &["end", &link]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid state"));
}

fn liaison_at_home(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_liaison"))
        .args(args)
        .env("HOME", home)
        .env_remove("LIAISON_CONFIG")
        .env_remove("LIAISON_DB")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run liaison")
}

#[test]
fn test_invalid_home_config_is_reported_and_kept() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join(".liaison");
    std::fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("config.toml");
    let contents = "database = \"mine.db\"\n\n[engine]\nexclusive_sub_types = [\"spouse\", \"cousin\"]\n";
    std::fs::write(&config_path, contents).unwrap();

    let output = liaison_at_home(home.path(), &["actor", "list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cousin"));

    assert_eq!(std::fs::read_to_string(&config_path).unwrap(), contents);
    assert!(!config_dir.join("liaison.db").exists());
}

#[test]
fn test_first_run_writes_default_home_config() {
    let home = tempfile::tempdir().unwrap();

    let output = liaison_at_home(home.path(), &["--format", "quiet", "actor", "list"]);
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(home.path().join(".liaison").join("config.toml").exists());
    assert!(home.path().join(".liaison").join("liaison.db").exists());
}
