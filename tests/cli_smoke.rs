use assert_cmd::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_input(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("input.toml");
    fs::write(&path, content).unwrap();
    path
}

fn contrib_stats() -> Command {
    let mut cmd = Command::cargo_bin("contrib-stats").unwrap();
    cmd.env_remove("GITHUB_AUTH_TOKEN").env_remove("RUST_LOG");
    cmd
}

#[test]
fn empty_stats_writes_empty_json() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "stats = []\n");
    let output = dir.path().join("out.json");

    contrib_stats()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(v, serde_json::json!({}));
}

#[test]
fn stdout_gets_debug_dump() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "");

    let out = contrib_stats()
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8(out).unwrap(), "{}\n");
}

#[test]
fn jobs_without_repositories_produce_empty_tallies() {
    let dir = tempdir().unwrap();
    let input = write_input(
        dir.path(),
        r#"
        [default]
        filetypes = ["rs"]

        [[stats]]
        label = "first"

        [[stats]]
        label = "second"
        "#,
    );
    let output = dir.path().join("out.toml");

    let assert = contrib_stats()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("first"));
    assert!(stderr.contains("second"));
    let _: toml::Table = toml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
}

#[test]
fn csv_with_several_jobs_warns_up_front() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "[[stats]]\nlabel = \"a\"\n[[stats]]\nlabel = \"b\"\n");
    let output = dir.path().join("out.csv");

    let assert = contrib_stats()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert!(stderr.contains("only the last 'stats' will make it to the output!"));
    assert!(stderr.contains("you will get ratelimited"));
    assert_eq!(fs::read_to_string(&output).unwrap(), "user,contrib\n");
}

#[test]
fn silent_mode_prints_nothing() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "[[stats]]\nlabel = \"a\"\n[[stats]]\nlabel = \"b\"\n");
    let output = dir.path().join("out.yaml");

    let assert = contrib_stats()
        .arg("--silent")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    assert!(assert.get_output().stderr.is_empty());
    assert!(assert.get_output().stdout.is_empty());
    assert!(output.exists());
}

#[test]
fn missing_input_exits_1() {
    let dir = tempdir().unwrap();
    let assert = contrib_stats()
        .arg("-i")
        .arg(dir.path().join("nope.toml"))
        .assert()
        .code(1);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert_eq!(stderr.matches("nope.toml").count(), 1);
}

#[test]
fn unopenable_output_exits_2() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "");
    contrib_stats()
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(dir.path().join("missing-dir").join("out.json"))
        .assert()
        .code(2);
}

#[test]
fn malformed_input_exits_3() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "[[stats]\nlabel = ");
    let assert = contrib_stats().arg("-i").arg(&input).assert().code(3);

    let stderr = String::from_utf8(assert.get_output().stderr.clone()).unwrap();
    assert_eq!(stderr.matches("TOML parse error").count(), 1);
}

#[test]
fn invalid_date_exits_3() {
    let dir = tempdir().unwrap();
    let input = write_input(dir.path(), "[[stats]]\nend_date = \"last tuesday\"\n");
    contrib_stats().arg("-i").arg(&input).assert().code(3);
}
