//! Tests for the bemdeps command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::TestProject;

fn project_with_cycle() -> TestProject {
    let project = TestProject::new().unwrap();
    project
        .deps("common.blocks", "page", r#"{"mustDeps": "reset", "shouldDeps": {"elems": ["header"]}}"#)
        .deps("common.blocks", "a", r#"{"mustDeps": "b"}"#)
        .deps("common.blocks", "b", r#"{"mustDeps": "a"}"#);
    project.write("page.bemdecl.json", r#"{"blocks": [{"name": "page"}]}"#);
    project.write("cycle.deps.json", r#"{"deps": ["a"]}"#);
    project
}

#[test]
fn test_resolve_text_output() {
    let project = project_with_cycle();
    let output = project
        .run_bemdeps(&["resolve", "page.bemdecl.json", "--level", "common.blocks"])
        .unwrap();
    output.assert_success();
    assert_eq!(output.stdout_lines(), ["reset", "page", "page__header"]);
}

#[test]
fn test_resolve_json_output() {
    let project = project_with_cycle();
    let output = project
        .run_bemdeps(&["resolve", "cycle.deps.json", "-l", "common.blocks", "--format", "json"])
        .unwrap();
    output.assert_success();

    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(json["deps"], serde_json::json!([{"block": "b"}, {"block": "a"}]));
    assert_eq!(json["cycles"]["mustDeps"].as_array().unwrap().len(), 1);
}

#[test]
fn test_resolve_bemdecl_output() {
    let project = project_with_cycle();
    let output = project
        .run_bemdeps(&["resolve", "page.bemdecl.json", "-l", "common.blocks", "-f", "bemdecl"])
        .unwrap();
    output.assert_success();

    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"blocks": [
            {"name": "reset"},
            {"name": "page", "elems": [{"name": "header"}]}
        ]})
    );
}

#[test]
fn test_cycle_warning_in_default_mode() {
    let project = project_with_cycle();
    let output = project.run_bemdeps(&["resolve", "cycle.deps.json", "-l", "common.blocks"]).unwrap();
    output.assert_success().assert_stderr_contains("b <- a <- b");
    assert_eq!(output.stdout_lines(), ["b", "a"]);
}

#[test]
fn test_strict_mode_fails_on_cycle() {
    let project = project_with_cycle();
    let output = project
        .run_bemdeps(&["resolve", "cycle.deps.json", "-l", "common.blocks", "--strict"])
        .unwrap();
    output.assert_failure().assert_stderr_contains("Circular dependency");
    assert!(output.stdout.is_empty());
}

#[test]
fn test_config_file_supplies_levels_and_strict() {
    let project = project_with_cycle();
    project.write("bemdeps.toml", "levels = [\"common.blocks\"]\nstrict = true\n");

    let mut cmd = Command::cargo_bin("bemdeps").unwrap();
    cmd.current_dir(project.dir())
        .env("NO_COLOR", "1")
        .args(["resolve", "page.bemdecl.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page__header"));

    let mut cmd = Command::cargo_bin("bemdeps").unwrap();
    cmd.current_dir(project.dir())
        .env("NO_COLOR", "1")
        .args(["resolve", "cycle.deps.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Circular dependency"));
}

#[test]
fn test_explicit_config_path() {
    let project = project_with_cycle();
    project.write("conf/custom.toml", "levels = [\"../common.blocks\"]\n");

    project
        .run_bemdeps(&["--config", "conf/custom.toml", "resolve", "page.bemdecl.json"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("reset");

    project
        .run_bemdeps(&["--config", "conf/missing.toml", "index"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("does not exist");
}

#[test]
fn test_tree_output() {
    let project = project_with_cycle();
    let output =
        project.run_bemdeps(&["tree", "page.bemdecl.json", "--level", "common.blocks"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("└── page\n")
        .assert_stdout_contains("[must] reset")
        .assert_stdout_contains("[should] page__header");
}

#[test]
fn test_tree_lists_cycles() {
    let project = project_with_cycle();
    project
        .run_bemdeps(&["tree", "cycle.deps.json", "-l", "common.blocks"])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("Must-dependency cycles:")
        .assert_stdout_contains("a, b");
}

#[test]
fn test_index_output() {
    let project = project_with_cycle();
    project.entity_file("common.blocks", "page__header", "css", ".page__header {}");

    let output = project.run_bemdeps(&["index", "-l", "common.blocks"]).unwrap();
    output
        .assert_success()
        .assert_stdout_contains("page__header\n")
        .assert_stdout_contains("4 entities in 1 level(s)");

    let output = project.run_bemdeps(&["index", "-l", "common.blocks", "-f", "json"]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&output.stdout).unwrap();
    let entities: Vec<&str> =
        json.as_array().unwrap().iter().map(|e| e["entity"].as_str().unwrap()).collect();
    assert_eq!(entities, ["a", "b", "page", "page__header"]);
}

#[test]
fn test_invalid_format() {
    let project = project_with_cycle();
    project
        .run_bemdeps(&["resolve", "page.bemdecl.json", "-l", "common.blocks", "-f", "yaml"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("Invalid format");
}

#[test]
fn test_missing_level() {
    let project = project_with_cycle();
    project
        .run_bemdeps(&["resolve", "page.bemdecl.json", "-l", "no.blocks"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("no.blocks");
}

#[test]
fn test_malformed_declaration() {
    let project = project_with_cycle();
    project.write("bad.json", r#"{"bundles": []}"#);
    project
        .run_bemdeps(&["resolve", "bad.json", "-l", "common.blocks"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("bad.json");
}

#[test]
fn test_help() {
    let mut cmd = Command::cargo_bin("bemdeps").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("index"));
}
