//! Integration tests for the `season` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the generate,
//! validate and scan subcommands through the actual binary, including file
//! output, exit codes and error reporting.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the two-week, four-team config.
fn small_yaml_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/small.yaml")
}

/// Helper: path to a fixture list that satisfies every hard constraint.
fn valid_games_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/valid_games.json")
}

/// Helper: path to a fixture list with one unplaced game.
fn invalid_games_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/invalid_games.json")
}

// ─────────────────────────────────────────────────────────────────────────────
// Generate subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn generate_to_stdout() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["generate", small_yaml_path(), "--seed", "1"])
        .assert()
        .code(predicate::in_iter([0, 1]))
        .stdout(predicate::str::contains("\"status\": \"placed\""))
        .stdout(predicate::str::contains("\"game_code\": \"C001\""))
        .stderr(predicate::str::contains("seed=1"))
        .stderr(predicate::str::contains("SCHEDULE VALIDATION REPORT"));
}

#[test]
fn generate_to_file_with_stats() {
    let output_path = "/tmp/season-test-generate-games.json";
    let stats_path = "/tmp/season-test-generate-stats.json";
    let _ = std::fs::remove_file(output_path);
    let _ = std::fs::remove_file(stats_path);

    Command::cargo_bin("season")
        .unwrap()
        .args([
            "generate",
            small_yaml_path(),
            "--seed",
            "3",
            "-o",
            output_path,
            "--stats",
            stats_path,
        ])
        .assert()
        .code(predicate::in_iter([0, 1]))
        .stdout(predicate::str::is_empty());

    let games: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output_path).expect("games file must exist"))
            .unwrap();
    assert!(!games.as_array().unwrap().is_empty());

    let stats: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(stats_path).expect("stats file must exist"))
            .unwrap();
    for team in ["A1", "A2", "B1", "B2"] {
        assert!(stats["teams"][team]["total"].as_u64().unwrap() > 0, "{} has no games", team);
    }

    let _ = std::fs::remove_file(output_path);
    let _ = std::fs::remove_file(stats_path);
}

#[test]
fn generate_writes_text_stats() {
    let stats_path = "/tmp/season-test-generate-stats.txt";
    let _ = std::fs::remove_file(stats_path);

    Command::cargo_bin("season")
        .unwrap()
        .args([
            "generate",
            small_yaml_path(),
            "--seed",
            "3",
            "--stats",
            stats_path,
            "--stats-format",
            "text",
        ])
        .assert()
        .code(predicate::in_iter([0, 1]));

    let text = std::fs::read_to_string(stats_path).expect("stats file must exist");
    assert!(text.contains("SCHEDULE STATISTICS"));
    assert!(text.contains("--- SEASON BALANCE ---"));
    assert!(text.contains("--- MATCHUP MATRIX ---"));

    let _ = std::fs::remove_file(stats_path);
}

#[test]
fn generate_rejects_unknown_stats_format() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["generate", small_yaml_path(), "--stats-format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("xml"));
}

#[test]
fn generate_is_reproducible_with_a_seed() {
    let run = || {
        Command::cargo_bin("season")
            .unwrap()
            .args(["generate", small_yaml_path(), "--seed", "7"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn generate_then_validate_roundtrip() {
    let output_path = "/tmp/season-test-roundtrip-games.json";
    let _ = std::fs::remove_file(output_path);

    let generated = Command::cargo_bin("season")
        .unwrap()
        .args(["generate", small_yaml_path(), "--seed", "5", "-o", output_path])
        .output()
        .unwrap();

    // Re-validating the written file reaches the same verdict.
    let validated = Command::cargo_bin("season")
        .unwrap()
        .args(["validate", small_yaml_path(), "-i", output_path])
        .output()
        .unwrap();
    assert_eq!(generated.status.code(), validated.status.code());

    let _ = std::fs::remove_file(output_path);
}

#[test]
fn generate_missing_config_fails() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["generate", "/nonexistent/league.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Validate subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn validate_clean_schedule_succeeds() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["validate", small_yaml_path(), "-i", valid_games_path()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loaded 8 fixtures"))
        .stderr(predicate::str::contains("RESULT: VALID"))
        .stderr(predicate::str::contains("Intra-pool pair A1 vs A2 played 2 times"));
}

#[test]
fn validate_unplaced_game_fails() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["validate", small_yaml_path(), "-i", invalid_games_path()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("RESULT: INVALID (1 violations)"))
        .stderr(predicate::str::contains("UNSCHEDULED: A1 vs A2 (week 1 WD)"));
}

#[test]
fn validate_malformed_json_fails() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["validate", small_yaml_path(), "-i", small_yaml_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse fixtures"));
}

#[test]
fn validate_requires_input() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["validate", small_yaml_path()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Scan subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn scan_prints_a_row_per_seed() {
    Command::cargo_bin("season")
        .unwrap()
        .args(["scan", small_yaml_path(), "-n", "3"])
        .assert()
        .code(predicate::in_iter([0, 1]))
        .stdout(predicate::str::contains("Scanning seeds 0..2"))
        .stdout(predicate::str::contains("Unsched"))
        .stdout(predicate::str::contains("Good seeds").or(predicate::str::contains("No good seeds")));
}

// ─────────────────────────────────────────────────────────────────────────────
// General
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn help_flag_shows_usage() {
    Command::cargo_bin("season")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("scan"));
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("season")
        .unwrap()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("unrecognized")));
}
