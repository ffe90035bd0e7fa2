//! CLI Integration Tests for recall
//!
//! Runs the built binary against temporary note files. No config file is
//! present, so the defaults (mock embedder, in-memory index) apply.

use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run recall with arguments inside `dir`
fn run_recall(args: &[&str], dir: &TempDir) -> Output {
    Command::new(env!("CARGO_BIN_EXE_recall"))
        .args(["--no-color"])
        .args(args)
        .current_dir(dir.path())
        .env("RUST_LOG", "off")
        .env_remove("RECALL_ENV")
        .output()
        .expect("Failed to execute recall")
}

fn write_note(dir: &TempDir, name: &str, text: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, text).expect("Failed to write note");
    path.display().to_string()
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = run_recall(&["--help"], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["chunk", "embed", "ingest", "query", "prompt", "config"] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_recall(&["--version"], &dir);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("recall"));
}

// =============================================================================
// Pipeline Commands
// =============================================================================

#[test]
fn test_chunk_prints_lengths() {
    let dir = TempDir::new().unwrap();
    let note = write_note(&dir, "note.md", "One short line. Another short line. A third.");

    let output = run_recall(&["chunk", &note, "--max-length", "20"], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("3 chunks"));
    assert!(stdout.contains("[0] 15 chars"));
}

#[test]
fn test_embed_reports_mock_backend() {
    let dir = TempDir::new().unwrap();
    let output = run_recall(&["embed", "hello"], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mock"));
    assert!(stdout.contains("1536"));
}

#[test]
fn test_query_with_files_ranks_results() {
    let dir = TempDir::new().unwrap();
    let vectors = write_note(&dir, "vectors.md", "Vector databases power semantic search.");
    let pkm = write_note(&dir, "pkm.md", "A second brain links notes together.");

    let output = run_recall(
        &["query", "semantic search", "--file", &vectors, "--file", &pkm, "-k", "1"],
        &dir,
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Results for \"semantic search\""));
    assert_eq!(stdout.matches(" 1. ").count(), 1);
    assert!(!stdout.contains(" 2. "));
}

#[test]
fn test_prompt_prints_completion_request() {
    let dir = TempDir::new().unwrap();
    let note = write_note(&dir, "rag.md", "Retrieval puts your notes into the prompt.");

    let output = run_recall(&["prompt", "what is retrieval?", "--file", &note], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_start = stdout.find('{').expect("no JSON in output");
    let request: serde_json::Value = serde_json::from_str(&stdout[json_start..]).unwrap();

    assert_eq!(request["model"], "gpt-4o-mini");
    assert_eq!(request["messages"][0]["role"], "system");
    assert!(request["messages"][0]["content"]
        .as_str()
        .unwrap()
        .contains("Source: rag.md"));
    assert_eq!(request["messages"][1]["content"], "what is retrieval?");
}

// =============================================================================
// Config Command
// =============================================================================

#[test]
fn test_config_validate_defaults() {
    let dir = TempDir::new().unwrap();
    let output = run_recall(&["config", "--validate"], &dir);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Configuration is valid"));
    assert!(stdout.contains("top_k = 5"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("recall.toml"), "[index]\ntop_k = 0\n").unwrap();

    let output = run_recall(&["config"], &dir);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("top_k"));
}

#[test]
fn test_missing_file_fails_with_path() {
    let dir = TempDir::new().unwrap();
    let output = run_recall(&["chunk", "absent.md"], &dir);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("absent.md"));
}
