//! Integration tests for LinguaFlow
//!
//! These tests drive the binary end to end. None of them reach a
//! generation backend: the API key is always removed from the environment.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a linguaflow Command with a clean environment
fn linguaflow(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("linguaflow");
    cmd.current_dir(dir.path())
        .env_remove("GEMINI_API_KEY")
        .env_remove("PASSPHRASE")
        .env_remove("PORT")
        .env_remove("RUST_LOG");
    cmd
}

fn create_temp_project() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("workflow"));
    }

    #[test]
    fn test_version() {
        let dir = create_temp_project();
        linguaflow(&dir).arg("--version").assert().success();
    }

    #[test]
    fn test_audiences_lists_personas_and_purposes() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .arg("audiences")
            .assert()
            .success()
            .stdout(predicate::str::contains("Legal Professionals"))
            .stdout(predicate::str::contains("Literary Critics"))
            .stdout(predicate::str::contains("operative"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_init_writes_default_file() {
        let dir = create_temp_project();

        linguaflow(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Created linguaflow.toml"));

        let content = fs::read_to_string(dir.path().join(".linguaflow/linguaflow.toml")).unwrap();
        assert!(content.contains("[generation]"));
        assert!(content.contains("debounce_ms = 1000"));
    }

    #[test]
    fn test_config_init_does_not_overwrite() {
        let dir = create_temp_project();
        linguaflow(&dir).args(["config", "init"]).assert().success();

        linguaflow(&dir)
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn test_config_show_masks_missing_secrets() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("quality_model"))
            .stdout(predicate::str::contains("GEMINI_API_KEY = (not set)"));
    }

    #[test]
    fn test_config_show_never_prints_api_key() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .env("GEMINI_API_KEY", "super-secret-key-value")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("super-secret").not());
    }

    #[test]
    fn test_config_validate_reports_window_outside_range() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".linguaflow")).unwrap();
        fs::write(
            dir.path().join(".linguaflow/linguaflow.toml"),
            "[workflow]\ndebounce_ms = 50\n",
        )
        .unwrap();

        linguaflow(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("debounce_ms = 50"));
    }

    #[test]
    fn test_unusable_config_value_fails() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".linguaflow")).unwrap();
        fs::write(
            dir.path().join(".linguaflow/linguaflow.toml"),
            "[generation]\ntimeout_secs = 0\n",
        )
        .unwrap();

        linguaflow(&dir)
            .args(["workflow", "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid value for generation.timeout_secs"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".linguaflow")).unwrap();
        fs::write(dir.path().join(".linguaflow/linguaflow.toml"), "[server\nport=").unwrap();

        linguaflow(&dir)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("parse"));
    }
}

// =============================================================================
// One-shot translation
// =============================================================================

mod translate {
    use super::*;

    #[test]
    fn test_empty_text_is_rejected() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["translate", "   "])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Missing text"));
    }

    #[test]
    fn test_workflow_modes_are_rejected() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["translate", "hello", "--mode", "deconstruct"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("workflow stage"));
    }

    #[test]
    fn test_unknown_mode_is_a_usage_error() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["translate", "hello", "--mode", "summarize"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid mode"));
    }

    #[test]
    fn test_non_text_documents_are_rejected() {
        let dir = create_temp_project();
        fs::write(dir.path().join("report.pdf"), b"%PDF-1.7").unwrap();

        linguaflow(&dir)
            .args(["translate", "--file", "report.pdf"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unsupported document format"));
    }

    #[test]
    fn test_missing_api_key_is_reported() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["translate", "你好"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));
    }

    #[test]
    fn test_infer_context_requires_api_key() {
        let dir = create_temp_project();
        fs::write(dir.path().join("doc.txt"), "A short memo.").unwrap();

        linguaflow(&dir)
            .args(["infer-context", "doc.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GEMINI_API_KEY"));
    }
}

// =============================================================================
// Workflow session
// =============================================================================

mod workflow {
    use super::*;

    #[test]
    fn test_status_of_fresh_project_is_idle() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["workflow", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stage 0/3"))
            .stdout(predicate::str::contains("IDLE"))
            .stdout(predicate::str::contains("Purpose: Informative"));
    }

    #[test]
    fn test_advance_without_source_is_skipped() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["workflow", "advance"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Skipped"));
    }

    #[test]
    fn test_set_persists_across_invocations() {
        let dir = create_temp_project();
        fs::write(dir.path().join("source.txt"), "人工智能正在改变翻译行业。").unwrap();

        linguaflow(&dir)
            .args([
                "workflow",
                "set",
                "--source-file",
                "source.txt",
                "--audience",
                "Business Executives",
                "--purpose",
                "operative",
            ])
            .assert()
            .success();

        assert!(dir.path().join(".linguaflow/session.json").exists());
        linguaflow(&dir)
            .args(["workflow", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("人工智能正在改变翻译行业"))
            .stdout(predicate::str::contains("Business Executives"))
            .stdout(predicate::str::contains("Purpose: Operative"));
    }

    #[test]
    fn test_set_without_fields_fails() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["workflow", "set"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Nothing to set"));
    }

    #[test]
    fn test_failed_advance_keeps_stage() {
        let dir = create_temp_project();
        linguaflow(&dir)
            .args(["workflow", "set", "--source", "源文本"])
            .assert()
            .success();

        linguaflow(&dir)
            .args(["workflow", "advance"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GEMINI_API_KEY is not set"));

        linguaflow(&dir)
            .args(["workflow", "status"])
            .assert()
            .success()
            .stdout(predicate::str::contains("IDLE"));
    }

    #[test]
    fn test_reset_clears_session_but_keeps_passphrase() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".linguaflow")).unwrap();
        fs::write(
            dir.path().join(".linguaflow/session.json"),
            r#"{"fields":{"source_text":"旧文本","stage":"DECONSTRUCTED","passphrase":"pw"}}"#,
        )
        .unwrap();

        linguaflow(&dir)
            .args(["workflow", "reset"])
            .assert()
            .success()
            .stdout(predicate::str::contains("IDLE"))
            .stdout(predicate::str::contains("Source:  (empty)"));

        let stored = fs::read_to_string(dir.path().join(".linguaflow/session.json")).unwrap();
        assert!(stored.contains("\"passphrase\": \"pw\""));
        assert!(!stored.contains("旧文本"));
    }

    #[test]
    fn test_logout_removes_passphrase() {
        let dir = create_temp_project();
        fs::create_dir_all(dir.path().join(".linguaflow")).unwrap();
        fs::write(
            dir.path().join(".linguaflow/session.json"),
            r#"{"fields":{"source_text":"keep me","passphrase":"pw"}}"#,
        )
        .unwrap();

        linguaflow(&dir).arg("logout").assert().success();

        let stored = fs::read_to_string(dir.path().join(".linguaflow/session.json")).unwrap();
        assert!(!stored.contains("passphrase"));
        assert!(stored.contains("keep me"));
    }
}
