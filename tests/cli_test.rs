//! Runs the built binary against scratch directories.
//!
//! Each test starts in its own empty directory so no `wfgen.yml` or `.env`
//! from the repository leaks in.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const VALID_SCRIPT: &str = "const entities = require('@jetbrains/youtrack-scripting-api/entities');
exports.rule = entities.Issue.onChange({
  title: 'Noop',
  guard: (ctx) => true,
  action: (ctx) => {},
  requirements: {}
});
";

fn wfgen(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wfgen"))
        .args(args)
        .current_dir(dir)
        .env_remove("WFGEN_API_KEY")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run wfgen")
}

/// Config whose syntax checker accepts every file
fn write_permissive_config(dir: &Path) {
    fs::write(
        dir.join("wfgen.yml"),
        "syntax_checker:\n  program: \"true\"\n  args: []\nsessions_dir: sessions\n",
    )
    .unwrap();
}

#[test]
fn test_generate_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    let output = wfgen(dir.path(), &["generate", "--prompt", "tag new bugs"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No API key configured"), "stderr: {}", stderr);
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let output = wfgen(dir.path(), &["--config", "absent.yml", "history"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn test_validate_reports_success_and_failure() {
    let dir = TempDir::new().unwrap();
    write_permissive_config(dir.path());
    fs::write(dir.path().join("good.js"), VALID_SCRIPT).unwrap();
    fs::write(dir.path().join("bad.js"), "exports.rule = {};\n").unwrap();

    let good = wfgen(dir.path(), &["validate", "good.js"]);
    assert!(good.status.success());
    assert!(String::from_utf8_lossy(&good.stdout).contains("The script passed all checks."));

    let bad = wfgen(dir.path(), &["validate", "bad.js"]);
    assert_eq!(bad.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&bad.stderr).contains("Missing guard function"));
}

#[test]
fn test_history_on_empty_store() {
    let dir = TempDir::new().unwrap();
    let output = wfgen(dir.path(), &["history"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No sessions in"));
}

#[test]
fn test_search_uses_builtin_examples() {
    let dir = TempDir::new().unwrap();
    let output = wfgen(dir.path(), &["search", "auto-assign critical issues to lead"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first_hit = stdout
        .lines()
        .find(|line| line.trim_start().starts_with('['))
        .unwrap();
    assert!(first_hit.contains("auto_assign_critical"), "stdout: {}", stdout);
}

#[cfg(unix)]
#[test]
fn test_generate_reads_request_then_clarification_answers() {
    let dir = TempDir::new().unwrap();
    write_permissive_config(dir.path());

    // Nothing listens on the discard port, so every model call fails fast
    let mut child = Command::new(env!("CARGO_BIN_EXE_wfgen"))
        .arg("generate")
        .current_dir(dir.path())
        .env("WFGEN_API_KEY", "sk-test")
        .env("WFGEN_API_URL", "http://127.0.0.1:9/v1/chat/completions")
        .env("NO_PROXY", "*")
        .env_remove("HTTP_PROXY")
        .env_remove("HTTPS_PROXY")
        .env_remove("ALL_PROXY")
        .env_remove("http_proxy")
        .env_remove("https_proxy")
        .env_remove("all_proxy")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to run wfgen");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"auto-assign critical issues\nThe lead is jane.doe\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let session_file = fs::read_dir(dir.path().join("sessions"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .find(|p| p.extension().is_some_and(|ext| ext == "json"))
        .unwrap();
    let session: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(session_file).unwrap()).unwrap();

    assert_eq!(session["request"], "auto-assign critical issues");
    assert_eq!(session["answers"][0]["answer"], "The lead is jane.doe");
    assert_eq!(session["stage"], "done");
    assert!(session["updated_request"]
        .as_str()
        .unwrap()
        .contains("A: The lead is jane.doe"));
}
