//! ksvalidator adapter tests
//!
//! Stand-in validators are small shell scripts, so these only run on Unix.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kickstart_ls::validator::{Ksvalidator, Validate};
use kickstart_ls::KickstartError;
use tempfile::TempDir;

/// Fails unless called as `<script> --help` or `<script> -- <file>`.
const REJECTING: &str = r#"#!/bin/sh
if [ "$1" = "--help" ]; then exit 0; fi
[ "$1" = "--" ] || exit 3
echo "The following problem occurred on line 2 of the kickstart file:" >&2
echo "" >&2
echo "Unknown command: $(basename "$2")" >&2
exit 1
"#;

const ACCEPTING_WITH_WARNING: &str = r#"#!/bin/sh
echo "DeprecationWarning: the --root option is deprecated" >&2
exit 0
"#;

const BROKEN: &str = "#!/bin/sh\nexit 2\n";

const SLOW: &str = "#!/bin/sh\nsleep 5\n";

fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn kickstart(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("server.ks");
    fs::write(&path, "lang en_US\nbootlaoder\n").unwrap();
    path
}

// ═══════════════════════════════════════════════════════════════════════════
// AVAILABILITY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_available_when_help_succeeds() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", REJECTING));
    assert!(validator.is_available());
}

#[test]
fn test_unavailable_when_help_fails() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", BROKEN));
    assert!(!validator.is_available());
}

#[test]
fn test_unavailable_when_missing() {
    let validator = Ksvalidator::new("/nonexistent/bin/ksvalidator");
    assert!(!validator.is_available());
}

#[test]
fn test_unavailable_when_not_executable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ksvalidator");
    fs::write(&path, REJECTING).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
    assert!(!Ksvalidator::new(path).is_available());
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_failing_run_returns_stderr() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", REJECTING));

    let stderr = validator.run(&kickstart(&dir)).await.unwrap().unwrap();

    assert!(stderr.contains("on line 2 of the kickstart file"));
    assert!(stderr.contains("Unknown command: server.ks"));
}

#[tokio::test]
async fn test_successful_run_discards_stderr() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", ACCEPTING_WITH_WARNING));

    let report = validator.run(&kickstart(&dir)).await.unwrap();

    assert!(report.is_none());
}

#[tokio::test]
async fn test_failing_run_without_output() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", BROKEN));

    let report = validator.run(&kickstart(&dir)).await.unwrap();

    assert_eq!(report.as_deref(), Some(""));
}

#[tokio::test]
async fn test_missing_program_is_spawn_error() {
    let validator = Ksvalidator::new("/nonexistent/bin/ksvalidator");

    let result = validator.run(Path::new("/tmp/server.ks")).await;

    match result {
        Err(KickstartError::Spawn { program, .. }) => {
            assert_eq!(program, PathBuf::from("/nonexistent/bin/ksvalidator"));
        }
        other => panic!("expected spawn error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_timeout_kills_slow_run() {
    let dir = TempDir::new().unwrap();
    let validator = Ksvalidator::new(script(&dir, "ksvalidator", SLOW))
        .with_timeout(Some(Duration::from_millis(100)));

    let result = validator.run(&kickstart(&dir)).await;

    assert!(matches!(result, Err(KickstartError::Timeout(_))));
}
