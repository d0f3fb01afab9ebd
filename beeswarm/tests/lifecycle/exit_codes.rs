//! Exit status of the binary on its startup paths

use std::process::{Command, Output};

fn beeswarm(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_beeswarm"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run beeswarm binary")
}

fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

#[test]
fn test_relative_workdir_exits_with_one() {
    let output = beeswarm(&["--workdir", "relative/dir", "--waitingdrone"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("absolute"), "stderr: {}", stderr);
    assert!(!std::path::Path::new("relative/dir/beeswarm.log").exists());
}

#[test]
fn test_no_mode_prints_usage_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let output = beeswarm(&["--workdir", dir.path().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "stdout: {}", stdout);
    assert!(dir.path().join("beeswarm.log").exists());
}

#[test]
fn test_config_without_general_prints_usage() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beeswarmcfg.json"), r#"{"capabilities": {}}"#).unwrap();

    let output = beeswarm(&["--workdir", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_unparsable_config_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("beeswarmcfg.json"), "{ broken").unwrap();

    let output = beeswarm(&["--workdir", dir.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_failed_explicit_config_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = beeswarm(&[
        "--workdir",
        dir.path().to_str().unwrap(),
        "--config",
        "http://127.0.0.1:9/api/drone/config",
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!dir.path().join("beeswarmcfg.json").exists());
}

#[test]
fn test_unopenable_log_file_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let output = beeswarm(&[
        "--workdir",
        dir.path().to_str().unwrap(),
        "--logfile",
        "no/such/dir/beeswarm.log",
    ]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_server_as_root_exits_with_one() {
    if !is_root() {
        // Server mode blocks forever for other users.
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = beeswarm(&["--workdir", dir.path().to_str().unwrap(), "--server"]);

    assert_eq!(output.status.code(), Some(1));
    let log = std::fs::read_to_string(dir.path().join("beeswarm.log")).unwrap();
    assert!(log.contains("as root"), "log: {}", log);
    assert!(!log.contains("Starting server"), "log: {}", log);
}

#[test]
fn test_waiting_drone_as_root_exits_with_one() {
    if !is_root() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let output = beeswarm(&["--workdir", dir.path().to_str().unwrap(), "--waitingdrone"]);

    assert_eq!(output.status.code(), Some(1));
}
