//! Diagnostics printed by the binary before the session starts.

use std::process::{Command, Stdio};

fn ptyscript(args: &[&str]) -> std::process::Output {
    let home = tempfile::tempdir().unwrap();
    Command::new(env!("CARGO_BIN_EXE_ptyscript"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .stdin(Stdio::null())
        .output()
        .expect("Should run ptyscript")
}

#[test]
fn test_zero_geometry_warning_reaches_stderr() {
    // stdin is not a terminal, so the run stops at capture, after resolve.
    let output = ptyscript(&["-h", "0", "-w", "0"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        stderr.contains("Warning: zero terminal geometry requested: 0x0"),
        "stderr was: {}",
        stderr
    );
    assert!(stderr.contains("Error: cannot capture terminal state"));
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_normal_geometry_prints_no_warning() {
    let output = ptyscript(&["-h", "24", "-w", "80"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!stderr.contains("Warning:"), "stderr was: {}", stderr);
    assert_eq!(output.status.code(), Some(1));
}
