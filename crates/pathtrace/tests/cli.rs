use std::fs;
use std::process::Command;

use tempfile::TempDir;

#[test]
fn help_lists_host_flags() {
    let output = Command::new(env!("CARGO_BIN_EXE_pathtrace"))
        .arg("--help")
        .output()
        .expect("failed to run pathtrace --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for flag in [
        "--width",
        "--height",
        "--fps",
        "--max-samples",
        "--kernel",
        "--entry-point",
        "--low-power",
        "--no-vsync",
    ] {
        assert!(stdout.contains(flag), "missing {flag} in help:\n{stdout}");
    }
}

#[test]
fn missing_kernel_file_fails_before_opening_a_window() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.wgsl");

    let output = Command::new(env!("CARGO_BIN_EXE_pathtrace"))
        .arg("--kernel")
        .arg(&missing)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run pathtrace");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to read kernel library"),
        "unexpected stderr:\n{stderr}"
    );
}

#[test]
fn empty_kernel_file_from_env_is_rejected() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("empty.wgsl");
    fs::write(&empty, "\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_pathtrace"))
        .env("PATHTRACE_KERNEL", &empty)
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run pathtrace");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("is empty"), "unexpected stderr:\n{stderr}");
}
