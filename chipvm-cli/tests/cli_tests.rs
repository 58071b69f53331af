//! Integration tests for the ChipVM CLI.
//!
//! These tests invoke the `chipvm` binary as a subprocess and check
//! exit codes, stdout, and stderr.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn chipvm() -> Command {
    Command::cargo_bin("chipvm").unwrap()
}

/// Return the workspace root (parent of chipvm-cli/).
fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .to_path_buf()
}

/// Return the absolute path to a test program file.
fn test_program(name: &str) -> PathBuf {
    workspace_root().join("tests/programs").join(name)
}

/// Helper: assemble source text, returning the path to the binary.
fn assemble_to_temp(dir: &TempDir, source: &str) -> PathBuf {
    let input = dir.path().join("test.S");
    let output = dir.path().join("test.bin");
    fs::write(&input, source).unwrap();
    chipvm()
        .args([
            "assemble",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();
    output
}

// ---- No-args / help ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    chipvm()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage: chipvm"));
}

#[test]
fn help_flag_exits_0() {
    chipvm()
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::contains("Commands:"));
}

#[test]
fn unknown_command_exits_1() {
    chipvm()
        .arg("frobnicate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown command"));
}

// ---- Assemble ----

#[test]
fn assemble_writes_preamble_and_records() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("add.bin");
    chipvm()
        .args([
            "assemble",
            test_program("add.S").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("assembled 5 instructions (68 bytes)"));

    let bytes = fs::read(&output).unwrap();
    assert_eq!(bytes.len(), 8 + 5 * 12);
    assert_eq!(&bytes[..8], b"CHIPCODE");
}

#[test]
fn assemble_raw_omits_preamble() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("add.bin");
    chipvm()
        .args([
            "assemble",
            test_program("add.S").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--raw",
        ])
        .assert()
        .success();
    assert_eq!(fs::read(&output).unwrap().len(), 5 * 12);
}

#[test]
fn assemble_default_output_path() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("prog.S");
    fs::write(&input, "\tret\n").unwrap();
    chipvm()
        .args(["assemble", input.to_str().unwrap()])
        .assert()
        .success();
    assert!(dir.path().join("prog.bin").exists());
}

#[test]
fn assemble_error_reports_line() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.S");
    let output = dir.path().join("bad.bin");
    fs::write(&input, "main:\n\tjmp nowhere\n").unwrap();
    chipvm()
        .args([
            "assemble",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "line 2: unable to find label 'nowhere'",
        ));
    assert!(!output.exists());
}

#[test]
fn assemble_missing_file() {
    chipvm()
        .args(["assemble", "/nonexistent/prog.S"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn assemble_requires_input() {
    chipvm()
        .arg("assemble")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("requires an input file"));
}

#[test]
fn assemble_rejects_unknown_flag() {
    chipvm()
        .args(["assemble", "x.S", "--fast"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unexpected option '--fast'"));
}

// ---- Run ----

#[test]
fn run_prints_syscall_output() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, &fs::read_to_string(test_program("factorial.S")).unwrap());
    chipvm()
        .args(["run", binary.to_str().unwrap()])
        .assert()
        .success()
        .stdout("720\n");
}

#[test]
fn run_raw_binary() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("floats.bin");
    chipvm()
        .args([
            "assemble",
            test_program("floats.S").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--raw",
        ])
        .assert()
        .success();
    chipvm()
        .args(["run", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout("7.750000\n7\n");
}

#[test]
fn run_fault_exits_2() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, &fs::read_to_string(test_program("divzero.S")).unwrap());
    chipvm()
        .args(["run", binary.to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("runtime error: division by zero"));
}

#[test]
fn run_keeps_output_before_fault() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, "\tpushi 9\n\tsyscall 0\n\tsyscall 7\n");
    chipvm()
        .args(["run", binary.to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stdout("9\n")
        .stderr(predicate::str::contains("unknown syscall code 7"));
}

#[test]
fn run_truncated_binary_exits_1() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.bin");
    fs::write(&path, [1, 2, 3]).unwrap();
    chipvm()
        .args(["run", path.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid binary"));
}

#[test]
fn run_trace_goes_to_stderr() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, "\tpushi 4\n\tsyscall 0\n\tret\n");
    chipvm()
        .args(["run", binary.to_str().unwrap(), "--trace"])
        .assert()
        .success()
        .stdout("4\n")
        .stderr(predicate::str::contains("pushi 4 0 sp=0"))
        .stderr(predicate::str::contains("ret 0 0 sp=0"));
}

// ---- Disassemble ----

#[test]
fn disassemble_prints_labels() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, &fs::read_to_string(test_program("countdown.S")).unwrap());
    chipvm()
        .args(["disassemble", binary.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("L2:\n\tloadi\n"))
        .stdout(predicate::str::contains("\tje L2\n"));
}

#[test]
fn disassemble_then_reassemble() {
    let dir = TempDir::new().unwrap();
    let binary = assemble_to_temp(&dir, &fs::read_to_string(test_program("pointer.S")).unwrap());
    let original = fs::read(&binary).unwrap();
    let listing = chipvm()
        .args(["disassemble", binary.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(listing.status.success());

    let again = assemble_to_temp(&dir, &String::from_utf8(listing.stdout).unwrap());
    assert_eq!(fs::read(&again).unwrap(), original);
}

// ---- Exec ----

#[test]
fn exec_assembles_and_runs() {
    chipvm()
        .args(["exec", test_program("pointer.S").to_str().unwrap()])
        .assert()
        .success()
        .stdout("21\n42\n");
}

#[test]
fn exec_assembly_error_exits_1() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.S");
    fs::write(&input, "\tfly 3\n").unwrap();
    chipvm()
        .args(["exec", input.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown opcode 'fly'"));
}
