// Runs the goop binary the way `go generate` does: GOFILE and GOPACKAGE come from the
// environment and the package directory is the working directory. Covers writing the
// companion file, printing to stdout with the hierarchy dump, and the exit status and
// message of a failed run.

//! Command line tests for the `goop` binary.

mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::copy_names_package;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_go_generate_environment() {
    let dir = copy_names_package();

    cargo_bin_cmd!("goop")
        .current_dir(dir.path())
        .env("GOFILE", "BFile.go")
        .env("GOPACKAGE", "names")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(dir.path().join("BFile_goop.go")).unwrap();
    assert!(written.starts_with("// Code generated by goop; DO NOT EDIT.\n\npackage names\n"));
    assert!(written.contains("func (this *B) super() *A {"));
}

#[test]
fn test_stdout_and_dump() {
    let dir = copy_names_package();

    cargo_bin_cmd!("goop")
        .args(["--file", "CFile.go", "--package", "names", "--stdout", "--dump"])
        .arg("--dir")
        .arg(dir.path())
        .env_remove("GOFILE")
        .env_remove("GOPACKAGE")
        .assert()
        .success()
        .stdout(predicate::str::contains("Class C : B {"))
        .stdout(predicate::str::contains("\tthis.B.A.aVtable.getName = this.getNameImpl\n"));

    assert!(!dir.path().join("CFile_goop.go").exists());
}

#[test]
fn test_failure_exits_with_status_one() {
    let dir = copy_names_package();

    cargo_bin_cmd!("goop")
        .current_dir(dir.path())
        .env("GOFILE", "AFile.go")
        .env("GOPACKAGE", "other")
        .env_remove("RUST_LOG")
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("error: package "))
        .stderr(predicate::str::contains("mixes package clauses other and names"));

    assert!(!dir.path().join("AFile_goop.go").exists());
}
