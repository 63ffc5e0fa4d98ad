//! CLI integration tests for jbindgen.
//!
//! These tests run the binary against small C sources and check the
//! generated files and exit status.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the jbindgen binary command, isolated from the user's config.
fn jbindgen(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("jbindgen").unwrap();
    cmd.env("HOME", home).arg("--no-color");
    cmd
}

/// Create a temporary directory for test projects.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

const LAPACK_H: &str = r#"
#ifndef LAPACK_H
#define LAPACK_H

#include <stddef.h>

typedef enum { NoTrans, Trans } Op;

int foo(double x, char* y);
void dgesv_(const int *n, const int *nrhs, double *a, int *info);
double ddot(size_t n, const double *x, const double *y);
int transpose(Op op);
static inline int helper(int v) { return v * 2; }

#endif
"#;

// ============================================================================
// jbindgen generate
// ============================================================================

#[test]
fn test_generate_writes_class_and_stub() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("lapack.h"), LAPACK_H).unwrap();

    jbindgen(tmp.path())
        .args(["generate", "lapack.h"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 4 native method(s)"));

    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert!(java.starts_with("public class LapackJNI {\n"));
    assert!(java.contains("System.loadLibrary(\"LapackJNI\");"));
    assert!(java.contains("    public native int foo(double x, long y);\n"));
    assert!(java.contains("    public native void dgesv_(long n, long nrhs, long a, long info);\n"));
    assert!(java.contains("    public native double ddot(long n, long x, long y);\n"));
    assert!(java.contains("    public native int transpose(int op);\n"));
    assert!(!java.contains("helper"));
    assert!(java.ends_with("}\n"));

    let native = fs::read_to_string(tmp.path().join("LapackJNI.c")).unwrap();
    assert!(native.contains("#include <jni.h>"));
}

#[test]
fn test_generate_custom_names() {
    let tmp = temp_dir();
    fs::create_dir(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("blas.h"), "float sdot(int n, float *x, float *y);\n").unwrap();

    jbindgen(tmp.path())
        .args([
            "generate",
            "blas.h",
            "--class-name",
            "Blas",
            "--library-name",
            "openblas",
            "-o",
            "out/Blas.java",
            "--native-output",
            "out/blas_jni.c",
        ])
        .current_dir(tmp.path())
        .assert()
        .success();

    let java = fs::read_to_string(tmp.path().join("out/Blas.java")).unwrap();
    assert!(java.starts_with("public class Blas {\n"));
    assert!(java.contains("System.loadLibrary(\"openblas\");"));
    assert!(java.contains("public native float sdot(int n, long x, long y);"));
    assert!(tmp.path().join("out/blas_jni.c").exists());
}

#[test]
fn test_generate_missing_output_directory_fails() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("a.h"), "int foo(void);\n").unwrap();

    jbindgen(tmp.path())
        .args(["generate", "a.h", "-o", "missing/LapackJNI.java"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to write"));

    assert!(!tmp.path().join("LapackJNI.c").exists());
}

#[test]
fn test_generate_parse_failure_exits_nonzero() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("good.h"), "int good(int a);\n").unwrap();
    fs::write(tmp.path().join("bad.h"), "int bad(int a;\n").unwrap();

    jbindgen(tmp.path())
        .args(["generate", "good.h", "bad.h"])
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to parse"));

    // The unit that parsed is still emitted
    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert!(java.contains("public native int good(int a);"));
    assert!(!java.contains("bad"));
}

#[test]
fn test_generate_redeclarations_and_reserved_names() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("a.h"),
        "typedef struct cplx cplx;\nint foo(double x, char *y);\nvoid scale(cplx const *a, int new);\n",
    )
    .unwrap();
    fs::write(tmp.path().join("b.c"), "int foo(double, char *);\n").unwrap();

    jbindgen(tmp.path())
        .args(["generate", "a.h", "b.c"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("wrote 2 native method(s)"))
        .stdout(predicate::str::contains("1 duplicate"));

    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert_eq!(java.matches("foo(").count(), 1);
    assert!(java.contains("public native int foo(double x, long y);"));
    assert!(java.contains("public native void scale(long a, int new_);"));
}

#[test]
fn test_generate_malformed_unit_does_not_stop_run() {
    let tmp = temp_dir();
    fs::write(tmp.path().join("bad.h"), "void f(;);\n").unwrap();
    fs::write(tmp.path().join("good.h"), "int good(int a);\n").unwrap();

    jbindgen(tmp.path())
        .args(["generate", "bad.h", "good.h"])
        .current_dir(tmp.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unexpected `;`"));

    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert!(java.contains("public native int good(int a);"));
}

#[test]
fn test_generate_definitions_policy() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("impl.c"),
        "int declared(int a);\nint defined(int a) { return a; }\n",
    )
    .unwrap();

    jbindgen(tmp.path())
        .args(["generate", "impl.c", "--select", "definitions"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert!(java.contains("public native int defined(int a);"));
    assert!(!java.contains("declared"));
}

#[test]
fn test_generate_unsupported_types_warn() {
    let tmp = temp_dir();
    fs::write(
        tmp.path().join("m.h"),
        "struct matrix;\nint solve(int n, struct matrix m);\n",
    )
    .unwrap();

    jbindgen(tmp.path())
        .args(["generate", "m.h"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("unsupported type `struct matrix`"));

    let java = fs::read_to_string(tmp.path().join("LapackJNI.java")).unwrap();
    assert!(java.contains("public native int solve(int n, ??? m);"));
}

#[test]
fn test_generate_uses_project_config() {
    let tmp = temp_dir();
    fs::create_dir(tmp.path().join(".jbindgen")).unwrap();
    fs::write(
        tmp.path().join(".jbindgen/config.toml"),
        "[binding]\nclass_name = \"Native\"\nexclude_functions = [\"skip\"]\n",
    )
    .unwrap();
    fs::write(tmp.path().join("a.h"), "int keep(void);\nint skip(void);\n").unwrap();

    jbindgen(tmp.path())
        .args(["generate", "a.h"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let java = fs::read_to_string(tmp.path().join("Native.java")).unwrap();
    assert!(java.contains("public native int keep();"));
    assert!(!java.contains("skip"));
}

#[test]
fn test_generate_from_compilation_database() {
    let tmp = temp_dir();
    let src = tmp.path().join("src");
    fs::create_dir(&src).unwrap();
    fs::write(src.join("a.c"), "int from_db(long v);\n").unwrap();
    fs::write(
        tmp.path().join("compile_commands.json"),
        format!(
            r#"[{{"directory": "{}", "file": "src/a.c", "command": "cc -c src/a.c"}}]"#,
            tmp.path().display()
        ),
    )
    .unwrap();

    jbindgen(tmp.path())
        .args(["generate"])
        .current_dir(&src)
        .assert()
        .success();

    let java = fs::read_to_string(src.join("LapackJNI.java")).unwrap();
    assert!(java.contains("public native int from_db(long v);"));
}

#[test]
fn test_generate_without_inputs_fails() {
    let tmp = temp_dir();

    jbindgen(tmp.path())
        .args(["generate"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no input sources"))
        .stderr(predicate::str::contains("  --> "))
        .stderr(predicate::str::contains(
            tmp.path().file_name().unwrap().to_string_lossy().into_owned(),
        ));
}

#[test]
fn test_generate_rejects_unknown_policy() {
    let tmp = temp_dir();

    jbindgen(tmp.path())
        .args(["generate", "a.h", "--select", "everything"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid selection policy"));
}

// ============================================================================
// jbindgen completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = temp_dir();

    jbindgen(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jbindgen"));
}
