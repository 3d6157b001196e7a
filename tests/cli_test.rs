//! End-to-end tests of the flinter binary on saved compiler transcripts

#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn flinter(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flinter"))
        .args(args)
        .current_dir(dir)
        // keep the user's config out of the way
        .env("HOME", dir)
        .env_remove("USERPROFILE")
        .output()
        .expect("failed to run flinter")
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("err-mod.f90"),
        "module err_mod\n  private\n    implicit none\ncontains\nend module err_mod\n",
    )
    .unwrap();
    dir
}

#[test]
fn test_text_output_and_error_status() {
    let dir = workspace();
    fs::write(
        dir.path().join("build.log"),
        "err-mod.f90:3-3:5-12: syntax error: Token 'implicit' is unexpected here\n",
    )
    .unwrap();

    let out = flinter(
        dir.path(),
        &["-c", "lfortran", "--from-output", "build.log", "-S", "err-mod.f90"],
    );
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "err-mod.f90:3:5: error: Token 'implicit' is unexpected here\n"
    );
}

#[test]
fn test_json_output() {
    let dir = workspace();
    fs::write(
        dir.path().join("build.log"),
        "Warning: err-mod.f90, line 3: Something odd\nWarning: err-mod.f90, line 3: Something odd\n",
    )
    .unwrap();

    let out = flinter(
        dir.path(),
        &[
            "-c",
            "nagfor",
            "--format",
            "json",
            "--from-output",
            "build.log",
            "err-mod.f90",
        ],
    );
    assert_eq!(out.status.code(), Some(0));
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let files = json.as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["file"], "err-mod.f90");
    let diagnostics = files[0]["diagnostics"].as_array().unwrap();
    // duplicates collapse
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["severity"], "warning");
    assert_eq!(diagnostics[0]["range"]["start"]["line"], 2);
    assert_eq!(diagnostics[0]["range"]["end"]["column"], 17);
}

#[test]
fn test_clean_transcript_exits_zero() {
    let dir = workspace();
    fs::write(dir.path().join("build.log"), "").unwrap();
    let out = flinter(
        dir.path(),
        &["--from-output", "build.log", "-S", "err-mod.f90"],
    );
    assert_eq!(out.status.code(), Some(0));
    assert!(out.stdout.is_empty());
}

#[test]
fn test_from_output_needs_single_input() {
    let dir = workspace();
    fs::write(dir.path().join("build.log"), "").unwrap();
    let out = flinter(dir.path(), &["--from-output", "build.log", "a.f90", "b.f90"]);
    assert!(!out.status.success());
}

#[test]
fn test_config_file_selects_compiler() {
    let dir = workspace();
    fs::write(dir.path().join("flinter.toml"), "compiler = \"ifort\"\n").unwrap();
    fs::write(
        dir.path().join("build.log"),
        "err-mod.f90(3): remark #7712: This variable has not been used.   [A]\n    implicit none\n---------^\n",
    )
    .unwrap();

    let out = flinter(dir.path(), &["--from-output", "build.log", "-S", "err-mod.f90"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "err-mod.f90:3:11: warning: #7712: This variable has not been used.   [A]\n"
    );
}

#[test]
fn test_clean_removes_module_files() {
    let dir = workspace();
    let mods = dir.path().join("mods");
    fs::create_dir(&mods).unwrap();
    fs::write(mods.join("err_mod.mod"), "").unwrap();
    fs::write(mods.join("keep.txt"), "").unwrap();

    let out = flinter(dir.path(), &["--clean", "--mod-output", "mods", "-S"]);
    assert_eq!(out.status.code(), Some(0));
    assert!(!mods.join("err_mod.mod").exists());
    assert!(mods.join("keep.txt").exists());
}

#[test]
fn test_unresolvable_message_is_skipped() {
    let dir = workspace();
    fs::write(
        dir.path().join("build.log"),
        "Error: err-mod.f90, line 40: Stale message\nError: err-mod.f90, line 3: Real problem\n",
    )
    .unwrap();

    let out = flinter(
        dir.path(),
        &["-c", "nagfor", "--from-output", "build.log", "-S", "err-mod.f90"],
    );
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "err-mod.f90:3:1: error: Real problem\n"
    );
}

#[test]
fn test_unreadable_transcript_exits_two() {
    let dir = workspace();
    let out = flinter(
        dir.path(),
        &["--from-output", "missing.log", "-S", "err-mod.f90"],
    );
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}

#[cfg(unix)]
#[test]
fn test_nested_relative_input_reaches_compiler() {
    use std::os::unix::fs::PermissionsExt;

    let dir = workspace();
    // stands in for gfortran: reports a warning only if the operand exists
    // from the directory it is run in
    let compiler = dir.path().join("fake-gfortran");
    fs::write(
        &compiler,
        "#!/bin/sh\n\
         for a in \"$@\"; do last=$a; done\n\
         if [ -f \"$last\" ]; then\n\
         echo \"$last:2:5: Warning: Unused variable\" >&2\n\
         else\n\
         echo \"gfortran: fatal error: $last: No such file or directory\" >&2\n\
         fi\n",
    )
    .unwrap();
    fs::set_permissions(&compiler, fs::Permissions::from_mode(0o755)).unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/a.f90"), "program a\n  integer :: x\nend program a\n").unwrap();

    let compiler = compiler.display().to_string();
    let out = flinter(
        dir.path(),
        &[
            "--compiler-path",
            &compiler,
            "--gnu-diagnostics",
            "modern",
            "--mod-output",
            "mods",
            "-S",
            "src/a.f90",
        ],
    );
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "src/a.f90:2:6: warning: Unused variable\n"
    );
}
