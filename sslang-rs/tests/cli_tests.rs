/// Command-line tests: run the `sslang` binary with scripts on stdin and in
/// temp files and check stdout, stderr and the exit status.
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the `sslang` binary built by this workspace.
fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sslang"))
}

/// Run the binary with `args`, feeding `stdin` to it.
fn run(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .env_remove("SSLANG_BUILTINS")
        .env_remove("SSLANG_LOG")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn sslang binary");
    child
        .stdin
        .take()
        .expect("stdin not open")
        .write_all(stdin.as_bytes())
        .expect("write to stdin");
    child.wait_with_output().expect("wait failed")
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn script_from_stdin() {
    let out = run(&[], "x= int 21\nprint \"x is $x\"\nprint $(list a b) --sep ,\n");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "x is 21\n['a', 'b']\n");
}

#[test]
fn script_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.txt");
    let script = dir.path().join("run.ss");
    std::fs::write(
        &script,
        format!("fwrite '{0}' hello\nprint $(fread '{0}') --end !\n", data.display()),
    )
    .unwrap();

    let out = run(&[script.to_str().unwrap()], "");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "hello!");
    assert_eq!(std::fs::read_to_string(&data).unwrap(), "hello");
}

#[test]
fn dash_reads_stdin() {
    let out = run(&["-"], "print ok");
    assert_eq!(stdout(&out), "ok\n");
}

#[test]
fn run_error_exits_nonzero_with_position() {
    let out = run(&[], "print before\nnope\nprint after\n");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(stdout(&out), "before\n");
    let err = stderr(&out);
    assert!(err.starts_with("sslang: line 2, statement 2: no such function \"nope\""), "{err}");
}

#[test]
fn missing_script_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.ss");
    let out = run(&[path.to_str().unwrap()], "");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("cannot read"), "{}", stderr(&out));
}

#[test]
fn builtin_selection() {
    let out = run(&["--no-builtins"], "print hi");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("no such function \"print\""));

    let out = run(&["-b", "print"], "print hi\nint 3");
    assert_eq!(stdout(&out), "hi\n");
    assert!(stderr(&out).contains("no such function \"int\""));

    let out = run(&["-b", "exec"], "print hi");
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(stderr(&out).contains("exec"));
}

#[test]
fn builtins_from_environment() {
    let mut child = Command::new(binary())
        .env("SSLANG_BUILTINS", "int")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn sslang binary");
    child.stdin.take().unwrap().write_all(b"int 1\nprint no").unwrap();
    let out = child.wait_with_output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("no such function \"print\""));
}

#[test]
fn dump_tokens_does_not_execute() {
    let out = run(&["--dump-tokens"], "# comment\nprint 'a b' \\\n  c\n");
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert_eq!(stdout(&out), "   2: [\"print\", \"a b\", \"c\"]\n");
}

#[test]
fn tokenize_error_is_reported() {
    let out = run(&[], "print 'unterminated");
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("line 1"), "{}", stderr(&out));
}
