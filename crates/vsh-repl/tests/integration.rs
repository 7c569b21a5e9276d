//! Integration tests for the vsh REPL.
//!
//! These tests run scripts through the REPL and verify behavior.

use std::sync::Arc;

use vsh_kernel::{BufferSink, StyleHint};
use vsh_repl::{Outcome, Repl, ReplOptions};

fn options(user: &str) -> ReplOptions {
    ReplOptions {
        user: user.to_string(),
        groups: vec![],
        state: None,
        assume_yes: false,
    }
}

/// Run each non-blank line through a fresh REPL and return the sink.
fn run_script(script: &str) -> (Repl, Arc<BufferSink>) {
    let sink = Arc::new(BufferSink::new());
    let mut repl = Repl::with_sink(&options("alice"), sink.clone()).expect("Failed to create REPL");
    for line in script.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        repl.process_line(trimmed);
    }
    (repl, sink)
}

#[test]
fn starts_in_home_directory() {
    let (repl, _) = run_script("");
    assert_eq!(repl.cwd(), "/home/alice");
    assert_eq!(repl.prompt(), "alice@vsh:/home/alice$ ");
}

#[test]
fn output_goes_to_sink() {
    let (_, sink) = run_script(
        r#"
        echo hello
        echo one two | wc -w
    "#,
    );
    assert_eq!(sink.text(StyleHint::Output), "hello\n2\n");
}

#[test]
fn cwd_persists_between_lines() {
    let (repl, sink) = run_script(
        r#"
        mkdir -p projects/vsh
        cd projects/vsh
        pwd
    "#,
    );
    assert_eq!(repl.cwd(), "/home/alice/projects/vsh");
    assert_eq!(sink.text(StyleHint::Output), "/home/alice/projects/vsh\n");
}

#[test]
fn variables_persist_between_lines() {
    let (_, sink) = run_script(
        r#"
        export NAME=world
        echo "hello $NAME"
    "#,
    );
    assert_eq!(sink.text(StyleHint::Output), "hello world\n");
}

#[test]
fn errors_go_to_error_stream() {
    let (_, sink) = run_script("write /etc/passwd nope");
    assert_eq!(sink.text(StyleHint::Output), "");
    assert_eq!(
        sink.text(StyleHint::Error),
        "write: /etc/passwd: permission denied\n"
    );
}

#[test]
fn meta_commands() {
    let (mut repl, _) = run_script("export A=1");
    assert_eq!(repl.process_line("/cwd"), Outcome::Continue(Some("/home/alice".into())));
    assert_eq!(repl.process_line("/quit"), Outcome::Exit);
    assert_eq!(repl.process_line("exit"), Outcome::Exit);

    let Outcome::Continue(Some(vars)) = repl.process_line("/vars") else {
        panic!("expected variable listing");
    };
    assert!(vars.contains("A = 1"));

    let Outcome::Continue(Some(unknown)) = repl.process_line("/frobnicate") else {
        panic!("expected message");
    };
    assert!(unknown.starts_with("Unknown command: /frobnicate"));
}

#[test]
fn background_job_listed() {
    let (mut repl, _) = run_script("sleep 30 &");
    let Outcome::Continue(Some(jobs)) = repl.process_line("/jobs") else {
        panic!("expected job listing");
    };
    assert!(jobs.contains("[1] Running"), "{}", jobs);
    assert!(jobs.contains("sleep 30"));

    repl.process_line("kill %1");
    let result = repl.execute("wait %1");
    assert!(!result.success);
    repl.shutdown();
}

#[test]
fn state_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path().join("state.json");
    let mut opts = options("alice");
    opts.state = Some(state.clone());

    let sink = Arc::new(BufferSink::new());
    let mut repl = Repl::with_sink(&opts, sink.clone()).expect("repl");
    repl.process_line("write notes.txt keep me");
    repl.shutdown();
    assert!(state.exists());
    drop(repl);

    let mut repl = Repl::with_sink(&opts, sink.clone()).expect("repl");
    sink.clear();
    repl.process_line("cat notes.txt");
    assert_eq!(sink.text(StyleHint::Output), "keep me\n");
}

#[test]
fn corrupt_state_file_starts_fresh() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = dir.path().join("state.json");
    std::fs::write(&state, b"not json").expect("write");
    let mut opts = options("alice");
    opts.state = Some(state);

    let repl = Repl::with_sink(&opts, Arc::new(BufferSink::new())).expect("repl");
    assert_eq!(repl.cwd(), "/home/alice");
}
