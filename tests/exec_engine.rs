#![cfg(unix)]
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
//! Integration tests for the execution engine against real processes.
//!
//! Elevated commands only ever reach the privilege session here: the
//! authorizer refuses, so nothing is run through `sudo`.

mod common;

use common::CountingAuthorizer;
use provision_cli::error::ExecError;
use provision_cli::exec::{
    CollectSink, Command, Executor, OutputMode, PrivilegeSession, Shell, SystemExecutor,
};

fn executor(authorizer: CountingAuthorizer) -> SystemExecutor {
    SystemExecutor::new()
        .with_shell(Shell::from_path("/bin/sh"))
        .with_privilege(PrivilegeSession::new(Box::new(authorizer)))
}

#[test]
fn streamed_lines_match_captured_output() {
    let exec = executor(CountingAuthorizer::refusing());
    let mut sink = CollectSink::new();

    let result = exec
        .run(
            &Command::shell("echo 1; echo 2 >&2; echo 3"),
            &mut sink,
            OutputMode::Stream,
        )
        .unwrap();

    assert_eq!(sink.lines(), ["1", "2", "3"]);
    assert_eq!(result.output, "1\n2\n3");
}

#[test]
fn stdout_and_stderr_keep_emission_order_across_runs() {
    let exec = executor(CountingAuthorizer::refusing());
    let script = Command::shell("echo 1; echo 2 >&2; echo 3; echo 4 >&2; echo 5");

    for _ in 0..50 {
        let mut sink = CollectSink::new();
        let result = exec.run(&script, &mut sink, OutputMode::Stream).unwrap();
        assert_eq!(sink.lines(), ["1", "2", "3", "4", "5"]);
        assert_eq!(result.output, "1\n2\n3\n4\n5");
    }
}

#[test]
fn capture_mode_never_touches_the_sink() {
    let exec = executor(CountingAuthorizer::refusing());
    let mut sink = CollectSink::new();

    let result = exec
        .run(&Command::new("echo").arg("hidden"), &mut sink, OutputMode::Capture)
        .unwrap();

    assert!(sink.lines().is_empty());
    assert_eq!(result.output, "hidden");
}

#[test]
fn nonzero_exit_carries_code_and_output() {
    let exec = executor(CountingAuthorizer::refusing());

    let err = exec
        .run_captured(&Command::shell("echo 'E: Unable to locate package'; exit 100"))
        .unwrap_err();

    let ExecError::NonZeroExit {
        exit_code, output, ..
    } = err
    else {
        panic!("expected a non-zero exit error");
    };
    assert_eq!(exit_code, 100);
    assert_eq!(output, "E: Unable to locate package");
}

#[test]
fn safe_commands_return_their_exit_code() {
    let exec = executor(CountingAuthorizer::refusing());

    let result = exec
        .run_captured(&Command::shell("echo partial; exit 3").safe())
        .unwrap();

    assert_eq!(result.code, 3);
    assert!(!result.success());
    assert_eq!(result.output, "partial");
}

#[test]
fn missing_program_is_a_spawn_error() {
    let exec = executor(CountingAuthorizer::refusing());
    let err = exec
        .run_captured(&Command::new("definitely-not-a-real-program-8c1f"))
        .unwrap_err();
    assert!(matches!(err, ExecError::Spawn { .. }));
    assert_eq!(err.exit_code(), None);
}

#[test]
fn environment_overlay_reaches_the_child() {
    let exec = executor(CountingAuthorizer::refusing());
    let cmd = Command::shell("echo \"$PROVISION_TEST_VALUE\"").env("PROVISION_TEST_VALUE", "42");
    let result = exec.run_captured(&cmd).unwrap();
    assert_eq!(result.output, "42");
}

#[test]
fn refused_authorization_prompts_once_for_many_elevated_commands() {
    let authorizer = CountingAuthorizer::refusing();
    let exec = executor(authorizer.clone());

    for package in ["git", "zsh", "curl"] {
        let err = exec
            .run_captured(&Command::new("apt-get").args(["install", "-y", package]).elevated())
            .unwrap_err();
        assert!(matches!(err, ExecError::Unauthorized { .. }));
    }

    assert_eq!(authorizer.probe_count(), 1);
    assert_eq!(authorizer.prompt_count(), 1);
    assert_eq!(authorizer.refresh_count(), 0);
    assert!(!exec.privilege().is_authorized());
}

#[test]
fn granted_authorization_is_cached() {
    let authorizer = CountingAuthorizer::granting();
    let exec = executor(authorizer.clone());

    for _ in 0..3 {
        exec.authorize().unwrap();
    }

    assert_eq!(authorizer.probe_count(), 1);
    assert_eq!(authorizer.prompt_count(), 1);
    assert_eq!(authorizer.refresh_count(), 2);
    assert!(exec.privilege().is_authorized());
}

#[test]
fn existing_session_skips_the_prompt() {
    let authorizer = CountingAuthorizer {
        already_authorized: true,
        ..CountingAuthorizer::default()
    };
    let exec = executor(authorizer.clone());

    exec.authorize().unwrap();
    exec.authorize().unwrap();

    assert_eq!(authorizer.probe_count(), 1);
    assert_eq!(authorizer.prompt_count(), 0);
    assert_eq!(authorizer.refresh_count(), 1);
}

#[test]
fn unelevated_commands_never_consult_the_session() {
    let authorizer = CountingAuthorizer::refusing();
    let exec = executor(authorizer.clone());

    exec.run_captured(&Command::new("true")).unwrap();

    assert_eq!(authorizer.probe_count(), 0);
    assert_eq!(authorizer.prompt_count(), 0);
}
