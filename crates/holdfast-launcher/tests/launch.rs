#![cfg(target_os = "linux")]
#![allow(missing_docs)]

use std::time::{Duration, Instant};

use holdfast_launcher::{ChildProcess, Command, Error, ExitStatus, State};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use test_log::test;

#[test]
fn construction_starts_created_with_a_live_child() {
    let mut child = ChildProcess::spawn(Command::new("true")).expect("spawn");

    assert_eq!(child.state(), State::Created);
    assert!(child.is_alive());
    assert!(child.raw_id() > 1);
    assert_eq!(child.exit_status(), None);
}

#[test]
fn unknown_command_fails_before_anything_is_spawned() {
    let Err(err) = ChildProcess::spawn(Command::new("definitely-not-a-real-binary-xyz")) else {
        panic!("construction must fail");
    };

    assert!(matches!(err, Error::NotFound(_)));
}

#[test]
fn oversized_argument_vector_fails_construction() {
    let command = Command::new("true").args((0..300).map(|i| i.to_string()));

    let Err(err) = ChildProcess::spawn(command) else {
        panic!("construction must fail");
    };

    assert!(matches!(err, Error::TooManyArguments(_)));
}

#[test]
fn plain_run_completes_with_exit_code_zero() {
    let mut child = ChildProcess::spawn(Command::new("true")).expect("spawn");

    child.run(false).expect("run");
    assert_eq!(child.state(), State::Running);

    assert_eq!(child.wait().expect("wait"), ExitStatus::Code(0));
    assert!(!child.is_alive());
    assert_eq!(child.exit_code(), Some(0));
    assert_eq!(child.term_signal(), None);
}

#[test]
fn plain_run_reports_a_nonzero_exit_code() {
    let mut child = ChildProcess::spawn(Command::new("false")).expect("spawn");

    child.run(false).expect("run");

    assert_eq!(child.wait().expect("wait"), ExitStatus::Code(1));
    assert_eq!(child.exit_code(), Some(1));
}

#[test]
fn is_alive_observes_the_exit_without_blocking() {
    let mut child = ChildProcess::spawn(Command::new("true")).expect("spawn");

    child.run(false).expect("run");

    let deadline = Instant::now() + Duration::from_secs(10);
    while child.is_alive() {
        assert!(Instant::now() < deadline, "child did not exit in time");
        std::thread::sleep(Duration::from_millis(10));
    }

    assert_eq!(child.exit_code(), Some(0));
}

#[test]
fn traced_run_pauses_at_the_new_image() {
    let command = Command::new("sh").arg("-c").arg("exit 7");
    let mut child = ChildProcess::spawn(command).expect("spawn");
    let pid = child.raw_id();

    child.run(true).expect("run traced");

    assert_eq!(child.state(), State::TracePaused);
    assert_eq!(child.raw_id(), pid);
    assert!(child.is_alive());

    child.resume().expect("resume");
    assert_eq!(child.state(), State::Running);

    // The child keeps its original exit behavior once released.
    assert_eq!(child.wait().expect("wait"), ExitStatus::Code(7));
}

#[test]
fn forced_terminate_records_the_signal_and_is_idempotent() {
    let mut child = ChildProcess::spawn(Command::new("sleep").arg("60")).expect("spawn");

    child.run(false).expect("run");
    child.terminate(true).expect("terminate");

    assert_eq!(child.state(), State::Died);
    assert_eq!(child.term_signal(), Some(Signal::SIGKILL));
    assert_eq!(child.exit_code(), None);

    child.terminate(true).expect("terminate again");
    assert_eq!(child.term_signal(), Some(Signal::SIGKILL));
}

#[test]
fn graceful_terminate_reaps_the_child() {
    let mut child = ChildProcess::spawn(Command::new("sleep").arg("60")).expect("spawn");

    child.run(false).expect("run");
    child.terminate(false).expect("terminate");

    assert_eq!(child.state(), State::Died);
    assert_eq!(child.term_signal(), Some(Signal::SIGTERM));
}

#[test]
fn terminate_works_on_a_trace_paused_child() {
    let mut child = ChildProcess::spawn(Command::new("sleep").arg("60")).expect("spawn");

    child.run(true).expect("run traced");
    assert_eq!(child.state(), State::TracePaused);

    child.terminate(true).expect("terminate");

    assert_eq!(child.state(), State::Died);
    assert!(child.term_signal().is_some());
}

#[test]
fn run_fails_if_the_child_died_first() {
    let mut child = ChildProcess::spawn(Command::new("true")).expect("spawn");

    nix::sys::signal::kill(child.id(), Signal::SIGKILL).expect("kill");
    std::thread::sleep(Duration::from_millis(100));

    let Err(err) = child.run(false) else {
        panic!("run must fail");
    };
    assert!(matches!(err, Error::ChildDiedUnexpectedly));
}

#[test]
fn wait_is_not_legal_before_the_release() {
    let mut child = ChildProcess::spawn(Command::new("true")).expect("spawn");

    let Err(err) = child.wait() else {
        panic!("wait in Created must fail");
    };
    assert!(matches!(err, Error::InvalidState { .. }));
}

#[test]
fn drop_reaps_a_running_child() {
    let pid;
    {
        let mut child = ChildProcess::spawn(Command::new("sleep").arg("60")).expect("spawn");
        child.run(false).expect("run");
        pid = child.id();
    }

    // The supervisor killed and reaped the child on drop; nothing with
    // that pid remains (up to pid reuse, which a fresh sleeper won't hit).
    assert_eq!(nix::sys::signal::kill(pid, None), Err(Errno::ESRCH));
}

#[test]
fn drop_kills_a_child_that_was_never_released() {
    let pid;
    {
        let mut child = ChildProcess::spawn(Command::new("sleep").arg("60")).expect("spawn");
        assert!(child.is_alive());
        pid = child.id();
    }

    assert_eq!(nix::sys::signal::kill(pid, None), Err(Errno::ESRCH));
}
