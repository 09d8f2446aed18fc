pub(crate) mod channel;
pub(crate) mod trace;
pub(crate) mod wait;

use std::ffi::CString;
use std::os::fd::OwnedFd;

use nix::errno::Errno;
use nix::sched::{self, CloneFlags};
use nix::sys::prctl;
use nix::sys::ptrace;
use nix::sys::signal::{self, Signal};
use nix::unistd::{self, Pid};

use self::channel::StartSignal;
use crate::error::Error;

/// Size of the private stack handed to the spawned execution context. The
/// context only ever runs its bootstrap sequence on it.
pub(crate) const STACK_SIZE: usize = 64 * 1024;

/// Bootstrap exit statuses, distinct so the recorded exit code tells
/// where the child fell over before its image replace.
const EXIT_PDEATHSIG: isize = 10;
const EXIT_CHANNEL_READ: isize = 11;
const EXIT_EXEC: isize = 12;

/// Data handed across the creation boundary, read-only from the moment
/// the child starts.
pub(crate) struct SpawnArgs {
    /// Argument vector for the image-replace call; the first element is
    /// the resolved program path.
    pub argv: Vec<CString>,

    /// Read end of the start channel.
    pub start_rx: OwnedFd,
}

/// Creates the child execution context, blocked on the start channel.
///
/// The parent's copy of the channel read end is closed before returning.
/// `stack` must stay allocated for as long as the child may run on it.
pub(crate) fn spawn(args: SpawnArgs, stack: &mut [u8]) -> crate::Result<Pid> {
    let mut args = Some(args);
    let cb: sched::CloneCb = Box::new(move || match args.take() {
        Some(args) => child_main(args),
        // The callback runs exactly once, in the child.
        None => 0,
    });

    let pid = unsafe { sched::clone(cb, stack, CloneFlags::empty(), Some(nix::libc::SIGCHLD)) }
        .map_err(Error::SpawnFailed)?;

    tracing::debug!(pid = pid.as_raw(), "child spawned, blocked on start channel");

    Ok(pid)
}

/// Entry point of the spawned execution context.
///
/// Every failure exits with a distinct non-zero status; the controller
/// observes it through the regular reap path. Diagnostics go straight to
/// stderr, nothing else exists on this side of the image replace.
fn child_main(args: SpawnArgs) -> isize {
    // Arrange teardown in case the controller process dies first.
    if let Err(e) = prctl::set_pdeathsig(Signal::SIGTERM) {
        diag("holdfast child: failed to set parent-death signal", e);
        return EXIT_PDEATHSIG;
    }

    let start = match channel::recv(args.start_rx) {
        Ok(start) => start,
        Err(e) => {
            let errno = Errno::from_raw(e.raw_os_error().unwrap_or(0));
            diag("holdfast child: failed to read start signal", errno);
            return EXIT_CHANNEL_READ;
        }
    };

    if start == StartSignal::GoTraced {
        // Best-effort: a tracing setup failure leaves the child running
        // untraced rather than dead.
        if let Err(e) = ptrace::traceme() {
            diag("holdfast child: ptrace(traceme) failed", e);
        }
        if let Err(e) = signal::raise(Signal::SIGSTOP) {
            diag("holdfast child: failed to stop itself", e);
        }
    }

    let Some(program) = args.argv.first() else {
        return EXIT_EXEC;
    };

    // On success this never returns and the new image takes over. With
    // the exec trap armed the child is already frozen inside the call, so
    // the failure path below is only reachable on an untraced launch.
    let e = match unistd::execv(program, &args.argv) {
        Err(e) => e,
        Ok(infallible) => match infallible {},
    };

    diag("holdfast child: failed to replace process image", e);
    EXIT_EXEC
}

/// Best-effort diagnostic write; the child has no logging channel of its
/// own before the image replace.
fn diag(msg: &str, err: Errno) {
    let stderr = std::io::stderr();

    let _ = unistd::write(&stderr, msg.as_bytes());
    let _ = unistd::write(&stderr, b": ");
    let _ = unistd::write(&stderr, err.desc().as_bytes());
    let _ = unistd::write(&stderr, b"\n");
}
