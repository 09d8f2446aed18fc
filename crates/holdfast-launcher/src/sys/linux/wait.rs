use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::child::ExitStatus;

/// Outcome of a reap attempt.
pub(crate) enum Reaped {
    /// No terminal status change observed (stops and continues included).
    Alive,

    /// The child is gone and its disposition was recorded.
    Exited(ExitStatus),

    /// The wait call itself misbehaved; the child must be assumed gone.
    Lost,
}

/// Reaps the child, blocking only if `block` is set.
pub(crate) fn reap(pid: Pid, block: bool) -> Reaped {
    let flags = (!block).then_some(WaitPidFlag::WNOHANG);

    loop {
        return match waitpid(pid, flags) {
            Err(Errno::EINTR) => continue,
            Err(Errno::EINVAL) => {
                tracing::error!(pid = pid.as_raw(), "waitpid rejected its own arguments");
                Reaped::Lost
            }
            Err(e) => {
                tracing::warn!(
                    pid = pid.as_raw(),
                    error = %e,
                    "waitpid returned an unexpected error, marking the child as dead"
                );
                Reaped::Lost
            }
            Ok(WaitStatus::StillAlive) => Reaped::Alive,
            Ok(WaitStatus::Exited(_, code)) => Reaped::Exited(ExitStatus::Code(code)),
            Ok(WaitStatus::Signaled(_, signal, _)) => Reaped::Exited(ExitStatus::Signal(signal)),
            // Stop/continue status changes are not terminal.
            Ok(_) => Reaped::Alive,
        };
    }
}
