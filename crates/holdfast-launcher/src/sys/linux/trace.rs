use nix::errno::Errno;
use nix::libc::PTRACE_EVENT_EXEC;
use nix::sys::ptrace;
use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;

use crate::error::Error;

/// Drives a child that stopped itself up to the trap raised inside the
/// image-replace call, leaving it frozen before the first instruction of
/// the new image.
///
/// The caller is responsible for tearing the child down on failure.
pub(crate) fn sync_to_exec_stop(pid: Pid) -> crate::Result<()> {
    wait_for_self_stop(pid)?;

    ptrace::setoptions(pid, ptrace::Options::PTRACE_O_TRACEEXEC)
        .map_err(Error::TraceSetupFailed)?;

    ptrace::cont(pid, None).map_err(Error::TraceContinueFailed)?;

    match waitpid(pid, None) {
        Ok(WaitStatus::PtraceEvent(_, Signal::SIGTRAP, PTRACE_EVENT_EXEC)) => {
            tracing::debug!(pid = pid.as_raw(), "child stopped at image replace");
            Ok(())
        }
        Ok(status) => Err(Error::UnexpectedChildStatus(status)),
        Err(e) => Err(Error::WaitFailed(e)),
    }
}

/// The child raises SIGSTOP on itself once it has requested tracing; wait
/// for that stop before arming any trace option.
fn wait_for_self_stop(pid: Pid) -> crate::Result<()> {
    match waitpid(pid, None) {
        Ok(WaitStatus::Stopped(_, Signal::SIGSTOP)) => Ok(()),
        Ok(status) => Err(Error::UnexpectedChildStatus(status)),
        Err(Errno::ECHILD) => Err(Error::ChildDiedUnexpectedly),
        Err(e) => Err(Error::WaitFailed(e)),
    }
}

/// Stops tracing the child. Errors are ignored: the caller is either
/// releasing the child on purpose or tearing it down.
pub(crate) fn detach(pid: Pid) {
    let _ = ptrace::detach(pid, None);
}
