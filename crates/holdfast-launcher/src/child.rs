use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::command::Command;
use crate::error::Error;
use crate::sys;
use crate::sys::channel::{StartSender, StartSignal};
use crate::sys::wait::Reaped;

/// Lifecycle state of a [ChildProcess].
///
/// State only ever moves forward: `Created` to `Running` (directly, or
/// through `TracePaused`), and from any state to `Died`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// The execution context exists and is blocked on the start channel.
    Created,

    /// The go-signal was sent; the child runs unsupervised.
    Running,

    /// The trace handshake completed; the child is frozen at the first
    /// instruction of its new program image.
    TracePaused,

    /// The child was reaped and its disposition recorded.
    Died,
}

/// Final disposition of a reaped child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Normal exit with the given code.
    Code(i32),

    /// Terminated by the given signal.
    Signal(Signal),
}

/// Supervisor for a single launched child process.
///
/// The child is created blocked on a rendezvous: it runs no code until
/// [run](Self::run) releases it. With `pause` set, the release goes
/// through a trace handshake that leaves the child frozen at the first
/// instruction of its freshly loaded program image, so a tracer can
/// attach instrumentation race-free before [resume](Self::resume).
///
/// Dropping the supervisor force-terminates and reaps a child that is
/// still alive.
pub struct ChildProcess {
    pid: Pid,
    state: State,
    start_tx: Option<StartSender>,
    exit_status: Option<ExitStatus>,

    /// Stack of the spawned context. It must stay allocated at least
    /// until the child's image replace, so it is tied to the supervisor's
    /// lifetime.
    _stack: Vec<u8>,
}

impl ChildProcess {
    /// Validates `command`, sets up the start channel and spawns the
    /// child execution context, blocked until [run](Self::run).
    pub fn spawn(command: Command) -> crate::Result<Self> {
        let argv = command.into_argv()?;

        let (start_rx, start_tx) = sys::channel::create()?;
        let mut stack = vec![0u8; sys::STACK_SIZE];

        let pid = sys::spawn(sys::SpawnArgs { argv, start_rx }, &mut stack)?;

        Ok(Self {
            pid,
            state: State::Created,
            start_tx: Some(start_tx),
            exit_status: None,
            _stack: stack,
        })
    }

    /// The child's OS process identifier.
    ///
    /// Stable for the whole life of the supervisor; in particular it does
    /// not change across the image replace.
    pub const fn id(&self) -> Pid {
        self.pid
    }

    /// The child's OS process identifier, as a raw value.
    pub const fn raw_id(&self) -> i32 {
        self.pid.as_raw()
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> State {
        self.state
    }

    /// Exit code of the child, once it has exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self.exit_status {
            Some(ExitStatus::Code(code)) => Some(code),
            _ => None,
        }
    }

    /// Signal that terminated the child, if it died by one.
    pub fn term_signal(&self) -> Option<Signal> {
        match self.exit_status {
            Some(ExitStatus::Signal(signal)) => Some(signal),
            _ => None,
        }
    }

    /// Final disposition of the child, recorded on its transition to
    /// [State::Died].
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Returns whether the child is still alive, without blocking.
    pub fn is_alive(&mut self) -> bool {
        if self.state != State::Died {
            self.check_child(false);
        }

        self.state != State::Died
    }

    /// Releases the child from its rendezvous.
    ///
    /// With `pause` unset the go-signal is sent and the call returns
    /// immediately; the child replaces its image and runs free. With
    /// `pause` set the call blocks through the trace handshake and
    /// returns with the child in [State::TracePaused], frozen before the
    /// first instruction of the new image.
    ///
    /// Only legal in [State::Created]. On any handshake failure the child
    /// is force-terminated before the error is returned.
    pub fn run(&mut self, pause: bool) -> crate::Result<()> {
        debug_assert_eq!(self.state, State::Created);
        if self.state != State::Created {
            return Err(Error::InvalidState {
                operation: "run",
                state: self.state,
            });
        }

        if !self.is_alive() {
            return Err(Error::ChildDiedUnexpectedly);
        }

        let Some(sender) = self.start_tx.take() else {
            return Err(Error::Defect("start channel already consumed"));
        };

        let start = if pause {
            StartSignal::GoTraced
        } else {
            StartSignal::Go
        };

        if let Err(e) = sender.send(start) {
            // The child may stay blocked on the channel forever; reclaim it.
            let _ = self.terminate(true);
            return Err(e);
        }

        if !pause {
            self.state = State::Running;
            return Ok(());
        }

        // The child sets up tracing and stops itself; drive it to the
        // trap raised inside the image-replace call.
        match sys::trace::sync_to_exec_stop(self.pid) {
            Ok(()) => {
                self.state = State::TracePaused;
                Ok(())
            }
            Err(e) => {
                sys::trace::detach(self.pid);
                let _ = self.terminate(true);
                Err(e)
            }
        }
    }

    /// Releases a trace-paused child to run unmonitored.
    ///
    /// Only legal in [State::TracePaused].
    pub fn resume(&mut self) -> crate::Result<()> {
        debug_assert_eq!(self.state, State::TracePaused);
        if self.state != State::TracePaused {
            return Err(Error::InvalidState {
                operation: "resume",
                state: self.state,
            });
        }

        sys::trace::detach(self.pid);
        self.state = State::Running;

        Ok(())
    }

    /// Terminates the child and confirms its death with a blocking reap.
    ///
    /// Idempotent: a child that already died makes this a no-op. A forced
    /// terminate kills outright, otherwise the child is asked to exit
    /// with a graceful terminate request.
    pub fn terminate(&mut self, force: bool) -> crate::Result<()> {
        // The child may have died in the meantime.
        if !self.is_alive() {
            return Ok(());
        }

        if self.pid.as_raw() <= 1 {
            return Err(Error::Defect("child pid is not a spawnable process id"));
        }

        if self.state == State::TracePaused {
            // Make the signal deliverable before sending it.
            sys::trace::detach(self.pid);
        }

        let sig = if force { Signal::SIGKILL } else { Signal::SIGTERM };
        let _ = signal::kill(self.pid, sig);

        self.check_child(true);

        Ok(())
    }

    /// Blocks until the child dies, returning its disposition.
    ///
    /// Legal in [State::Running] (or [State::Died], where the recorded
    /// disposition is returned immediately). A child in `Created` or
    /// `TracePaused` cannot make progress, so waiting there is an error.
    pub fn wait(&mut self) -> crate::Result<ExitStatus> {
        match self.state {
            State::Died => {}
            State::Running => {
                while self.state != State::Died {
                    self.check_child(true);
                }
            }
            state => {
                return Err(Error::InvalidState {
                    operation: "wait on",
                    state,
                });
            }
        }

        self.exit_status
            .ok_or(Error::Defect("child is gone but no exit status was observed"))
    }

    /// Reaps the child if its status changed, recording a terminal
    /// disposition. Stop/continue changes leave the state untouched.
    fn check_child(&mut self, block: bool) {
        match sys::wait::reap(self.pid, block) {
            Reaped::Alive => (),
            Reaped::Exited(status) => {
                tracing::debug!(pid = self.pid.as_raw(), status = ?status, "child reaped");
                self.exit_status = Some(status);
                self.state = State::Died;
            }
            Reaped::Lost => self.state = State::Died,
        }
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        // Close the channel write end if the go-signal was never sent; a
        // child still blocked on it reads EOF and bails out.
        self.start_tx = None;

        if self.is_alive() {
            let _ = self.terminate(true);
        }
    }
}
