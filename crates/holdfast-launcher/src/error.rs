use std::ffi::NulError;

use nix::errno::Errno;
use nix::sys::wait::WaitStatus;

use crate::child::State;

/// Error type of this crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The command name matched no executable.
    #[error("path '{0}' does not exist or is not executable")]
    NotFound(String),

    /// The command name matched several distinct executables.
    #[error("path '{command}' must refer to a unique binary but matched {matches} binaries")]
    AmbiguousCommand {
        /// Command name as given.
        command: String,

        /// Number of binaries it matched on the search path.
        matches: usize,
    },

    /// The argument vector would overflow the image-replace call.
    #[error("too many arguments for command ({0} > 254)")]
    TooManyArguments(usize),

    /// An argument contained an interior NUL byte.
    #[error(transparent)]
    InteriorNul(#[from] NulError),

    /// The start channel could not be created.
    #[error("failed to create start channel: {0}")]
    ChannelCreateFailed(Errno),

    /// The go-signal could not be delivered to the child.
    #[error("failed to write go-signal to start channel: {0}")]
    ChannelWriteFailed(std::io::Error),

    /// The child execution context could not be created.
    #[error("failed to clone child: {0}")]
    SpawnFailed(Errno),

    /// The child died before the controller could drive it.
    #[error("child died unexpectedly")]
    ChildDiedUnexpectedly,

    /// The child reported a status other than the one the trace handshake
    /// expected.
    #[error("unexpected child status: {0:?}")]
    UnexpectedChildStatus(WaitStatus),

    /// Arming the image-replace trap on the stopped child failed.
    #[error("failed to set trace options on child: {0}")]
    TraceSetupFailed(Errno),

    /// Releasing the stopped child failed.
    #[error("failed to continue traced child: {0}")]
    TraceContinueFailed(Errno),

    /// Waiting on the child failed.
    #[error("error while waiting for child: {0}")]
    WaitFailed(Errno),

    /// An operation was attempted in a state it is not legal in.
    #[error("cannot {operation} a child in state {state:?}")]
    InvalidState {
        /// Operation that was attempted.
        operation: &'static str,

        /// State the child was in.
        state: State,
    },

    /// A should-never-happen condition was detected.
    #[error("defect: {0}")]
    Defect(&'static str),
}

/// Result type of this crate.
pub type Result<T> = core::result::Result<T, Error>;
