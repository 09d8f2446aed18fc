use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::OwnedFd;

use nix::fcntl::OFlag;
use nix::unistd;

use crate::error::Error;

/// Wire length of a start signal.
const SIGNAL_LEN: usize = size_of::<u64>();

const GO: u64 = b'g' as u64;
const GO_TRACED: u64 = b'p' as u64;

/// Go-signal delivered to the child over the start channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StartSignal {
    /// Replace the process image immediately.
    Go,

    /// Self-trace and stop before replacing the process image.
    GoTraced,
}

impl StartSignal {
    pub(crate) const fn as_raw(self) -> u64 {
        match self {
            Self::Go => GO,
            Self::GoTraced => GO_TRACED,
        }
    }

    /// Decodes a raw channel value. Unknown values read as a plain go;
    /// the child never refuses to start over a garbled signal.
    pub(crate) const fn from_raw(raw: u64) -> Self {
        match raw {
            GO_TRACED => Self::GoTraced,
            _ => Self::Go,
        }
    }
}

/// Creates the one-shot start channel, returning the child's read end and
/// the controller's write end.
pub(crate) fn create() -> crate::Result<(OwnedFd, StartSender)> {
    let (rx, tx) = unistd::pipe2(OFlag::O_CLOEXEC).map_err(Error::ChannelCreateFailed)?;

    Ok((rx, StartSender { fd: tx }))
}

/// Write end of the start channel.
///
/// Sending consumes the sender, so the go-signal cannot be delivered twice
/// and the descriptor is closed exactly once.
pub(crate) struct StartSender {
    fd: OwnedFd,
}

impl StartSender {
    /// Delivers the go-signal and closes the write end.
    ///
    /// The 8-byte payload fits well below `PIPE_BUF`, so the write is
    /// atomic.
    pub(crate) fn send(self, signal: StartSignal) -> crate::Result<()> {
        let mut tx = File::from(self.fd);

        tx.write_all(&signal.as_raw().to_ne_bytes())
            .map_err(Error::ChannelWriteFailed)
    }
}

/// Blocks until the full 8-byte signal arrives, then closes the read end.
///
/// Runs on the child side of the creation boundary.
pub(crate) fn recv(rx: OwnedFd) -> std::io::Result<StartSignal> {
    let mut rx = File::from(rx);

    let mut raw = [0u8; SIGNAL_LEN];
    rx.read_exact(&mut raw)?;

    Ok(StartSignal::from_raw(u64::from_ne_bytes(raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_traced_sentinel_requests_tracing() {
        assert_eq!(StartSignal::from_raw(GO_TRACED), StartSignal::GoTraced);
        assert_eq!(StartSignal::from_raw(GO), StartSignal::Go);
        assert_eq!(StartSignal::from_raw(0xdead_beef), StartSignal::Go);
    }

    #[test]
    fn signal_round_trips_through_the_channel() {
        let (rx, tx) = create().unwrap();

        tx.send(StartSignal::GoTraced).unwrap();

        assert_eq!(recv(rx).unwrap(), StartSignal::GoTraced);
    }
}
