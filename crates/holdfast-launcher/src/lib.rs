//! This crate spawns a child process and keeps it held still until told
//! to go.
//!
//! A tracing tool that wants to instrument a program faces a race: the
//! process must exist before instrumentation can be prepared for it, yet
//! none of the target's code may run until that instrumentation is in
//! place. This crate closes the race with a two-stage handshake:
//!
//! - Every child is created blocked on a one-shot start channel, so the
//!   controller learns its identity while the target binary is not even
//!   loaded yet.
//! - On a traced launch, the child arranges to be traced and stops itself
//!   right before replacing its image; the controller then drives it to a
//!   trap raised inside the image-replace call, leaving the child frozen
//!   at the very first instruction of the new program.
//!
//! # Plain launch
//!
//! ```no_run
//! use holdfast_launcher::{ChildProcess, Command, ExitStatus};
//!
//! # fn main() -> holdfast_launcher::Result<()> {
//! let mut child = ChildProcess::spawn(Command::new("ls").arg("/"))?;
//!
//! child.run(false)?;
//!
//! match child.wait()? {
//!     ExitStatus::Code(code) => println!("exited with {code}"),
//!     ExitStatus::Signal(signal) => println!("terminated by {signal}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Traced launch
//!
//! ```no_run
//! use holdfast_launcher::{ChildProcess, Command};
//!
//! # fn main() -> holdfast_launcher::Result<()> {
//! let mut child = ChildProcess::spawn(Command::new("my-target"))?;
//!
//! // Blocks until the child is frozen at the entry of its new image.
//! child.run(true)?;
//!
//! // ... attach instrumentation to `child.id()` here, race-free ...
//!
//! child.resume()?;
//! child.wait()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Supported Platforms
//!
//! Linux only. The traced launch relies on self-attach tracing and the
//! trap-on-image-replace stop; a port lacking equivalent primitives would
//! plug in under `sys/` with the untraced launch only.

mod child;
mod command;
mod error;
mod paths;
mod sys;

pub use self::child::{ChildProcess, ExitStatus, State};
pub use self::command::Command;
pub use self::error::{Error, Result};
