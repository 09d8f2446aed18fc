//! Command-line front end for the `holdfast` launcher.

mod cli;

pub use self::cli::{CliAction, CliOpts};
