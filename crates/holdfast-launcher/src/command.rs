use std::collections::HashSet;
use std::env;
use std::ffi::{CString, OsString};
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use crate::error::Error;
use crate::paths;

/// Number of slots in the argument vector handed to the image-replace
/// call, including the terminating null.
const MAX_ARGS: usize = 256;

/// A command to launch, built from a program name and its arguments.
#[derive(Debug, Clone)]
pub struct Command {
    /// Program to spawn (a bare name resolved on `PATH`, or a path).
    pub program: String,

    /// Program arguments for the process to spawn.
    pub args: Vec<String>,
}

impl Command {
    /// Constructs a new `Command` launching `program` with no arguments.
    ///
    /// If `program` contains no path separator, it is resolved on `PATH`
    /// at spawn time and must match exactly one executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Adds an argument to pass to the program.
    ///
    /// To pass multiple arguments see [`args`](Self::args).
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments to pass to the program.
    ///
    /// To pass a single argument see [`arg`](Self::arg).
    pub fn args<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        args.into_iter().fold(self, |cmd, arg| cmd.arg(arg))
    }

    /// Resolves the program to a unique executable and materializes the
    /// argument vector for the image-replace call.
    pub(crate) fn into_argv(self) -> crate::Result<Vec<CString>> {
        let program = resolved(&self.program, env::var_os("PATH").as_ref())?;

        // One slot goes to the program itself, one to the terminator.
        if self.args.len() + 1 >= MAX_ARGS - 1 {
            return Err(Error::TooManyArguments(self.args.len() + 1));
        }

        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(CString::new(program.into_os_string().into_vec())?);
        for arg in self.args {
            argv.push(CString::new(arg)?);
        }

        Ok(argv)
    }
}

/// Resolves `name` to exactly one executable path.
///
/// Several matches are accepted only when they all canonicalize to the
/// same file (`/bin` is commonly a symlink to `/usr/bin`), in which case
/// the first raw match is kept so that argv[0] is stable.
fn resolved(name: &str, search_path: Option<&OsString>) -> crate::Result<PathBuf> {
    let mut matches = paths::resolve_binary_path(name, search_path);

    match matches.len() {
        0 => Err(Error::NotFound(name.to_owned())),
        1 => Ok(matches.swap_remove(0)),
        count => {
            let uniq: HashSet<PathBuf> = matches
                .iter()
                .filter_map(|path| paths::canonical_path(path))
                .collect();

            if uniq.len() == 1 {
                Ok(matches.swap_remove(0))
            } else {
                Err(Error::AmbiguousCommand {
                    command: name.to_owned(),
                    matches: count,
                })
            }
        }
    }
}
