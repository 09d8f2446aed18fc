#![allow(missing_docs)]
#![allow(clippy::print_stderr)]

use std::io::BufRead;

use holdfast_cli::{CliAction, CliOpts};

use holdfast_launcher::{ChildProcess, Command, ExitStatus};

use miette::IntoDiagnostic;

use tracing_subscriber::EnvFilter;

fn main() {
    let cli = CliOpts::parse_from_cmdline();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_env_var("HOLDFAST_LOG")
                .from_env_lossy(),
        )
        .init();

    let res = match cli.action {
        CliAction::Run {
            hold,
            program,
            args,
        } => evaluate_run(hold, program, args),
    };

    match res {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}

fn evaluate_run(hold: bool, program: String, args: Vec<String>) -> miette::Result<i32> {
    let command = Command::new(program).args(args);

    let mut child = ChildProcess::spawn(command).into_diagnostic()?;

    if hold {
        child.run(true).into_diagnostic()?;

        eprintln!(
            "holdfast: child {} is held before its first instruction; press Enter to release it",
            child.raw_id()
        );
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).into_diagnostic()?;

        child.resume().into_diagnostic()?;
    } else {
        child.run(false).into_diagnostic()?;
    }

    match child.wait().into_diagnostic()? {
        ExitStatus::Code(exit_code) => Ok(exit_code),
        ExitStatus::Signal(signal) => {
            tracing::warn!(%signal, "child terminated by signal");
            Ok(128 + signal as i32)
        }
    }
}
