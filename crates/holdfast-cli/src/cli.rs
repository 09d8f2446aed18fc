/// The holdfast launcher.
#[derive(clap::Parser)]
pub struct CliOpts {
    /// The command to run.
    #[clap(subcommand)]
    pub action: CliAction,
}

/// The command to run.
#[derive(clap::Subcommand)]
pub enum CliAction {
    /// Command to spawn a new process, optionally holding it at the entry
    /// of its program image.
    Run {
        /// Hold the child frozen at its first instruction until Enter is
        /// pressed.
        #[clap(short = 'H', long)]
        hold: bool,

        /// Name of program to run.
        program: String,

        /// Program's arguments.
        args: Vec<String>,
    },
}

impl CliOpts {
    /// Parses the CLI from the command-line.
    ///
    /// # Warning
    ///
    /// Exits on error.
    pub fn parse_from_cmdline() -> Self {
        <Self as clap::Parser>::parse()
    }
}
