use clap::{Args, Parser, Subcommand};

const DEFAULT_LIMIT: usize = 50;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Record a successful ssh command from the shell hook.
    Record {
        #[arg(long, allow_negative_numbers = true)]
        exit_code: i32,
        #[arg(long)]
        raw: String,
    },
    /// Add a command to general history without executing it.
    Add {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// List recent ssh commands.
    List {
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long)]
        with_ids: bool,
    },
    /// Pick ssh arguments for completion.
    Pick(PickArgs),
    /// Pick full command lines for completion.
    PickCommand(PickArgs),
    /// Set or clear the display alias of an ssh destination.
    Alias {
        #[arg(long)]
        name: String,
        #[arg(long, conflicts_with = "address", required_unless_present = "address")]
        id: Option<usize>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Delete ssh history entries.
    Delete {
        #[arg(long, conflicts_with = "pick", required_unless_present = "pick")]
        index: Option<usize>,
        #[arg(long)]
        pick: bool,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Execute ssh with safe tokenization, without a shell.
    Exec {
        #[arg(allow_hyphen_values = true)]
        args_string: String,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct PickArgs {
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,
    /// Print the item at `--select` instead of opening the picker.
    #[arg(long, requires = "select")]
    pub non_interactive: bool,
    #[arg(long)]
    pub select: Option<usize>,
}

impl Command {
    /// Prefix for diagnostics, e.g. `delete failed: ...`.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Record { .. } => "record",
            Command::Add { .. } => "add",
            Command::List { .. } => "list",
            Command::Pick(_) => "pick",
            Command::PickCommand(_) => "pick-command",
            Command::Alias { .. } => "alias",
            Command::Delete { .. } => "delete",
            Command::Exec { .. } => "exec",
        }
    }
}
