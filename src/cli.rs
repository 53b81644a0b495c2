use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipagroup")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative FreeIPA group management", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what would change, without changing anything
    Plan(GroupArgs),

    /// Make the groups match the desired state
    Apply(GroupArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ActionArg {
    Group,
    Member,
}

// ============================================================================
// Desired State
// ============================================================================

/// Desired state, from flags and/or a TOML file
///
/// Flags override values read from `--file`.
#[derive(Args, Debug, Default)]
pub struct GroupArgs {
    /// Group name (repeat for several groups with --state absent)
    #[arg(short, long = "name", value_name = "NAME")]
    pub names: Vec<String>,

    /// Read desired state from a TOML file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Whether the group (or listed members) should exist
    #[arg(short, long, value_enum)]
    pub state: Option<StateArg>,

    /// Work on the whole group or only on the listed members
    #[arg(short, long, value_enum)]
    pub action: Option<ActionArg>,

    /// Group description
    #[arg(long)]
    pub description: Option<String>,

    /// GID number
    #[arg(long)]
    pub gid: Option<u32>,

    /// Create as a non-POSIX group
    #[arg(long, conflicts_with = "posix")]
    pub nonposix: bool,

    /// Turn a non-POSIX group into a POSIX one
    #[arg(long)]
    pub posix: bool,

    /// Allow external non-IPA members from trusted domains
    #[arg(long)]
    pub external: bool,

    /// Suppress membership processing when creating the group
    #[arg(long)]
    pub nomembers: bool,

    /// Member users (comma-separated; pass with no value for "none")
    #[arg(long = "user", value_delimiter = ',', num_args = 0..)]
    pub users: Option<Vec<String>>,

    /// Member groups (comma-separated; pass with no value for "none")
    #[arg(long = "group", value_delimiter = ',', num_args = 0..)]
    pub groups: Option<Vec<String>>,

    /// Member services (comma-separated; pass with no value for "none")
    #[arg(long = "service", value_delimiter = ',', num_args = 0..)]
    pub services: Option<Vec<String>>,

    /// Principal to authenticate as
    #[arg(short, long, env = "IPAADMIN_PRINCIPAL")]
    pub principal: Option<String>,

    /// Password for the principal
    #[arg(long, env = "IPAADMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}
