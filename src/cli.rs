use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::DEFAULT_CONFIG_FILE;

#[derive(Parser)]
#[command(name = "hfspaces")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative management of Hugging Face Spaces", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Desired configuration file (TOML or JSON)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub file: PathBuf,

    /// State file [default: ~/.local/state/hfspaces/state.toml]
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    /// Hub access token
    #[arg(long, global = true, env = "HF_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Hub endpoint
    #[arg(long, global = true, env = "HF_ENDPOINT")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Create, update and delete spaces to match the configuration
    Apply(ApplyArgs),

    /// Delete every space recorded in state
    Destroy(DestroyArgs),

    /// Adopt an existing space into state
    Import {
        /// Resource address (key under [spaces] in the configuration)
        address: String,

        /// Remote space id (owner/name)
        id: String,
    },

    /// Fetch and print a remote space
    Show {
        /// Remote space id (owner/name)
        id: String,
    },

    /// Inspect or edit the state file
    #[command(subcommand)]
    State(StateCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan this resource address
    #[arg(short, long)]
    pub target: Option<String>,

    /// List remote secret and variable keys instead of trusting state
    #[arg(long)]
    pub refresh_keys: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply this resource address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// List remote secret and variable keys instead of trusting state
    #[arg(long)]
    pub refresh_keys: bool,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Only destroy this resource address
    #[arg(short, long)]
    pub target: Option<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum StateCommand {
    /// List recorded spaces
    List,

    /// Forget a recorded space without deleting it remotely
    Rm {
        /// Resource address
        address: String,
    },
}
