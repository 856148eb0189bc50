mod cli;
mod commands;
mod config;
mod engine;
mod paths;
mod progress;
mod state;
mod ui;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command, StateCommand};
use config::SpacesConfig;
use hubkit::HubClient;
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub config_path: PathBuf,
    pub state_override: Option<PathBuf>,
    pub token: Option<String>,
    pub endpoint: Option<String>,
}

impl Context {
    /// Load the desired configuration; the file must exist
    pub fn config(&self) -> Result<SpacesConfig> {
        SpacesConfig::load(&self.config_path)
            .context("Failed to load configuration (use -f to point at another file)")
    }

    /// Load the configuration if present, else defaults (token and
    /// endpoint still come from flags and environment)
    pub fn config_or_default(&self) -> Result<SpacesConfig> {
        if self.config_path.exists() {
            self.config()
        } else {
            log::debug!("{} not found, using defaults", self.config_path.display());
            Ok(SpacesConfig::default())
        }
    }

    pub fn state_path(&self) -> Result<PathBuf> {
        paths::state_file(self.state_override.as_deref())
    }

    pub fn client(&self, config: &SpacesConfig) -> HubClient {
        HubClient::with_endpoint(
            config.endpoint(self.endpoint.as_deref()),
            config.token(self.token.as_deref()),
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        config_path: paths::expand(&cli.file.to_string_lossy()),
        state_override: cli.state,
        token: cli.token,
        endpoint: cli.endpoint,
    };

    match cli.command {
        Command::Plan(args) => {
            commands::declarative::plan(&ctx, args.target.as_deref(), args.refresh_keys)
        }
        Command::Apply(args) => commands::declarative::apply(
            &ctx,
            args.target.as_deref(),
            args.yes,
            args.refresh_keys,
        ),
        Command::Destroy(args) => {
            commands::declarative::destroy(&ctx, args.target.as_deref(), args.yes)
        }
        Command::Import { address, id } => commands::import::run(&ctx, &address, &id),
        Command::Show { id } => commands::show::run(&ctx, &id),
        Command::State(cmd) => match cmd {
            StateCommand::List => commands::state::list(&ctx),
            StateCommand::Rm { address } => commands::state::rm(&ctx, &address),
        },
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hfspaces", &mut io::stdout());
            Ok(())
        }
    }
}
