use anyhow::Result;
use clap::{Parser, Subcommand};
use fairshare_core::HouseholdEngine;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod state;

use commands::Session;

#[derive(Parser, Debug)]
#[command(name = "fairshare", version, about = "Household task load balancing")]
struct Cli {
    /// Engine config (TOML). Defaults to $FAIRSHARE_HOME/config.toml or ~/.fairshare/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Raise log verbosity (RUST_LOG overrides)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the load weight of every pending task in a snapshot
    Weigh {
        /// Household snapshot (JSON)
        snapshot: PathBuf,
    },

    /// Assign every pending task in a snapshot, in order
    Plan {
        snapshot: PathBuf,

        /// Write the updated rotation tracker (JSON) here
        #[arg(long)]
        save_tracker: Option<PathBuf>,
    },

    /// Suggest moves that even out already-assigned tasks
    Rebalance { snapshot: PathBuf },

    /// Household balance status, alerts and trends
    Analyze { snapshot: PathBuf },

    /// Weekly digest
    Digest {
        snapshot: PathBuf,

        /// Do not store this week's score as the next baseline
        #[arg(long, default_value_t = false)]
        no_save: bool,
    },

    /// Engine config file management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config to the fairshare home (never overwrites)
    Init,

    /// Print the effective config
    Show,
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Config { command } = &cli.command {
        return match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => {
                let cfg = config::load_config(cli.config.as_deref())?;
                print!("{}", config::render_config(&cfg)?);
                Ok(())
            }
        };
    }

    let engine = HouseholdEngine::new(config::load_config(cli.config.as_deref())?)?;

    match cli.command {
        Command::Weigh { snapshot } => {
            commands::weigh(&Session::open(engine, &snapshot, cli.json)?)?;
        }
        Command::Plan {
            snapshot,
            save_tracker,
        } => {
            commands::plan(&Session::open(engine, &snapshot, cli.json)?, save_tracker)?;
        }
        Command::Rebalance { snapshot } => {
            commands::rebalance(&Session::open(engine, &snapshot, cli.json)?)?;
        }
        Command::Analyze { snapshot } => {
            commands::analyze(&Session::open(engine, &snapshot, cli.json)?)?;
        }
        Command::Digest { snapshot, no_save } => {
            let home = state::fairshare_home()?;
            commands::digest(&Session::open(engine, &snapshot, cli.json)?, &home, !no_save)?;
        }
        Command::Config { .. } => {}
    }

    Ok(())
}
