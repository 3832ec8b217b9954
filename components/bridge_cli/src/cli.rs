//! Command-line arguments

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Inspect the exposed bindings and the host value boundary
#[derive(Debug, Parser)]
#[command(name = "bridge-inspect", version, about)]
pub struct Cli {
    /// JSON file with context options
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// What to inspect
    #[command(subcommand)]
    pub command: Command,
}

/// Inspector subcommands
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Print the inheritance tree of every exposed type
    Types,

    /// Print the order types are installed in
    Order {
        /// Emit JSON instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Send JSON text across the boundary and print what comes back
    Convert {
        /// JSON text, as a host would send it
        json: String,
    },
}

impl Cli {
    /// The log filter implied by `-v`.
    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
