//! GeoAnchor CLI - Command-line interface
//!
//! Drives the geoanchor view core against the simulated AR SDK and manages
//! its configuration file.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "geoanchor")]
#[command(version, about = "Geospatial AR view core driver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted AR session and print status JSON
    Simulate(SimulateArgs),

    /// View or initialize the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Config(command) => commands::config::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
