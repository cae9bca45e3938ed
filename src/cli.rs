use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "station445", about = "Station445 relay: transmissions, signals and the visual archive")]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Print records as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration file
    Validate,

    /// Show the most recent transmission
    Latest,

    /// List the transmission archive
    Archive,

    /// Read one transmission by slug
    Read {
        /// Transmission slug
        slug: String,
    },

    /// List echo signals (music episodes)
    Signals,

    /// List spotlight frequencies
    Frequencies,

    /// Enter the visual archive passcode
    Unlock,

    /// Open the visual archive (requires prior unlock)
    Gallery,

    /// Extract a visual asset to disk
    Extract {
        /// Moment id
        id: String,

        /// Directory to write the asset into
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },

    /// Station command console
    Admin,
}
