use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vuloop")]
#[command(
    author,
    version,
    about = "Microphone-to-speaker loopback with a VU meter"
)]
#[command(
    long_about = "Route live microphone audio to a speaker while showing its loudness on a terminal VU meter"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the loopback and show the VU meter until Ctrl+C
    Run {
        /// Input device name (default device if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Output device name (default device if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Meter only, do not play captured audio
        #[arg(long)]
        no_playback: bool,

        /// Pick input and output devices interactively
        #[arg(short, long)]
        select: bool,

        /// Stop after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// List available audio devices
    Devices {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List supported camera capture resolutions
    Resolutions {
        /// Check a single resolution, e.g. 1280x720
        check: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print config file path
    Path,
    /// Initialize default configuration
    Init,
}
