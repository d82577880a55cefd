use clap::Parser;
use tracing_subscriber::EnvFilter;

mod audio;
mod cli;
mod config;
mod display;
mod error;
mod video;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let configured = if cli.verbose == 0 {
        config::loader::peek_config(cli.config.as_deref())
            .ok()
            .map(|cfg| cfg.logging.level)
    } else {
        None
    };
    let level = cli::log_level(cli.verbose, configured.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::handle_command(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
