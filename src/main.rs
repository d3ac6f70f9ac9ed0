//! Kiln - a front-end asset builder driven by a static build manifest.

mod cli;
mod compiler;
mod config;
mod embed;
mod logger;
mod manifest;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::ProjectConfig;
use manifest::{LifecycleEvent, Manifest};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    cli::dev::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = ProjectConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => {
            let manifest = Manifest::new(LifecycleEvent::Build, &config);
            cli::build::build_project(&config, &manifest)
        }
        Commands::Dev { .. } => {
            let manifest = Manifest::new(LifecycleEvent::Dev, &config);
            cli::dev::serve(&config, &manifest)
        }
        Commands::Inspect { event, format } => {
            cli::inspect::inspect(&config, event.as_deref(), *format)
        }
    }
}
