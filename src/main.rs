// this_file: src/main.rs
//! Jrys CLI - daily fortune poster generator

use anyhow::Result;
use clap::{Parser, Subcommand};
use jrys::{logging, PosterConfig, PosterRenderer};
use log::{info, warn};
use std::path::PathBuf;

/// Jrys - generate a daily fortune poster for a user
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, default_value = "info")]
    log_level: String,

    /// Enable quiet mode (only errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "log_level")]
    quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a poster for a user
    Generate {
        /// User id used for the avatar fetch
        user_id: String,

        /// Data directory holding jrys.json, font/, avatars/ and backgroundFolder/
        #[arg(short, long, default_value = "./data")]
        data_dir: PathBuf,

        /// Write the poster here instead of leaving it in a temp file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.quiet);

    match cli.command {
        Commands::Generate {
            user_id,
            data_dir,
            output,
        } => {
            generate(&user_id, data_dir, output)?;
        }
        Commands::Version => {
            println!("jrys version {}", jrys::VERSION);
            println!("Daily fortune poster generator");
        }
    }

    Ok(())
}

fn generate(user_id: &str, data_dir: PathBuf, output: Option<PathBuf>) -> Result<()> {
    info!("Generating fortune poster for user {}", user_id);
    let config = PosterConfig::new(data_dir);
    let renderer = PosterRenderer::new(config)?;
    let temp_path = renderer.generate_to_temp(user_id)?;

    let final_path = match output {
        Some(dest) => {
            std::fs::copy(&temp_path, &dest)?;
            // Handoff complete; losing the temp file is not worth failing over.
            if let Err(e) = std::fs::remove_file(&temp_path) {
                warn!("Could not remove temp file {}: {}", temp_path.display(), e);
            }
            dest
        }
        None => temp_path,
    };

    println!("{}", final_path.display());
    Ok(())
}
