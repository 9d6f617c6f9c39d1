mod doctor_cmd;
mod scan_cmd;
mod serve_cmd;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use cardscan_config::AppConfig;
use cardscan_logging::init_logger;

#[derive(Parser)]
#[command(name = "cardscan")]
#[command(about = "CardScan: Arabic national ID card OCR service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP OCR server
    Serve {
        /// Port to bind the HTTP server to (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Optional YAML config file
        #[arg(short, long, env = "CARDSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Run OCR on one image and print the classified fields as JSON
    Scan {
        /// Image file (jpg, jpeg or png)
        file: PathBuf,

        /// Optional YAML config file
        #[arg(short, long, env = "CARDSCAN_CONFIG")]
        config: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Check configuration and the tesseract installation
    Doctor {
        /// Optional YAML config file
        #[arg(short, long, env = "CARDSCAN_CONFIG")]
        config: Option<PathBuf>,
    },
}

impl Commands {
    fn config_path(&self) -> Option<&Path> {
        match self {
            Commands::Serve { config, .. }
            | Commands::Scan { config, .. }
            | Commands::Doctor { config } => config.as_deref(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = cardscan_config::load(cli.command.config_path()).await?;
    if let Commands::Serve { port: Some(port), .. } = &cli.command {
        config.server.port = *port;
    }
    init_logging(&config);

    match cli.command {
        Commands::Serve { .. } => {
            cardscan_config::ensure_valid(&config)?;
            serve_cmd::run(config).await
        }
        Commands::Scan { file, pretty, .. } => {
            cardscan_config::ensure_valid(&config)?;
            scan_cmd::run(&config, &file, pretty).await
        }
        Commands::Doctor { .. } => doctor_cmd::run(&config).await,
    }
}

fn init_logging(config: &AppConfig) {
    init_logger(
        &config.logging.level,
        config.logging.json,
        config.logging.dir.as_deref(),
    );
}
