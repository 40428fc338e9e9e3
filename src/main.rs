//! Streamline CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "streamline")]
#[command(about = "Stream-aware diff and history views for Perforce depots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Config file (defaults to ./streamline.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the reconciled diff of a submitted changelist
    Diff {
        /// Changelist number
        change: u64,
    },
    /// Print the history graph of a stream and its relatives
    Graph {
        /// Depot path of the stream, e.g. //depot/main
        stream: String,

        /// Group lanes by author instead of by stream
        #[arg(long = "virtual")]
        force_virtual: bool,
    },
    /// Print who last changed each line of a file
    Annotate {
        /// Depot path of the file
        path: String,
    },
    /// Start the JSON API server
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env is normal
    let _ = dotenvy::dotenv();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("streamline={log_level}")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root = std::env::current_dir()?;
    let config = streamline_core::StreamlineConfig::discover(cli.config.as_deref(), &root)?;
    tracing::debug!("Streamline v{} using {:?} backend", env!("CARGO_PKG_VERSION"), config.backend.kind);

    match cli.command {
        Commands::Diff { change } => commands::diff(&config, change).await,
        Commands::Graph { stream, force_virtual } => commands::graph(&config, &stream, force_virtual).await,
        Commands::Annotate { path } => commands::annotate(&config, &path).await,
        Commands::Serve { port, host } => {
            let mut config = config;
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            commands::serve(config).await
        }
    }
}
