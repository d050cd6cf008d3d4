//! CLI entry point for mdnav

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mdnav::commands;

#[derive(Parser)]
#[command(name = "mdnav")]
#[command(version)]
#[command(about = "Serve a directory of Markdown files as a document catalog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Configuration file (defaults to <cwd>/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the JSON API server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to (overrides config)
        #[arg(short, long)]
        ip: Option<String>,

        /// Disable reloading on file changes
        #[arg(long)]
        no_watch: bool,
    },

    /// List indexed content
    List {
        /// Type of content to list (categories, documents, tags)
        #[arg(default_value = "categories")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdnav=debug,info"
    } else {
        "mdnav=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let app = match cli.config {
        Some(path) => mdnav::Mdnav::with_config(base_dir, mdnav::config::Config::load(&path)?),
        None => mdnav::Mdnav::new(&base_dir)?,
    };

    match cli.command {
        Commands::Serve { port, ip, no_watch } => {
            let ip = ip.unwrap_or_else(|| app.config.server.ip.clone());
            let port = port.unwrap_or(app.config.server.port);
            let watch = app.config.server.watch && !no_watch;
            mdnav::server::start(&app, &ip, port, watch).await?;
        }

        Commands::List { r#type } => {
            commands::list::run(&app, &r#type)?;
        }

        Commands::Version => {
            println!("mdnav version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
