//! CLI entry point for sanity-press

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "sanity-press")]
#[command(version)]
#[command(about = "A server-rendered blog on top of a Sanity content store", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every known route into the public folder
    #[command(alias = "b")]
    Build,

    /// Serve pages with incremental regeneration
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Generate every known route before accepting requests
        #[arg(short, long)]
        warm: bool,
    },

    /// List routes and whether the last build wrote them
    List,

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "sanity_press=debug,info"
    } else {
        "sanity_press=info"
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

    match cli.command {
        Commands::Build => {
            let blog = sanity_press::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");
            let report = blog.build().await?;
            println!(
                "Generated {} pages in {} ms",
                report.pages_written(),
                report.elapsed_ms
            );
            for slug in &report.skipped {
                println!("  skipped {} (no longer in the content store)", slug);
            }
        }

        Commands::Serve { port, ip, warm } => {
            let blog = sanity_press::Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            blog.serve(&ip, port, warm).await?;
        }

        Commands::List => {
            let blog = sanity_press::Blog::new(&base_dir)?;
            sanity_press::commands::list::run(&blog).await?;
        }

        Commands::Clean => {
            let blog = sanity_press::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("sanity-press version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
