mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, FilterArgs, Globals};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rollup",
    about = "Dashboard metric rollups: completion, adoption, and due-date urgency",
    version,
    propagate_version = true
)]
struct Cli {
    /// SQLite database with the dashboard records (overrides store.path)
    #[arg(long, global = true, env = "ROLLUP_DB")]
    db: Option<PathBuf>,

    /// Config file (default: built-in defaults)
    #[arg(long, global = true, env = "ROLLUP_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Every rollup merged into one report
    Analytics {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Indicator completion and adoption
    Indicators {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Product completion and delivery status
    Products {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Check-in dates bucketed by urgency
    CheckIns {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,

        /// Open the analytics endpoint in a browser
        #[arg(long)]
        open: bool,
    },

    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let globals = Globals {
        db: cli.db,
        config: cli.config,
        json: cli.json,
    };

    let result = match cli.command {
        Commands::Analytics { filters } => cmd::analytics::run(&globals, filters),
        Commands::Indicators { filters } => cmd::analytics::run_indicators(&globals, filters),
        Commands::Products { filters } => cmd::analytics::run_products(&globals, filters),
        Commands::CheckIns { filters } => cmd::checkins::run(&globals, filters),
        Commands::Serve { port, open } => cmd::serve::run(&globals, port, open),
        Commands::Config { subcommand } => cmd::config::run(&globals, subcommand),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
