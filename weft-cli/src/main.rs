//! # weft CLI
//!
//! Check and run declarative component manifests.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "weft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Instantiate a manifest and print its ports
    Check {
        /// Path to the manifest
        manifest: PathBuf,

        /// Instance config entry as key=json (repeatable)
        #[arg(long = "set", value_name = "KEY=JSON")]
        set: Vec<String>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Instantiate a manifest, feed values to its inputs and print emissions
    Run {
        /// Path to the manifest
        manifest: PathBuf,

        /// Instance config entry as key=json (repeatable)
        #[arg(long = "set", value_name = "KEY=JSON")]
        set: Vec<String>,

        /// Value to send as port=json, in order (repeatable)
        #[arg(long = "send", value_name = "PORT=JSON")]
        send: Vec<String>,

        /// Stop after this many scheduled deliveries
        #[arg(long, default_value_t = 100_000)]
        max_tasks: usize,

        /// Emit JSON lines instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the registered component types and functions
    Types {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries command output
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Check {
            manifest,
            set,
            json,
        } => commands::check_manifest(&manifest, &set, json),
        Commands::Run {
            manifest,
            set,
            send,
            max_tasks,
            json,
        } => {
            let opts = commands::RunOptions {
                set,
                send,
                max_tasks,
                json,
            };
            commands::run_manifest(&manifest, opts)
        }
        Commands::Types { json } => commands::list_types(json),
    }
}
