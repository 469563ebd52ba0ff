//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fluxo - categorized spending from pt-BR bank statement exports
#[derive(Parser)]
#[command(name = "fluxo")]
#[command(about = "Self-hosted personal finance dashboard", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "fluxo.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import a statement export
    Import {
        /// CSV statement file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Skip the AI fallback even when configured
        #[arg(long)]
        no_ai: bool,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory containing the built dashboard UI
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },

    /// Show record counts and totals
    Status,
}
