//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Foodgram recipe-sharing backend.
#[derive(Debug, Parser)]
#[command(name = "foodgram", version, about)]
pub struct Cli {
    /// Configuration file; defaults to `config/default.toml` plus `FOODGRAM_*` variables
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run migrations and serve the HTTP API (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Import a headerless `name,measurement_unit` CSV into an empty ingredient catalog
    LoadIngredients {
        /// Path to the CSV file
        path: PathBuf,
    },

    /// Add a tag to the catalog
    CreateTag {
        /// Display name
        #[arg(long)]
        name: String,

        /// Hex color such as `#E26C2D`
        #[arg(long)]
        color: String,

        /// URL slug
        #[arg(long)]
        slug: String,
    },
}
