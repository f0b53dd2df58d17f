//! Command line argument parsing for the recommend CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Recommend - content-based product similarity and hybrid recommendations
#[derive(Parser, Debug, Clone)]
#[command(name = "recommend")]
#[command(about = "Product similarity and hybrid recommendations over a JSON catalog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct RecommendArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Catalog file: a JSON array of products
    #[arg(long, env = "CURIO_CATALOG", value_name = "CATALOG_FILE", global = true)]
    pub catalog: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, env = "CURIO_CONFIG", value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Seed for rule-based sampling
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "json", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl RecommendArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }

    /// Default log filter directive for the effective verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            _ => "debug",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Products related to a product
    Related(RelatedArgs),

    /// Recommendations for a user from a sequence of views
    Personalized(PersonalizedArgs),

    /// Trending products
    Trending(TrendingArgs),

    /// Nearest neighbours of a product by TF-IDF similarity
    Similar(SimilarArgs),

    /// Show embedding and cache statistics
    Stats(StatsArgs),
}

/// Arguments for related products
#[derive(Parser, Debug, Clone)]
pub struct RelatedArgs {
    /// Subject product ID
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: u64,

    /// Maximum number of products to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for personalized recommendations
#[derive(Parser, Debug, Clone)]
pub struct PersonalizedArgs {
    /// User ID
    #[arg(value_name = "USER_ID")]
    pub user_id: u64,

    /// Viewed product, oldest first (repeatable)
    #[arg(long = "view", value_name = "PRODUCT_ID")]
    pub views: Vec<u64>,

    /// Maximum number of products to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for trending products
#[derive(Parser, Debug, Clone)]
pub struct TrendingArgs {
    /// Maximum number of products to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for similarity lookup
#[derive(Parser, Debug, Clone)]
pub struct SimilarArgs {
    /// Subject product ID
    #[arg(value_name = "PRODUCT_ID")]
    pub product_id: u64,

    /// Maximum number of products to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for statistics
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Build the embedding snapshot before reporting
    #[arg(long)]
    pub build: bool,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}
