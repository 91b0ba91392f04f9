//! Core CLI definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modcat")]
#[command(about = "Crafting modifier catalog builder and query tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the catalog artifact from a raw snapshot export
    #[command(visible_alias = "b")]
    Build {
        /// Path to the raw snapshot JSON
        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the catalog artifact (can also set MODCAT_CATALOG env var)
        #[arg(short, long, env = "MODCAT_CATALOG", default_value = modcat::DEFAULT_CATALOG_PATH)]
        output: PathBuf,

        /// Pretty-print the artifact JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show catalog metadata and counts
    Stats {
        /// Path to the catalog artifact
        #[arg(short, long, env = "MODCAT_CATALOG", default_value = modcat::DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,
    },

    /// Search mods by name substring
    #[command(visible_alias = "s")]
    Search {
        /// Case-insensitive substring to look for
        query: String,

        /// Path to the catalog artifact
        #[arg(short, long, env = "MODCAT_CATALOG", default_value = modcat::DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,

        /// Maximum rows to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List mods applicable to a base item
    #[command(visible_alias = "a")]
    Applicable {
        /// Base item display name (e.g. "Vaal Regalia")
        base: String,

        /// Path to the catalog artifact
        #[arg(short, long, env = "MODCAT_CATALOG", default_value = modcat::DEFAULT_CATALOG_PATH)]
        catalog: PathBuf,

        /// Inclusive item-level ceiling
        #[arg(long)]
        ilvl: Option<u32>,

        /// Affix filter: prefix, suffix, all
        #[arg(long, default_value = "all")]
        affix: String,

        /// Source filter: base, essence, desecrated, corrupted, all
        #[arg(long, default_value = "all")]
        source: String,

        /// Free-text filter against name or tags
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Validate a crafting selection file
    Check {
        /// Path to a JSON array of selected mods
        #[arg(short, long)]
        selection: PathBuf,

        /// Exempt corrupted mods from the prefix/suffix caps
        #[arg(long)]
        corrupted_exempt: bool,
    },

    /// Expected-value arithmetic for a crafting attempt
    Ev {
        /// Success rate in percent
        #[arg(long)]
        success_rate: f64,

        /// Cost per attempt
        #[arg(long)]
        cost: f64,

        /// Target sell price on success
        #[arg(long)]
        price: f64,

        /// Number of attempts
        #[arg(long, default_value_t = 1)]
        attempts: u32,
    },
}
