mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modcat=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            output,
            pretty,
        } => {
            commands::build::handle(&input, &output, pretty)?;
        }

        Commands::Stats { catalog } => {
            commands::catalog::stats(&catalog)?;
        }

        Commands::Search {
            query,
            catalog,
            limit,
        } => {
            commands::catalog::search(&catalog, &query, limit)?;
        }

        Commands::Applicable {
            base,
            catalog,
            ilvl,
            affix,
            source,
            query,
        } => {
            commands::catalog::applicable(&catalog, &base, ilvl, &affix, &source, query)?;
        }

        Commands::Check {
            selection,
            corrupted_exempt,
        } => {
            commands::check::handle(&selection, corrupted_exempt)?;
        }

        Commands::Ev {
            success_rate,
            cost,
            price,
            attempts,
        } => {
            commands::ev::handle(success_rate, cost, price, attempts)?;
        }
    }

    Ok(())
}
