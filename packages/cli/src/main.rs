#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CLI entry point for the district KPI map generator.
//!
//! `market-map generate` runs one fully-specified generation;
//! `market-map interactive` (also the default when no subcommand is
//! given) walks through scope, month, and metric selection with menus.

mod interactive;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use market_map_district_models::{Metric, ReportMonth, Scope};

use crate::pipeline::GenerateRequest;

#[derive(Parser)]
#[command(name = "market-map", about = "District KPI choropleth generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a map from explicit arguments.
    Generate(GenerateArgs),
    /// Pick the scope, month, and metrics interactively.
    Interactive,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Geography {
    National,
    State,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Reporting month (YYYY-MM or YYYY-MM-DD).
    #[arg(long)]
    month: ReportMonth,

    /// Map scope.
    #[arg(long, value_enum, default_value = "national")]
    geography: Geography,

    /// State name; required when --geography is state.
    #[arg(long)]
    state: Option<String>,

    /// Reference metric identifier (e.g. AEPS_MARKET_SIZE).
    #[arg(long)]
    reference: Metric,

    /// Achievement metric identifier (e.g. MARKET_SHARE).
    #[arg(long)]
    achievement: Metric,

    /// Warehouse database path or DSN, overriding config resolution.
    #[arg(long)]
    warehouse: Option<String>,

    /// Boundary GeoJSON file.
    #[arg(long, default_value = "India_District_Boundaries.geojson")]
    boundaries: PathBuf,

    /// Directory to write the artifacts into.
    #[arg(long, default_value = ".")]
    output: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Generate(args)) => {
            let scope = resolve_scope(args.geography, args.state.as_deref())?;
            let report = pipeline::run_generate(&GenerateRequest {
                month: args.month,
                scope,
                reference: args.reference,
                achievement: args.achievement,
                warehouse: args.warehouse,
                boundaries: args.boundaries,
                output: args.output,
            })?;

            println!("Map:   {}", report.map_path.display());
            println!("Table: {}", report.table_path.display());
        }
        Some(Command::Interactive) | None => interactive::run()?,
    }

    Ok(())
}

fn resolve_scope(
    geography: Geography,
    state: Option<&str>,
) -> Result<Scope, Box<dyn std::error::Error>> {
    match geography {
        Geography::National => Ok(Scope::National),
        Geography::State => {
            let state = state.ok_or("--state is required when --geography is state")?;
            Ok(Scope::State(
                market_map_district_models::normalize_name(state),
            ))
        }
    }
}
