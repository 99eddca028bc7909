//! Interactive generation flow: guides the user through scope, month,
//! and metric-pair selection, then runs the pipeline.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use market_map_district_models::{Metric, ReportMonth, STATES, Scope};
use market_map_metrics::catalog::Catalog;

use crate::pipeline::{self, GenerateRequest};

const ALL_STATES: &str = "All States";

/// Runs the interactive prompt loop and, on confirmation, one
/// generation.
///
/// # Errors
///
/// Returns an error if a prompt fails or the generation itself fails.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::load()?;

    let scope = prompt_scope()?;
    let month = prompt_month()?;
    let reference = prompt_metric(&catalog, "Reference metric", 0)?;
    let achievement = prompt_metric(&catalog, "Achievement metric", 1)?;

    let boundaries: String = Input::new()
        .with_prompt("Boundary GeoJSON file")
        .default("India_District_Boundaries.geojson".to_string())
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("Output directory")
        .default(".".to_string())
        .interact_text()?;

    println!();
    println!("  Scope:       {}", scope.label());
    println!("  Month:       {}", month.label());
    println!("  Reference:   {}", catalog.get(reference).name);
    println!("  Achievement: {}", catalog.get(achievement).name);

    if !Confirm::new()
        .with_prompt("Generate map?")
        .default(true)
        .interact()?
    {
        return Ok(());
    }

    let report = pipeline::run_generate(&GenerateRequest {
        month,
        scope,
        reference,
        achievement,
        warehouse: None,
        boundaries: PathBuf::from(boundaries),
        output: PathBuf::from(output),
    })?;

    println!();
    println!("Map:   {}", report.map_path.display());
    println!("Table: {}", report.table_path.display());
    println!(
        "{} districts mapped, {} without a boundary",
        report.mapped_districts, report.unmapped_districts
    );

    Ok(())
}

fn prompt_scope() -> Result<Scope, dialoguer::Error> {
    let geography = Select::new()
        .with_prompt("Geography")
        .items(&["National", "State"])
        .default(0)
        .interact()?;

    if geography == 0 {
        return Ok(Scope::National);
    }

    let mut state_labels: Vec<&str> = vec![ALL_STATES];
    state_labels.extend(STATES);

    let state = Select::new()
        .with_prompt("State")
        .items(&state_labels)
        .default(0)
        .interact()?;

    // "All States" under the state geography is national scope.
    if state == 0 {
        Ok(Scope::National)
    } else {
        Ok(Scope::State(state_labels[state].to_string()))
    }
}

fn prompt_month() -> Result<ReportMonth, dialoguer::Error> {
    let today = chrono::Local::now().date_naive();
    // Latest complete month first.
    let mut months = ReportMonth::options(today);
    months.reverse();

    let labels: Vec<String> = months.iter().map(|month| month.label()).collect();

    let idx = Select::new()
        .with_prompt("Reporting month")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(months[idx])
}

fn prompt_metric(
    catalog: &Catalog,
    prompt: &str,
    default: usize,
) -> Result<Metric, dialoguer::Error> {
    let names: Vec<&str> = Metric::ALL
        .iter()
        .map(|metric| catalog.get(*metric).name.as_str())
        .collect();

    let idx = Select::new()
        .with_prompt(prompt)
        .items(&names)
        .default(default)
        .interact()?;

    Ok(Metric::ALL[idx])
}
