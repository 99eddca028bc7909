//! End-to-end generation flow: resolve credentials, pull the month's
//! dataset, join it to boundary polygons, classify, and write the map
//! and table artifacts.

use std::path::PathBuf;

use market_map_district_models::{Metric, ReportMonth, Scope};
use market_map_geography::{GeoError, boundaries, join};
use market_map_metrics::CatalogError;
use market_map_metrics::catalog::Catalog;
use market_map_metrics::legend::build_legend;
use market_map_render::{MapArtifact, RenderError, html, table};
use market_map_warehouse::config::WarehouseConfig;
use market_map_warehouse::{WarehouseError, assemble, config, db};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One fully-specified generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub month: ReportMonth,
    pub scope: Scope,
    pub reference: Metric,
    pub achievement: Metric,
    /// Warehouse database override; falls back to config resolution.
    pub warehouse: Option<String>,
    pub boundaries: PathBuf,
    /// Directory the artifacts are written into.
    pub output: PathBuf,
}

/// What a generation produced, returned to the caller rather than stashed
/// in any global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedReport {
    pub map_path: PathBuf,
    pub table_path: PathBuf,
    pub mapped_districts: usize,
    pub unmapped_districts: usize,
}

/// Runs one generation request to completion. Any failure is terminal
/// for the request; no partial artifact is written.
///
/// # Errors
///
/// * `PipelineError` wrapping the failing stage
pub fn run_generate(request: &GenerateRequest) -> Result<GeneratedReport, PipelineError> {
    let catalog = Catalog::load()?;
    let reference = catalog.get(request.reference);
    let achievement = catalog.get(request.achievement);

    let warehouse_config = match &request.warehouse {
        Some(database) => WarehouseConfig {
            database: database.clone(),
        },
        None => config::resolve()?,
    };
    let conn = db::connect(&warehouse_config)?;

    let records = assemble::fetch_district_records(&conn, request.month, &catalog)?;
    let loaded = boundaries::load_boundaries(&request.boundaries)?;

    let mut dataset = join::attach(records, loaded);
    join::filter_scope(&mut dataset, &request.scope);

    let center = join::map_center(&dataset.districts);
    let legend = build_legend(reference, achievement);
    let views = market_map_render::build_views(&dataset, reference, achievement);

    let html = html::render_map(
        &views,
        center,
        &request.scope,
        request.month,
        reference,
        achievement,
        &legend,
    )?;

    let artifact = MapArtifact {
        file_name: market_map_render::artifact_file_name(
            &request.scope,
            reference,
            achievement,
            request.month,
        ),
        html,
    };

    let map_path = request.output.join(&artifact.file_name);
    std::fs::write(&map_path, &artifact.html).map_err(|source| PipelineError::Write {
        path: map_path.clone(),
        source,
    })?;

    let table_path = map_path.with_extension("csv");
    let table_file = std::fs::File::create(&table_path).map_err(|source| PipelineError::Write {
        path: table_path.clone(),
        source,
    })?;
    table::write_table(table_file, &views, reference, achievement)?;

    let mapped = views.iter().filter(|view| view.polygon.is_some()).count();
    let report = GeneratedReport {
        map_path,
        table_path,
        mapped_districts: mapped,
        unmapped_districts: views.len() - mapped,
    };

    log::info!(
        "generated {} ({} districts mapped, {} unmapped)",
        report.map_path.display(),
        report.mapped_districts,
        report.unmapped_districts
    );

    Ok(report)
}
