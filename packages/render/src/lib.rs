#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Renders a classified district dataset into the self-contained
//! choropleth HTML artifact and the companion CSV table.

pub mod html;
pub mod table;

use geo::MultiPolygon;
use market_map_district_models::{Bin, Classification, ReportMonth, Scope};
use market_map_geography::join::JoinedDataset;
use market_map_metrics::catalog::MetricDef;
use market_map_metrics::classify::classify_record;
use market_map_metrics::matrix;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One district ready for rendering: values for the active metric pair,
/// the resolved classification, and the polygon when the district has
/// one. Geometry-less districts still appear in the CSV table.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictView {
    pub district: String,
    pub state: String,
    pub reference_value: Option<f64>,
    pub achievement_value: Option<f64>,
    pub classification: Classification,
    pub polygon: Option<MultiPolygon<f64>>,
}

/// The finished map artifact: a deterministic file name and the
/// self-contained HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapArtifact {
    pub file_name: String,
    pub html: String,
}

/// Classifies every district in the joined dataset against the active
/// metric pair and sorts the views by district name so rendering is
/// deterministic. Boundary-only districts classify as "No Data".
#[must_use]
pub fn build_views(
    dataset: &JoinedDataset,
    reference: &MetricDef,
    achievement: &MetricDef,
) -> Vec<DistrictView> {
    let mut views: Vec<DistrictView> = dataset
        .districts
        .iter()
        .map(|district| {
            let classification = district.record.as_ref().map_or_else(
                || matrix::resolve(Bin::Missing, Bin::Missing),
                |record| classify_record(record, reference, achievement),
            );

            DistrictView {
                district: district.boundary.district.clone(),
                state: district.state().to_string(),
                reference_value: district
                    .record
                    .as_ref()
                    .and_then(|record| record.value(reference.metric)),
                achievement_value: district
                    .record
                    .as_ref()
                    .and_then(|record| record.value(achievement.metric)),
                classification,
                polygon: Some(district.boundary.polygon.clone()),
            }
        })
        .chain(dataset.unmapped.iter().map(|record| DistrictView {
            district: record.district.clone(),
            state: record.state.clone(),
            reference_value: record.value(reference.metric),
            achievement_value: record.value(achievement.metric),
            classification: classify_record(record, reference, achievement),
            polygon: None,
        }))
        .collect();

    views.sort_by(|a, b| a.district.cmp(&b.district));

    views
}

/// Artifact file name:
/// `GEO_MAP_{scope}_{REF_COLUMN}_x_{ACH_COLUMN}_{YYYY-MM-DD}.html`.
#[must_use]
pub fn artifact_file_name(
    scope: &Scope,
    reference: &MetricDef,
    achievement: &MetricDef,
    month: ReportMonth,
) -> String {
    format!(
        "GEO_MAP_{}_{}_x_{}_{}.html",
        scope.slug(),
        reference.column,
        achievement.column,
        month.iso()
    )
}
