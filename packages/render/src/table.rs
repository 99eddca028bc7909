use std::io::Write;

use market_map_district_models::Bin;
use market_map_metrics::catalog::MetricDef;

use crate::{DistrictView, RenderError};

/// Writes the classified dataset as CSV, one row per district.
///
/// Geometry-less districts are included with `ON_MAP = false` so that
/// warehouse rows without a boundary stay visible.
///
/// # Errors
///
/// * `RenderError::Csv` if serialization fails
pub fn write_table<W: Write>(
    writer: W,
    views: &[DistrictView],
    reference: &MetricDef,
    achievement: &MetricDef,
) -> Result<(), RenderError> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record([
        "DISTRICT",
        "STATE",
        reference.column.as_str(),
        achievement.column.as_str(),
        "REF_BIN",
        "ACH_BIN",
        "CLASS",
        "ON_MAP",
    ])?;

    for view in views {
        csv.write_record([
            view.district.as_str(),
            view.state.as_str(),
            &cell(view.reference_value),
            &cell(view.achievement_value),
            bin_label(view.classification.reference_bin),
            bin_label(view.classification.achievement_bin),
            view.classification.label.as_str(),
            if view.polygon.is_some() { "true" } else { "false" },
        ])?;
    }

    csv.flush()?;

    Ok(())
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(String::new, |value| value.to_string())
}

const fn bin_label(bin: Bin) -> &'static str {
    match bin {
        Bin::Low => "low",
        Bin::Med => "med",
        Bin::High => "high",
        Bin::Missing => "na",
    }
}
