//! Bin classifier: maps one metric value to low/med/high/missing.

use market_map_district_models::{Bin, BinDefinition, Classification, DistrictRecord};

use crate::catalog::MetricDef;
use crate::matrix;

/// Classifies a single metric value against a bin table.
///
/// Absent and NaN values are `Missing`. Intervals are tested low, med, high
/// with first match winning: low and med are half-open `[lower, upper)`,
/// high matches on its lower bound alone and owns the whole upper tail.
/// A value matching no interval (possible only with a misconfigured table)
/// falls through to `Missing` rather than erroring.
#[must_use]
pub fn classify(value: Option<f64>, bins: &BinDefinition) -> Bin {
    let Some(value) = value else {
        return Bin::Missing;
    };
    if value.is_nan() {
        return Bin::Missing;
    }

    if bins.low.contains(value) {
        return Bin::Low;
    }
    if bins.med.contains(value) {
        return Bin::Med;
    }
    if value >= bins.high.lower {
        return Bin::High;
    }
    Bin::Missing
}

/// Classifies one district record against a reference/achievement metric
/// pair: bins both values, then resolves the matrix outcome.
#[must_use]
pub fn classify_record(
    record: &DistrictRecord,
    reference: &MetricDef,
    achievement: &MetricDef,
) -> Classification {
    let reference_bin = classify(record.value(reference.metric), &reference.bins);
    let achievement_bin = classify(record.value(achievement.metric), &achievement.bins);
    matrix::resolve(reference_bin, achievement_bin)
}
