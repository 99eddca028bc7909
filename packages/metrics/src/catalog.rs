//! Metric catalog — loads all metric definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/metrics/catalog/` is baked into the binary
//! at compile time via [`include_str!`]. Adding a metric means adding a
//! variant to [`Metric`], creating its TOML file, and adding it to the list
//! below; the load-time validation refuses to start with a partial catalog,
//! so the classifier and legend can never disagree about what exists.

use std::collections::BTreeMap;

use market_map_district_models::{BinDefinition, BinLevel, BinRange, Metric};
use serde::Deserialize;

use crate::CatalogError;

/// TOML configs embedded at compile time.
const CATALOG_TOMLS: &[(&str, &str)] = &[
    (
        "aeps_market_size",
        include_str!("../catalog/aeps_market_size.toml"),
    ),
    ("market_share", include_str!("../catalog/market_share.toml")),
    (
        "trans_density_10k",
        include_str!("../catalog/trans_density_10k.toml"),
    ),
    (
        "sp_density_10k",
        include_str!("../catalog/sp_density_10k.toml"),
    ),
    ("cms_gtv", include_str!("../catalog/cms_gtv.toml")),
    (
        "monthly_visit_coverage",
        include_str!("../catalog/monthly_visit_coverage.toml"),
    ),
    (
        "partner_presence",
        include_str!("../catalog/partner_presence.toml"),
    ),
    (
        "field_presence",
        include_str!("../catalog/field_presence.toml"),
    ),
    (
        "sp_winback_ratio",
        include_str!("../catalog/sp_winback_ratio.toml"),
    ),
];

/// How the dataset assembler treats a district with no warehouse value for
/// this metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Absent values become `0.0` after the merge (per-district aggregates:
    /// no rows genuinely means zero activity).
    ZeroFill,
    /// Absent values stay missing and classify as "No Data" (base review
    /// metrics: an absent district is unreported, not zero).
    Missing,
}

/// Human-readable threshold descriptions for the three bin levels.
#[derive(Debug, Clone, Deserialize)]
pub struct BinDescriptions {
    pub low: String,
    pub med: String,
    pub high: String,
}

impl BinDescriptions {
    /// The description for a given level.
    #[must_use]
    pub fn level(&self, level: BinLevel) -> &str {
        match level {
            BinLevel::Low => &self.low,
            BinLevel::Med => &self.med,
            BinLevel::High => &self.high,
        }
    }
}

/// A complete, validated metric definition.
#[derive(Debug, Clone)]
pub struct MetricDef {
    /// Which metric this defines.
    pub metric: Metric,
    /// Human-readable name shown in titles, legends, and tooltips.
    pub name: String,
    /// Column identifier in the assembled warehouse row set.
    pub column: String,
    /// Unit annotation (`Cr`, `%`, ...).
    pub unit: String,
    /// Missing-value policy applied by the dataset assembler.
    pub missing_policy: MissingPolicy,
    /// Bin thresholds partitioning the real line.
    pub bins: BinDefinition,
    /// Threshold descriptions rendered in the legend.
    pub descriptions: BinDescriptions,
}

// ── Raw deserialization shapes ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawRange {
    lower: Option<f64>,
    upper: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawBins {
    low: RawRange,
    med: RawRange,
    high: RawRange,
}

#[derive(Debug, Deserialize)]
struct RawMetricDef {
    id: Metric,
    name: String,
    column: String,
    unit: String,
    missing_policy: MissingPolicy,
    bins: RawBins,
    descriptions: BinDescriptions,
}

/// The validated metric catalog: exactly one [`MetricDef`] per [`Metric`].
#[derive(Debug, Clone)]
pub struct Catalog {
    defs: BTreeMap<Metric, MetricDef>,
}

impl Catalog {
    /// Parses and validates all embedded catalog entries.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if any entry fails to parse, a metric is
    /// defined twice or not at all, a bin table has a gap or overlap, or a
    /// threshold description is empty.
    pub fn load() -> Result<Self, CatalogError> {
        let mut defs = BTreeMap::new();

        for (name, toml_str) in CATALOG_TOMLS {
            let raw: RawMetricDef =
                toml::from_str(toml_str).map_err(|e| CatalogError::Parse {
                    name: (*name).to_string(),
                    source: Box::new(e),
                })?;
            let def = validate(raw)?;
            let metric = def.metric;
            if defs.insert(metric, def).is_some() {
                return Err(CatalogError::Duplicate { metric });
            }
        }

        for metric in Metric::ALL {
            if !defs.contains_key(metric) {
                return Err(CatalogError::MissingMetric { metric: *metric });
            }
        }

        log::debug!("Loaded {} metric definitions", defs.len());
        Ok(Self { defs })
    }

    /// The definition for a metric.
    ///
    /// # Panics
    ///
    /// Never panics in practice: [`Catalog::load`] guarantees completeness
    /// over the closed [`Metric`] enum.
    #[must_use]
    pub fn get(&self, metric: Metric) -> &MetricDef {
        self.defs
            .get(&metric)
            .expect("catalog validated complete at load")
    }

    /// All definitions, in [`Metric`] order.
    pub fn defs(&self) -> impl Iterator<Item = &MetricDef> {
        self.defs.values()
    }
}

/// Checks one raw definition and lowers it to a [`MetricDef`].
///
/// Partition rules: low is `(-inf, a)`, med is `[a, b)`, high is `[b, +inf)`
/// with `a < b`. Any declared bound that breaks boundary continuity is a
/// gap or overlap and is rejected.
fn validate(raw: RawMetricDef) -> Result<MetricDef, CatalogError> {
    let metric = raw.id;
    let fail = |message: String| CatalogError::Validation { metric, message };

    let low_lower = raw.bins.low.lower.unwrap_or(f64::NEG_INFINITY);
    if low_lower != f64::NEG_INFINITY {
        return Err(fail(format!(
            "low bin must be unbounded below, got lower = {low_lower}"
        )));
    }
    let Some(low_upper) = raw.bins.low.upper else {
        return Err(fail("low bin needs a finite upper bound".to_string()));
    };
    let Some(med_lower) = raw.bins.med.lower else {
        return Err(fail("med bin needs a finite lower bound".to_string()));
    };
    let Some(med_upper) = raw.bins.med.upper else {
        return Err(fail("med bin needs a finite upper bound".to_string()));
    };
    let Some(high_lower) = raw.bins.high.lower else {
        return Err(fail("high bin needs a finite lower bound".to_string()));
    };
    let high_upper = raw.bins.high.upper.unwrap_or(f64::INFINITY);
    if high_upper != f64::INFINITY {
        return Err(fail(format!(
            "high bin must be unbounded above, got upper = {high_upper}"
        )));
    }

    if !(low_upper.is_finite() && med_upper.is_finite()) {
        return Err(fail("interior bounds must be finite".to_string()));
    }
    if (med_lower - low_upper).abs() > f64::EPSILON {
        return Err(fail(format!(
            "gap/overlap between low and med: low ends at {low_upper}, med starts at {med_lower}"
        )));
    }
    if (high_lower - med_upper).abs() > f64::EPSILON {
        return Err(fail(format!(
            "gap/overlap between med and high: med ends at {med_upper}, high starts at {high_lower}"
        )));
    }
    if med_lower >= med_upper {
        return Err(fail(format!(
            "med bin is empty or inverted: [{med_lower}, {med_upper})"
        )));
    }

    for (level, desc) in [
        (BinLevel::Low, &raw.descriptions.low),
        (BinLevel::Med, &raw.descriptions.med),
        (BinLevel::High, &raw.descriptions.high),
    ] {
        if desc.trim().is_empty() {
            return Err(fail(format!("empty description for {} bin", level.pretty())));
        }
    }

    if raw.name.trim().is_empty() {
        return Err(fail("empty display name".to_string()));
    }
    if raw.column.trim().is_empty() {
        return Err(fail("empty column identifier".to_string()));
    }

    Ok(MetricDef {
        metric,
        name: raw.name,
        column: raw.column,
        unit: raw.unit,
        missing_policy: raw.missing_policy,
        bins: BinDefinition {
            low: BinRange {
                lower: f64::NEG_INFINITY,
                upper: low_upper,
            },
            med: BinRange {
                lower: med_lower,
                upper: med_upper,
            },
            high: BinRange {
                lower: high_lower,
                upper: f64::INFINITY,
            },
        },
        descriptions: raw.descriptions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_metrics() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(catalog.defs().count(), Metric::ALL.len());
    }

    #[test]
    fn every_metric_variant_is_defined() {
        let catalog = Catalog::load().unwrap();
        for metric in Metric::ALL {
            let def = catalog.get(*metric);
            assert_eq!(def.metric, *metric);
        }
    }

    #[test]
    fn columns_are_unique_and_nonempty() {
        let catalog = Catalog::load().unwrap();
        let mut columns: Vec<&str> = catalog.defs().map(|d| d.column.as_str()).collect();
        assert!(columns.iter().all(|c| !c.is_empty()));
        columns.sort_unstable();
        columns.dedup();
        assert_eq!(columns.len(), Metric::ALL.len());
    }

    #[test]
    fn all_bin_tables_are_contiguous() {
        let catalog = Catalog::load().unwrap();
        for def in catalog.defs() {
            assert_eq!(def.bins.low.lower, f64::NEG_INFINITY, "{}", def.name);
            assert_eq!(def.bins.low.upper, def.bins.med.lower, "{}", def.name);
            assert_eq!(def.bins.med.upper, def.bins.high.lower, "{}", def.name);
            assert_eq!(def.bins.high.upper, f64::INFINITY, "{}", def.name);
        }
    }

    #[test]
    fn base_review_metrics_keep_missing_values() {
        let catalog = Catalog::load().unwrap();
        assert_eq!(
            catalog.get(Metric::AepsMarketSize).missing_policy,
            MissingPolicy::Missing
        );
        assert_eq!(
            catalog.get(Metric::MarketShare).missing_policy,
            MissingPolicy::Missing
        );
        assert_eq!(
            catalog.get(Metric::CmsGtv).missing_policy,
            MissingPolicy::ZeroFill
        );
    }

    #[test]
    fn rejects_gapped_bin_table() {
        let toml_str = r#"
            id = "CMS_GTV"
            name = "CMS GTV"
            column = "CMS_GTV"
            unit = "Cr"
            missing_policy = "zero_fill"
            [bins.low]
            upper = 1.0
            [bins.med]
            lower = 2.0
            upper = 5.0
            [bins.high]
            lower = 5.0
            [descriptions]
            low = "< 1 Cr"
            med = "2 – 5 Cr"
            high = "> 5 Cr"
        "#;
        let raw: RawMetricDef = toml::from_str(toml_str).unwrap();
        let err = validate(raw).unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
    }

    #[test]
    fn rejects_empty_med_bin() {
        let toml_str = r#"
            id = "CMS_GTV"
            name = "CMS GTV"
            column = "CMS_GTV"
            unit = "Cr"
            missing_policy = "zero_fill"
            [bins.low]
            upper = 5.0
            [bins.med]
            lower = 5.0
            upper = 5.0
            [bins.high]
            lower = 5.0
            [descriptions]
            low = "x"
            med = "x"
            high = "x"
        "#;
        let raw: RawMetricDef = toml::from_str(toml_str).unwrap();
        assert!(validate(raw).is_err());
    }
}
