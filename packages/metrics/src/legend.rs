//! Legend builder: the fixed, selection-independent legend for a metric
//! pair.
//!
//! Every legend carries all nine matrix classes plus "No Data" in the same
//! declared order, whether or not a class occurs in the rendered dataset.
//! That keeps legends comparable across months, states, and metric pairs.

use market_map_district_models::LegendEntry;

use crate::catalog::MetricDef;
use crate::matrix::{self, NO_DATA_COLOR, NO_DATA_LABEL};

/// Fixed display order of the legend, by base class label.
pub const LEGEND_ORDER: &[&str] = &[
    "Light Red",
    "Red",
    "Dark Red",
    "Yellow",
    "Mustard",
    "Orange",
    "Light Green",
    "Green",
    "Dark Green",
    NO_DATA_LABEL,
];

/// Threshold descriptions for one axis of the active metric pair.
#[derive(Debug, Clone)]
pub struct AxisLegend {
    /// Display name of the metric on this axis.
    pub metric_name: String,
    /// Description of the high bin (e.g. `> 25 Cr`).
    pub high: String,
    pub med: String,
    pub low: String,
}

impl AxisLegend {
    fn from_def(def: &MetricDef) -> Self {
        Self {
            metric_name: def.name.clone(),
            high: def.descriptions.high.clone(),
            med: def.descriptions.med.clone(),
            low: def.descriptions.low.clone(),
        }
    }
}

/// The complete legend for one generated map.
#[derive(Debug, Clone)]
pub struct Legend {
    /// Threshold descriptions for the reference (row) axis.
    pub reference: AxisLegend,
    /// Threshold descriptions for the achievement (column) axis.
    pub achievement: AxisLegend,
    /// All ten class swatches in [`LEGEND_ORDER`].
    pub entries: Vec<LegendEntry>,
}

/// Builds the legend for the active metric pair.
#[must_use]
pub fn build_legend(reference: &MetricDef, achievement: &MetricDef) -> Legend {
    let entries = LEGEND_ORDER
        .iter()
        .map(|label| {
            if *label == NO_DATA_LABEL {
                return LegendEntry {
                    label: NO_DATA_LABEL.to_string(),
                    color: NO_DATA_COLOR.to_string(),
                };
            }

            let ((ref_level, ach_level), class) = matrix::MATRIX
                .iter()
                .find(|(_, class)| class.label == *label)
                .expect("legend order labels come from the matrix");
            LegendEntry {
                label: matrix::display_label(class, *ref_level, *ach_level),
                color: class.color.to_string(),
            }
        })
        .collect();

    Legend {
        reference: AxisLegend::from_def(reference),
        achievement: AxisLegend::from_def(achievement),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use market_map_district_models::Metric;

    use super::*;
    use crate::catalog::Catalog;

    #[test]
    fn legend_always_has_ten_entries_in_declared_order() {
        let catalog = Catalog::load().unwrap();
        let defs: Vec<_> = Metric::ALL.to_vec();

        // Any pair of metrics yields the same swatch order.
        for reference in &defs {
            for achievement in &defs {
                let legend = build_legend(catalog.get(*reference), catalog.get(*achievement));
                assert_eq!(legend.entries.len(), 10);
                for (entry, expected) in legend.entries.iter().zip(LEGEND_ORDER) {
                    assert!(
                        entry.label.starts_with(expected),
                        "expected {expected}, got {}",
                        entry.label
                    );
                }
                assert_eq!(legend.entries.last().unwrap().label, "No Data");
            }
        }
    }

    #[test]
    fn axis_descriptions_follow_the_selected_metrics() {
        let catalog = Catalog::load().unwrap();
        let legend = build_legend(
            catalog.get(Metric::AepsMarketSize),
            catalog.get(Metric::MarketShare),
        );
        assert_eq!(legend.reference.metric_name, "AEPS Market Size");
        assert_eq!(legend.reference.high, "> 25 Cr");
        assert_eq!(legend.achievement.metric_name, "Market Share");
        assert_eq!(legend.achievement.low, "< 10%");
    }

    #[test]
    fn swatch_labels_encode_bin_pairs() {
        let catalog = Catalog::load().unwrap();
        let legend = build_legend(
            catalog.get(Metric::AepsMarketSize),
            catalog.get(Metric::MarketShare),
        );
        assert_eq!(legend.entries[0].label, "Light Red (Ref=Low, Ach=Low)");
        assert_eq!(legend.entries[8].label, "Dark Green (Ref=High, Ach=High)");
    }
}
