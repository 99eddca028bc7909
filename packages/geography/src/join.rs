use std::collections::BTreeMap;

use geo::Centroid;
use market_map_district_models::{DistrictRecord, Scope};

use crate::boundaries::DistrictBoundary;

/// Fallback center when no polygon yields a centroid.
const DEFAULT_CENTER: (f64, f64) = (22.5, 79.0);

/// One boundary polygon with its warehouse record, if the district had
/// one. Boundary-only districts render as "No Data".
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDistrict {
    pub boundary: DistrictBoundary,
    pub record: Option<DistrictRecord>,
}

impl JoinedDistrict {
    /// The state to scope by: the warehouse row's state when present,
    /// otherwise the boundary's.
    #[must_use]
    pub fn state(&self) -> &str {
        self.record
            .as_ref()
            .map_or(self.boundary.state.as_str(), |record| record.state.as_str())
    }
}

/// Result of joining warehouse records onto boundary polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedDataset {
    pub districts: Vec<JoinedDistrict>,
    /// Records whose district matched no boundary; kept for tabular
    /// export so they do not silently disappear.
    pub unmapped: Vec<DistrictRecord>,
}

/// Outer-joins records to boundaries on normalized district name.
///
/// Every boundary survives (with or without a record); records that
/// match no boundary land in `unmapped` and are logged.
#[must_use]
pub fn attach(records: Vec<DistrictRecord>, boundaries: Vec<DistrictBoundary>) -> JoinedDataset {
    let mut by_district: BTreeMap<String, DistrictRecord> = records
        .into_iter()
        .map(|record| (record.district.clone(), record))
        .collect();

    let districts = boundaries
        .into_iter()
        .map(|boundary| {
            let record = by_district.remove(&boundary.district);
            JoinedDistrict { boundary, record }
        })
        .collect();

    let unmapped: Vec<DistrictRecord> = by_district.into_values().collect();
    if !unmapped.is_empty() {
        log::warn!(
            "{} districts have warehouse data but no boundary polygon: {}",
            unmapped.len(),
            unmapped
                .iter()
                .map(|record| record.district.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    JoinedDataset { districts, unmapped }
}

/// Restricts the dataset to one state when the scope asks for it.
pub fn filter_scope(dataset: &mut JoinedDataset, scope: &Scope) {
    let Scope::State(state) = scope else {
        return;
    };

    dataset
        .districts
        .retain(|district| district.state() == state);
    dataset.unmapped.retain(|record| &record.state == state);
}

/// Map center as `(lat, lon)`: the mean of the polygon centroids, or a
/// fixed fallback when nothing has a centroid.
#[must_use]
pub fn map_center(districts: &[JoinedDistrict]) -> (f64, f64) {
    let centroids: Vec<_> = districts
        .iter()
        .filter_map(|district| district.boundary.polygon.centroid())
        .collect();

    if centroids.is_empty() {
        return DEFAULT_CENTER;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = centroids.len() as f64;
    let lat = centroids.iter().map(|point| point.y()).sum::<f64>() / count;
    let lon = centroids.iter().map(|point| point.x()).sum::<f64>() / count;

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use geo::{MultiPolygon, polygon};
    use market_map_district_models::Metric;

    use super::*;

    fn boundary(district: &str, state: &str, origin: f64) -> DistrictBoundary {
        DistrictBoundary {
            district: district.to_string(),
            state: state.to_string(),
            polygon: MultiPolygon(vec![polygon![
                (x: origin, y: origin),
                (x: origin + 1.0, y: origin),
                (x: origin + 1.0, y: origin + 1.0),
                (x: origin, y: origin + 1.0),
            ]]),
        }
    }

    fn record(district: &str, state: &str) -> DistrictRecord {
        DistrictRecord {
            district: district.to_string(),
            state: state.to_string(),
            values: [(Metric::AepsMarketSize, 10.0)].into_iter().collect(),
        }
    }

    #[test]
    fn outer_join_keeps_both_sides() {
        let dataset = attach(
            vec![record("ALPHA", "BIHAR"), record("ORPHAN", "BIHAR")],
            vec![boundary("ALPHA", "BIHAR", 84.0), boundary("BARE", "ASSAM", 92.0)],
        );

        assert_eq!(dataset.districts.len(), 2);
        assert!(dataset.districts[0].record.is_some());
        assert!(dataset.districts[1].record.is_none());
        assert_eq!(dataset.unmapped.len(), 1);
        assert_eq!(dataset.unmapped[0].district, "ORPHAN");
    }

    #[test]
    fn state_scope_filters_both_mapped_and_unmapped() {
        let mut dataset = attach(
            vec![record("ALPHA", "BIHAR"), record("ORPHAN", "ASSAM")],
            vec![boundary("ALPHA", "BIHAR", 84.0), boundary("BARE", "ASSAM", 92.0)],
        );

        filter_scope(&mut dataset, &Scope::State("BIHAR".to_string()));

        assert_eq!(dataset.districts.len(), 1);
        assert_eq!(dataset.districts[0].boundary.district, "ALPHA");
        assert!(dataset.unmapped.is_empty());
    }

    #[test]
    fn national_scope_keeps_everything() {
        let mut dataset = attach(
            vec![record("ALPHA", "BIHAR")],
            vec![boundary("ALPHA", "BIHAR", 84.0), boundary("BARE", "ASSAM", 92.0)],
        );

        filter_scope(&mut dataset, &Scope::National);

        assert_eq!(dataset.districts.len(), 2);
    }

    #[test]
    fn record_state_wins_over_boundary_state() {
        let dataset = attach(
            vec![record("ALPHA", "BIHAR")],
            vec![boundary("ALPHA", "WEST BENGAL", 84.0)],
        );

        assert_eq!(dataset.districts[0].state(), "BIHAR");
    }

    #[test]
    fn center_is_mean_of_centroids() {
        let dataset = attach(
            Vec::new(),
            vec![boundary("ALPHA", "BIHAR", 84.0), boundary("BETA", "BIHAR", 86.0)],
        );

        let (lat, lon) = map_center(&dataset.districts);

        assert!((lat - 85.5).abs() < 1e-9);
        assert!((lon - 85.5).abs() < 1e-9);
    }

    #[test]
    fn center_falls_back_when_empty() {
        assert_eq!(map_center(&[]), DEFAULT_CENTER);
    }
}
