use std::path::Path;

use geo::MultiPolygon;
use geojson::{GeoJson, JsonObject, JsonValue};
use market_map_district_models::normalize_name;

use crate::GeoError;

const DISTRICT_KEYS: &[&str] = &["District", "DISTRICT", "district"];
const STATE_KEYS: &[&str] = &["STATE", "State", "state"];

/// One district polygon from the boundary file, with normalized names.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictBoundary {
    pub district: String,
    pub state: String,
    pub polygon: MultiPolygon<f64>,
}

/// Loads district boundaries from a GeoJSON `FeatureCollection` file.
///
/// Features without a district name or with a non-areal geometry are
/// logged and skipped rather than failing the whole load.
///
/// # Errors
///
/// * `GeoError::Io` if the file cannot be read
/// * `GeoError::Parse` if it is not valid GeoJSON
/// * `GeoError::NotFeatureCollection` if the root is not a collection
/// * `GeoError::Empty` if no feature yields a district polygon
pub fn load_boundaries(path: &Path) -> Result<Vec<DistrictBoundary>, GeoError> {
    let contents = std::fs::read_to_string(path).map_err(|source| GeoError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_boundaries(&contents, path)
}

fn parse_boundaries(contents: &str, path: &Path) -> Result<Vec<DistrictBoundary>, GeoError> {
    let geojson: GeoJson = contents.parse().map_err(|source| GeoError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(GeoError::NotFeatureCollection {
            path: path.to_path_buf(),
        });
    };

    let mut boundaries = Vec::with_capacity(collection.features.len());

    for feature in collection.features {
        let Some(district) = string_property(feature.properties.as_ref(), DISTRICT_KEYS) else {
            log::warn!("skipping boundary feature without a district name");
            continue;
        };
        let district = normalize_name(&district);
        if district.is_empty() {
            log::warn!("skipping boundary feature with a blank district name");
            continue;
        }

        let state = string_property(feature.properties.as_ref(), STATE_KEYS)
            .map(|state| normalize_name(&state))
            .unwrap_or_default();

        let Some(polygon) = feature.geometry.and_then(to_multipolygon) else {
            log::warn!("skipping district {district}: geometry is not areal");
            continue;
        };

        boundaries.push(DistrictBoundary {
            district,
            state,
            polygon,
        });
    }

    if boundaries.is_empty() {
        return Err(GeoError::Empty {
            path: path.to_path_buf(),
        });
    }

    log::info!(
        "loaded {} district boundaries from {}",
        boundaries.len(),
        path.display()
    );

    Ok(boundaries)
}

fn string_property(properties: Option<&JsonObject>, keys: &[&str]) -> Option<String> {
    let properties = properties?;

    keys.iter()
        .find_map(|key| properties.get(*key))
        .and_then(JsonValue::as_str)
        .map(str::to_string)
}

/// Converts a GeoJSON geometry into a [`MultiPolygon`], wrapping a bare
/// `Polygon` in a single-element multi.
fn to_multipolygon(geometry: geojson::Geometry) -> Option<MultiPolygon<f64>> {
    let geometry: geo::Geometry<f64> = geometry.try_into().ok()?;

    match geometry {
        geo::Geometry::MultiPolygon(multi) => Some(multi),
        geo::Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(origin: f64) -> String {
        format!(
            "[[[{o}, {o}], [{p}, {o}], [{p}, {p}], [{o}, {p}], [{o}, {o}]]]",
            o = origin,
            p = origin + 1.0
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            "{{\"type\": \"FeatureCollection\", \"features\": [{}]}}",
            features.join(", ")
        )
    }

    fn feature(district: &str, state: &str, origin: f64) -> String {
        format!(
            "{{\"type\": \"Feature\", \
              \"properties\": {{\"District\": \"{district}\", \"STATE\": \"{state}\"}}, \
              \"geometry\": {{\"type\": \"Polygon\", \"coordinates\": {}}}}}",
            square(origin)
        )
    }

    #[test]
    fn parses_polygons_with_normalized_names() {
        let raw = collection(&[
            feature(" Alpha ", "bihar", 80.0),
            feature("beta", "BIHAR", 82.0),
        ]);

        let boundaries = parse_boundaries(&raw, Path::new("test.geojson")).unwrap();

        assert_eq!(boundaries.len(), 2);
        assert_eq!(boundaries[0].district, "ALPHA");
        assert_eq!(boundaries[0].state, "BIHAR");
        assert_eq!(boundaries[0].polygon.0.len(), 1);
        assert_eq!(boundaries[1].district, "BETA");
    }

    #[test]
    fn skips_features_without_district_or_areal_geometry() {
        let point = "{\"type\": \"Feature\", \
                     \"properties\": {\"District\": \"Gamma\"}, \
                     \"geometry\": {\"type\": \"Point\", \"coordinates\": [80.0, 20.0]}}"
            .to_string();
        let nameless = format!(
            "{{\"type\": \"Feature\", \"properties\": {{}}, \
              \"geometry\": {{\"type\": \"Polygon\", \"coordinates\": {}}}}}",
            square(80.0)
        );
        let raw = collection(&[feature("Alpha", "BIHAR", 80.0), point, nameless]);

        let boundaries = parse_boundaries(&raw, Path::new("test.geojson")).unwrap();

        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].district, "ALPHA");
    }

    #[test]
    fn rejects_collection_with_no_usable_features() {
        let raw = collection(&[]);

        let err = parse_boundaries(&raw, Path::new("test.geojson")).unwrap_err();

        assert!(matches!(err, GeoError::Empty { .. }));
    }

    #[test]
    fn rejects_bare_geometry_root() {
        let raw = format!(
            "{{\"type\": \"Polygon\", \"coordinates\": {}}}",
            square(80.0)
        );

        let err = parse_boundaries(&raw, Path::new("test.geojson")).unwrap_err();

        assert!(matches!(err, GeoError::NotFeatureCollection { .. }));
    }
}
