use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use market_map_district_models::{ReportMonth, Scope};
use market_map_metrics::catalog::MetricDef;
use market_map_metrics::legend::Legend;

use crate::{DistrictView, RenderError};

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const TILE_URL: &str = "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
const TILE_ATTRIBUTION: &str =
    "&copy; OpenStreetMap contributors &copy; CARTO";

const TEMPLATE: &str = include_str!("map_template.html");

/// Renders the classified districts into a self-contained Leaflet HTML
/// document. Output is deterministic for a given input: no timestamps,
/// no random element ids.
///
/// # Errors
///
/// * `RenderError::Json` if the feature collection fails to serialize
pub fn render_map(
    views: &[DistrictView],
    center: (f64, f64),
    scope: &Scope,
    month: ReportMonth,
    reference: &MetricDef,
    achievement: &MetricDef,
    legend: &Legend,
) -> Result<String, RenderError> {
    let title = format!(
        "{} (Reference) × {} (Achievement) — {} — {}",
        reference.name,
        achievement.name,
        scope.label(),
        month.label()
    );

    let collection = feature_collection(views, reference, achievement);
    let geojson = serde_json::to_string(&collection)?;

    Ok(TEMPLATE
        .replace("__TITLE__", &escape_html(&title))
        .replace("__LEAFLET_CSS__", LEAFLET_CSS)
        .replace("__LEAFLET_JS__", LEAFLET_JS)
        .replace("__TILE_URL__", TILE_URL)
        .replace("__TILE_ATTRIBUTION__", TILE_ATTRIBUTION)
        .replace("__CENTER_LAT__", &format!("{:.6}", center.0))
        .replace("__CENTER_LON__", &format!("{:.6}", center.1))
        .replace("__LEGEND__", &legend_html(legend))
        .replace("__GEOJSON__", &geojson))
}

fn feature_collection(
    views: &[DistrictView],
    reference: &MetricDef,
    achievement: &MetricDef,
) -> FeatureCollection {
    let features = views
        .iter()
        .filter_map(|view| {
            let polygon = view.polygon.as_ref()?;

            let mut properties = JsonObject::new();
            properties.insert("district".into(), JsonValue::from(view.district.clone()));
            properties.insert("state".into(), JsonValue::from(view.state.clone()));
            properties.insert(
                "reference_label".into(),
                JsonValue::from(reference.name.clone()),
            );
            properties.insert(
                "reference_value".into(),
                JsonValue::from(format_value(view.reference_value)),
            );
            properties.insert(
                "achievement_label".into(),
                JsonValue::from(achievement.name.clone()),
            );
            properties.insert(
                "achievement_value".into(),
                JsonValue::from(format_value(view.achievement_value)),
            );
            properties.insert(
                "class".into(),
                JsonValue::from(view.classification.label.clone()),
            );
            properties.insert(
                "fill".into(),
                JsonValue::from(view.classification.color.clone()),
            );

            Some(Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(polygon))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            })
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn legend_html(legend: &Legend) -> String {
    let mut out = String::new();

    axis_section(&mut out, "Reference Metric", &legend.reference.metric_name, [
        ("High", &legend.reference.high),
        ("Medium", &legend.reference.med),
        ("Low", &legend.reference.low),
    ]);
    axis_section(
        &mut out,
        "Achievement Metric",
        &legend.achievement.metric_name,
        [
            ("High", &legend.achievement.high),
            ("Medium", &legend.achievement.med),
            ("Low", &legend.achievement.low),
        ],
    );

    out.push_str("<strong>Classification Legend</strong>\n");
    for entry in &legend.entries {
        out.push_str(&format!(
            "<div class=\"swatch-row\">\
             <span class=\"swatch\" style=\"background:{}\"></span>{}</div>\n",
            entry.color,
            escape_html(&entry.label)
        ));
    }

    out
}

fn axis_section(out: &mut String, role: &str, metric_name: &str, rows: [(&str, &str); 3]) {
    out.push_str(&format!(
        "<strong>{role}: {}</strong>\n<ul>\n",
        escape_html(metric_name)
    ));
    for (level, description) in rows {
        out.push_str(&format!(
            "<li><b>{level}</b>: {}</li>\n",
            escape_html(description)
        ));
    }
    out.push_str("</ul>\n");
}

/// Tooltip value: two decimals, or `NA` for missing.
fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "NA".to_string(), |value| format!("{value:.2}"))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
