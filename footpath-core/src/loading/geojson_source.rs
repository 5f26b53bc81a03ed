//! GeoJSON footpath source

use std::path::Path;

use geojson::Feature;
use log::{info, warn};
use serde_json::Value as JsonValue;

use super::builder::PathFeature;
use crate::{Error, LatLng};

/// Reads a GeoJSON file of footpath lines.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not JSON at all.
/// Individual malformed features are skipped.
pub fn load_footpaths_geojson(path: &Path) -> Result<Vec<PathFeature>, Error> {
    info!("Loading footpaths from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_footpaths_geojson(&text)
}

/// Parses footpath lines from GeoJSON text.
///
/// Accepts a `FeatureCollection` or a single `Feature`. `LineString`
/// geometries become one path each, `MultiLineString` geometries one path
/// per member line. Wire coordinates are `(lng, lat)` and are reordered.
///
/// # Errors
///
/// Returns [`Error::GeoJsonError`] if `text` is not valid JSON.
pub fn parse_footpaths_geojson(text: &str) -> Result<Vec<PathFeature>, Error> {
    let document: JsonValue =
        serde_json::from_str(text).map_err(|e| Error::GeoJsonError(e.to_string()))?;

    let raw_features = match document.get("type").and_then(JsonValue::as_str) {
        Some("FeatureCollection") => match document.get("features") {
            Some(JsonValue::Array(features)) => features.clone(),
            _ => {
                warn!("FeatureCollection without a features array");
                Vec::new()
            }
        },
        Some("Feature") => vec![document],
        other => {
            warn!("Unsupported GeoJSON document type {other:?}, no footpaths loaded");
            Vec::new()
        }
    };

    let mut paths = Vec::new();
    let mut skipped = 0;

    for (index, raw) in raw_features.into_iter().enumerate() {
        let feature = match Feature::from_json_value(raw) {
            Ok(feature) => feature,
            Err(e) => {
                warn!("Skipping malformed feature #{index}: {e}");
                skipped += 1;
                continue;
            }
        };

        let label = feature_label(&feature, index);
        let lines = feature_lines(&feature);
        if lines.is_empty() {
            warn!("Skipping feature '{label}': no line geometry");
            skipped += 1;
            continue;
        }

        let line_count = lines.len();
        for (part, coordinates) in lines.into_iter().enumerate() {
            let label = if line_count > 1 {
                format!("{label}/{part}")
            } else {
                label.clone()
            };
            paths.push(PathFeature { label, coordinates });
        }
    }

    info!("Parsed {} footpath lines ({skipped} features skipped)", paths.len());
    Ok(paths)
}

fn feature_label(feature: &Feature, index: usize) -> String {
    ["id", "name"]
        .into_iter()
        .find_map(|key| feature.property(key).filter(|value| !value.is_null()))
        .map(|value| match value {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| format!("seg{}", index + 1))
}

fn feature_lines(feature: &Feature) -> Vec<Vec<LatLng>> {
    let Some(geometry) = feature.geometry.clone() else {
        return Vec::new();
    };

    match geo::Geometry::<f64>::try_from(geometry) {
        Ok(geo::Geometry::LineString(line)) => {
            vec![line.coords().map(|c| LatLng::from(*c)).collect()]
        }
        Ok(geo::Geometry::MultiLineString(lines)) => lines
            .iter()
            .map(|line| line.coords().map(|c| LatLng::from(*c)).collect())
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_line_strings_and_reorders_coordinates() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": {"name": "Main avenue"},
                    "geometry": {"type": "LineString", "coordinates": [[-1.73, 52.73], [-1.729, 52.731]]}
                }
            ]
        }"#;

        let paths = parse_footpaths_geojson(text).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].label, "Main avenue");
        assert_eq!(
            paths[0].coordinates,
            vec![LatLng::new(52.73, -1.73), LatLng::new(52.731, -1.729)]
        );
    }

    #[test]
    fn splits_multi_line_strings() {
        let text = r#"{
            "type": "Feature",
            "properties": {"id": 7},
            "geometry": {"type": "MultiLineString", "coordinates": [
                [[-1.73, 52.73], [-1.729, 52.73]],
                [[-1.72, 52.73], [-1.719, 52.73]]
            ]}
        }"#;

        let paths = parse_footpaths_geojson(text).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].label, "7/0");
        assert_eq!(paths[1].label, "7/1");
    }

    #[test]
    fn skips_malformed_and_non_line_features() {
        let text = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "LineString", "coordinates": [["a", "b"], [1, 2]]}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [-1.73, 52.73]}},
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": null, "geometry": {"type": "LineString", "coordinates": [[-1.73, 52.73], [-1.729, 52.73]]}}
            ]
        }"#;

        let paths = parse_footpaths_geojson(text).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].label, "seg4");
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_footpaths_geojson("not json"),
            Err(Error::GeoJsonError(_))
        ));
    }

    #[test]
    fn unknown_document_type_yields_nothing() {
        let paths = parse_footpaths_geojson(r#"{"type": "Topology"}"#).unwrap();
        assert!(paths.is_empty());
    }
}
