use geojson::{Feature, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::decimate::DecimatedPath;
use crate::geometry::GeometrySummary;
use crate::options::RenderOptions;
use crate::parser::TrackDocument;
use crate::track::{TrackGeometry, TrackPoint};

/// Full-resolution track for a single-trail detail map.
///
/// One segment becomes a LineString, several become a MultiLineString, and a
/// lone point becomes a Point. Segments too short to draw are left out of the lines.
pub fn track_feature(doc: &TrackDocument, summary: &GeometrySummary, opts: &RenderOptions) -> Feature {
    let (value, times) = match &doc.geometry {
        TrackGeometry::LineString(points) if points.len() == 1 => (
            Value::Point(point_coords(&points[0], opts.include_elevation)),
            coordinate_times(points),
        ),
        TrackGeometry::LineString(points) => (
            Value::LineString(line_coords(points, opts.include_elevation)),
            coordinate_times(points),
        ),
        TrackGeometry::MultiLineString(lines) => {
            // a GeoJSON line needs at least two positions
            let drawable: Vec<&Vec<TrackPoint>> =
                lines.iter().filter(|seg| seg.len() >= 2).collect();
            match drawable.as_slice() {
                [] => {
                    let points = lines.concat();
                    (
                        Value::MultiPoint(line_coords(&points, opts.include_elevation)),
                        coordinate_times(&points),
                    )
                }
                [line] => (
                    Value::LineString(line_coords(line, opts.include_elevation)),
                    coordinate_times(line),
                ),
                _ => {
                    let coords = drawable
                        .iter()
                        .map(|seg| line_coords(seg, opts.include_elevation))
                        .collect();
                    let times = drawable.iter().map(|seg| coordinate_times(seg)).collect();
                    (Value::MultiLineString(coords), JsonValue::Array(times))
                }
            }
        }
    };

    let mut props = Map::new();
    insert_optional(&mut props, "name", &doc.name);
    insert_optional(&mut props, "description", &doc.description);
    insert_summary(&mut props, summary);

    if opts.include_time && has_any_time(&doc.geometry) {
        let mut coord_props = Map::new();
        coord_props.insert("times".to_string(), times);
        props.insert(
            "coordinateProperties".to_string(),
            JsonValue::Object(coord_props),
        );
    }

    Feature {
        bbox: Some(summary.bounds.to_bbox()),
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Decimated path for overview maps. Coordinates are `[lng, lat]`.
pub fn overview_feature(path: &DecimatedPath) -> Feature {
    let points = path.points();
    let geometry = match points {
        [] => None,
        [only] => Some(Geometry::new(Value::Point(vec![only.lng, only.lat]))),
        _ => Some(Geometry::new(Value::LineString(
            points.iter().map(|pt| vec![pt.lng, pt.lat]).collect(),
        ))),
    };

    let mut props = Map::new();
    props.insert(
        "orderIndices".to_string(),
        JsonValue::Array(points.iter().map(|pt| JsonValue::from(pt.order_index)).collect()),
    );

    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

/// Build [lon, lat] or [lon, lat, ele] coordinate array.
fn point_coords(pt: &TrackPoint, include_elevation: bool) -> Vec<f64> {
    match (include_elevation, pt.elevation) {
        (true, Some(ele)) => vec![pt.longitude, pt.latitude, ele],
        _ => vec![pt.longitude, pt.latitude],
    }
}

fn line_coords(points: &[TrackPoint], include_elevation: bool) -> Vec<Vec<f64>> {
    points
        .iter()
        .map(|pt| point_coords(pt, include_elevation))
        .collect()
}

fn coordinate_times(points: &[TrackPoint]) -> JsonValue {
    JsonValue::Array(
        points
            .iter()
            .map(|pt| match &pt.timestamp {
                Some(t) => JsonValue::String(t.to_rfc3339()),
                None => JsonValue::Null,
            })
            .collect(),
    )
}

fn has_any_time(geometry: &TrackGeometry) -> bool {
    match geometry {
        TrackGeometry::LineString(points) => points.iter().any(|pt| pt.timestamp.is_some()),
        TrackGeometry::MultiLineString(lines) => lines
            .iter()
            .flatten()
            .any(|pt| pt.timestamp.is_some()),
    }
}

fn insert_summary(props: &mut Map<String, JsonValue>, summary: &GeometrySummary) {
    props.insert("distanceKm".to_string(), JsonValue::from(summary.distance_km));
    props.insert(
        "elevationGainM".to_string(),
        JsonValue::from(summary.elevation_gain_m),
    );
    props.insert(
        "elevationLossM".to_string(),
        JsonValue::from(summary.elevation_loss_m),
    );
}

fn insert_optional(props: &mut Map<String, JsonValue>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        props.insert(key.to_string(), JsonValue::String(v.clone()));
    }
}
