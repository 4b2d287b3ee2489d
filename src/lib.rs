pub mod converter;
pub mod decimate;
pub mod error;
pub mod geometry;
pub mod ingest;
pub mod options;
pub mod parser;
pub mod profile;
pub mod track;

use std::num::NonZeroUsize;

use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

use crate::decimate::PathPoint;
use crate::options::{IngestOptions, RenderOptions};

/// Ingest an uploaded GPX file, returning the storage record, title and overview path.
#[wasm_bindgen(js_name = ingestGpx)]
pub fn ingest_gpx(file_name: &str, bytes: &[u8], options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts: IngestOptions = parse_options(options)?;
    let upload = ingest::ingest(file_name, bytes, &opts)?;
    to_js(&upload)
}

/// Compute distance, elevation gain/loss, bounds and endpoints of a GPX track.
#[wasm_bindgen(js_name = analyzeGpx)]
pub fn analyze_gpx(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let summary = ingest::recompute_summary(gpx_string)?;
    to_js(&summary)
}

/// Elevation over cumulative distance, one entry per track point.
#[wasm_bindgen(js_name = elevationProfile)]
pub fn elevation_profile(gpx_string: &str) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let track = parser::extract(gpx_string)?;
    to_js(&profile::elevation_profile(track.points()))
}

/// Thin an array of `{lat, lng, orderIndex}` points for overview maps.
#[wasm_bindgen(js_name = decimatePath)]
pub fn decimate_path(points: JsValue, max_points: u32) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let points: Vec<PathPoint> = serde_wasm_bindgen::from_value(points)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let max_points = usize::try_from(max_points)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| JsValue::from_str("maxPoints must be a positive integer"))?;
    to_js(&decimate::decimate(&points, max_points))
}

/// Render a GPX track as a GeoJSON Feature string for detail maps.
#[wasm_bindgen(js_name = gpxToTrackGeoJson)]
pub fn gpx_to_track_geojson(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts: RenderOptions = parse_options(options)?;
    let doc = parser::extract_document(gpx_string)?;
    let summary = geometry::analyze(&doc.clone().into_track()?);
    let feature = converter::track_feature(&doc, &summary, &opts);
    serde_json::to_string(&feature).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options<T: DeserializeOwned + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
