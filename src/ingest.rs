use std::borrow::Cow;
use std::path::Path;

use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::decimate::{DecimatedPath, decimate, path_points};
use crate::error::{IngestError, ParseError};
use crate::geometry::{GeometrySummary, analyze};
use crate::options::IngestOptions;
use crate::parser::extract;
use crate::track::{ParsedTrack, TrackPoint};

/// A track point as archived by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTrackPoint {
    /// 0-based position in the flattened track.
    pub order_index: usize,
    pub lat: f64,
    pub lng: f64,
    pub elevation: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Flat record handed to the storage layer: metadata, summary columns and every point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub start_lat: f64,
    pub start_lng: f64,
    pub end_lat: f64,
    pub end_lng: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub track_points: Vec<StoredTrackPoint>,
}

impl TrailRecord {
    pub fn new(track: &ParsedTrack, summary: &GeometrySummary) -> Self {
        Self {
            name: track.name().map(str::to_string),
            description: track.description().map(str::to_string),
            distance_km: summary.distance_km,
            elevation_gain_m: summary.elevation_gain_m,
            elevation_loss_m: summary.elevation_loss_m,
            start_lat: summary.start.lat,
            start_lng: summary.start.lng,
            end_lat: summary.end.lat,
            end_lng: summary.end.lng,
            min_lat: summary.bounds.min_lat,
            max_lat: summary.bounds.max_lat,
            min_lng: summary.bounds.min_lng,
            max_lng: summary.bounds.max_lng,
            track_points: track
                .points()
                .iter()
                .enumerate()
                .map(|(order_index, pt)| stored_point(order_index, pt))
                .collect(),
        }
    }
}

fn stored_point(order_index: usize, pt: &TrackPoint) -> StoredTrackPoint {
    StoredTrackPoint {
        order_index,
        lat: pt.latitude,
        lng: pt.longitude,
        elevation: pt.elevation,
        timestamp: pt.timestamp,
    }
}

/// Everything produced from one accepted upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailUpload {
    /// Parsed track name, falling back to the file name without its extension.
    pub title: String,
    pub record: TrailRecord,
    /// Overview path capped at `max_display_points`.
    pub overview: DecimatedPath,
}

/// Reject uploads that are too large or have the wrong file type.
pub fn validate_upload(
    file_name: &str,
    size_bytes: u64,
    options: &IngestOptions,
) -> Result<(), IngestError> {
    if size_bytes > options.max_file_size_bytes {
        warn!(file_name, size_bytes, max = options.max_file_size_bytes, "upload rejected: too large");
        return Err(IngestError::FileTooLarge {
            size_bytes,
            max_bytes: options.max_file_size_bytes,
        });
    }
    if !options.accepts_file_name(file_name) {
        warn!(file_name, "upload rejected: unsupported extension");
        return Err(IngestError::UnsupportedExtension {
            file_name: file_name.to_string(),
        });
    }
    Ok(())
}

/// Run a raw upload through the whole pipeline.
///
/// Any failure rejects the upload as a whole; nothing partial is returned.
#[instrument(skip(bytes, options), fields(size_bytes = bytes.len()))]
pub fn ingest(
    file_name: &str,
    bytes: &[u8],
    options: &IngestOptions,
) -> Result<TrailUpload, IngestError> {
    validate_upload(file_name, bytes.len() as u64, options)?;

    let text = decode_upload(bytes)?;
    let track = extract(&text)?;
    let summary = analyze(&track);
    let overview = decimate(&path_points(track.points()), options.max_display_points);
    let title = track
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| file_title(file_name));

    info!(
        title = %title,
        points = track.points().len(),
        distance_km = summary.distance_km,
        "ingested GPX upload"
    );

    Ok(TrailUpload {
        title,
        record: TrailRecord::new(&track, &summary),
        overview,
    })
}

/// Re-derive summary statistics from stored GPX text, e.g. to backfill
/// records created before the summary columns existed.
pub fn recompute_summary(gpx: &str) -> Result<GeometrySummary, ParseError> {
    extract(gpx).map(|track| analyze(&track))
}

/// Decode upload bytes to text.
///
/// A byte order mark wins, then the encoding named in the XML declaration,
/// then UTF-8. Undecodable bytes become U+FFFD rather than failing the upload.
fn decode_upload(bytes: &[u8]) -> Result<Cow<'_, str>, IngestError> {
    let encoding = match declared_encoding(bytes) {
        Some(label) => Encoding::for_label(&label)
            .map(Encoding::output_encoding)
            .ok_or_else(|| IngestError::InvalidEncoding {
                label: String::from_utf8_lossy(&label).into_owned(),
            })?,
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        warn!(encoding = used.name(), "replaced undecodable bytes in upload");
    }
    Ok(text)
}

fn declared_encoding(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut reader = Reader::from_reader(bytes);
    match reader.read_event() {
        Ok(Event::Decl(decl)) => decl.encoding()?.ok().map(Cow::into_owned),
        _ => None,
    }
}

fn file_title(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
