use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ParseError;

/// A single recorded position. Index within its track is the only identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Meters above sea level.
    pub elevation: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Elevation used for delta math; a missing sample counts as 0 m.
    pub(crate) fn elevation_or_zero(&self) -> f64 {
        self.elevation.unwrap_or(0.0)
    }
}

/// Track geometry as it appears in the document, before flattening.
///
/// Empty segments never make it into either variant.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackGeometry {
    /// Exactly one non-empty segment.
    LineString(Vec<TrackPoint>),
    /// Two or more non-empty segments, in document order.
    MultiLineString(Vec<Vec<TrackPoint>>),
}

impl TrackGeometry {
    /// Build from the non-empty segments found in a document.
    /// Returns `None` when there is nothing to draw.
    pub fn from_segments(mut segments: Vec<Vec<TrackPoint>>) -> Option<Self> {
        segments.retain(|seg| !seg.is_empty());
        match segments.len() {
            0 => None,
            1 => segments.pop().map(Self::LineString),
            _ => Some(Self::MultiLineString(segments)),
        }
    }

    pub fn segment_count(&self) -> usize {
        match self {
            Self::LineString(_) => 1,
            Self::MultiLineString(lines) => lines.len(),
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            Self::LineString(points) => points.len(),
            Self::MultiLineString(lines) => lines.iter().map(Vec::len).sum(),
        }
    }

    /// Concatenate every segment into one continuous path.
    ///
    /// Segment boundaries are dropped, so the jump between the end of one
    /// segment and the start of the next counts as ordinary travel.
    pub fn flatten(self) -> Vec<TrackPoint> {
        match self {
            Self::LineString(points) => points,
            Self::MultiLineString(lines) => lines.into_iter().flatten().collect(),
        }
    }
}

/// A flattened track with its optional metadata. Always holds at least one point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTrack {
    name: Option<String>,
    description: Option<String>,
    points: Vec<TrackPoint>,
}

impl ParsedTrack {
    pub fn new(
        name: Option<String>,
        description: Option<String>,
        points: Vec<TrackPoint>,
    ) -> Result<Self, ParseError> {
        if points.is_empty() {
            return Err(ParseError::EmptyTrack(
                "track has no points".to_string(),
            ));
        }
        Ok(Self {
            name,
            description,
            points,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Never empty.
    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn first(&self) -> &TrackPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }
}
