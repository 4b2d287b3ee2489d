use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::track::TrackPoint;

/// Map-ready point; elevation and time are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
    /// Position in the full, flattened track.
    pub order_index: usize,
}

/// Reduced-density path for display. Never a source for distance or elevation math.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecimatedPath(Vec<PathPoint>);

impl DecimatedPath {
    pub fn points(&self) -> &[PathPoint] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<PathPoint> {
        self.0
    }
}

/// Tag every point with its index in the flattened track.
pub fn path_points(points: &[TrackPoint]) -> Vec<PathPoint> {
    points
        .iter()
        .enumerate()
        .map(|(order_index, pt)| PathPoint {
            lat: pt.latitude,
            lng: pt.longitude,
            order_index,
        })
        .collect()
}

/// Thin `points` to at most roughly `max_points` entries.
///
/// Keeps every `ceil(len / max_points)`-th point plus the final point, so the
/// output may hold one more than `max_points`. Input at or under the cap is
/// returned unchanged.
pub fn decimate(points: &[PathPoint], max_points: NonZeroUsize) -> DecimatedPath {
    let max_points = max_points.get();
    if points.len() <= max_points {
        return DecimatedPath(points.to_vec());
    }

    let step = points.len().div_ceil(max_points);
    let last = points.len() - 1;
    let kept: Vec<PathPoint> = points
        .iter()
        .enumerate()
        .filter(|&(i, _)| i % step == 0 || i == last)
        .map(|(_, pt)| *pt)
        .collect();

    debug!(
        original = points.len(),
        kept = kept.len(),
        step,
        "decimated track path"
    );

    DecimatedPath(kept)
}
