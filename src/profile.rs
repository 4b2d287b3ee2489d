use serde::Serialize;

use crate::geometry::{leg_distances, round_to};
use crate::track::TrackPoint;

/// One sample of an elevation-over-distance chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfilePoint {
    /// Cumulative km from the start, 2 decimals.
    pub distance: f64,
    /// Whole meters; missing elevation reads as 0.
    pub elevation: f64,
}

/// One entry per input point, the first at distance 0.
///
/// Distances accumulate leg by leg in the same order as
/// [`analyze`](crate::geometry::analyze), so the last entry equals the
/// summary's `distance_km`.
pub fn elevation_profile(points: &[TrackPoint]) -> Vec<ProfilePoint> {
    let mut profile = Vec::with_capacity(points.len());
    let mut cumulative = 0.0;
    let mut legs = std::iter::once(0.0).chain(leg_distances(points));

    for pt in points {
        cumulative += legs.next().unwrap_or(0.0);
        profile.push(ProfilePoint {
            distance: round_to(cumulative, 2),
            elevation: round_to(pt.elevation_or_zero(), 0),
        });
    }

    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::analyze;
    use crate::track::ParsedTrack;

    #[test]
    fn test_known_profile() {
        let pts = vec![
            TrackPoint::new(0.0, 0.0).with_elevation(100.0),
            TrackPoint::new(0.0, 0.01).with_elevation(150.4),
            TrackPoint::new(0.0, 0.02),
        ];
        let profile = elevation_profile(&pts);
        assert_eq!(
            profile,
            vec![
                ProfilePoint {
                    distance: 0.0,
                    elevation: 100.0
                },
                ProfilePoint {
                    distance: 1.11,
                    elevation: 150.0
                },
                ProfilePoint {
                    distance: 2.22,
                    elevation: 0.0
                },
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(elevation_profile(&[]).is_empty());
    }

    #[test]
    fn test_final_distance_matches_summary() {
        let pts: Vec<TrackPoint> = (0..733)
            .map(|i| {
                let f = i as f64;
                TrackPoint::new(-33.9 + f * 3e-4, 18.4 + (f * 0.05).sin() * 2e-3)
                    .with_elevation(300.0 + f * 0.7)
            })
            .collect();
        let profile = elevation_profile(&pts);
        let summary = analyze(&ParsedTrack::new(None, None, pts).unwrap());

        assert_eq!(profile.len(), 733);
        assert_eq!(profile[0].distance, 0.0);
        assert_eq!(profile.last().unwrap().distance, summary.distance_km);
        assert!(profile.windows(2).all(|w| w[0].distance <= w[1].distance));
    }
}
