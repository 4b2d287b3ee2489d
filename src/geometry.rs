use serde::Serialize;

use crate::track::{ParsedTrack, TrackPoint};

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl From<&TrackPoint> for Coordinate {
    fn from(pt: &TrackPoint) -> Self {
        Self {
            lat: pt.latitude,
            lng: pt.longitude,
        }
    }
}

/// Tight axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    fn around(c: Coordinate) -> Self {
        Self {
            min_lat: c.lat,
            max_lat: c.lat,
            min_lng: c.lng,
            max_lng: c.lng,
        }
    }

    fn extend(self, c: Coordinate) -> Self {
        Self {
            min_lat: self.min_lat.min(c.lat),
            max_lat: self.max_lat.max(c.lat),
            min_lng: self.min_lng.min(c.lng),
            max_lng: self.max_lng.max(c.lng),
        }
    }

    /// GeoJSON bbox order: `[west, south, east, north]`.
    pub fn to_bbox(&self) -> Vec<f64> {
        vec![self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }
}

/// Summary statistics for a whole track.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometrySummary {
    /// Horizontal great-circle length, 2 decimals.
    pub distance_km: f64,
    /// Whole meters.
    pub elevation_gain_m: f64,
    /// Whole meters.
    pub elevation_loss_m: f64,
    pub bounds: Bounds,
    pub start: Coordinate,
    pub end: Coordinate,
}

/// Great-circle distance between two coordinates, in kilometers.
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Length of each consecutive leg of the path, in order.
pub(crate) fn leg_distances(points: &[TrackPoint]) -> impl Iterator<Item = f64> + '_ {
    points
        .windows(2)
        .map(|pair| haversine_km(Coordinate::from(&pair[0]), Coordinate::from(&pair[1])))
}

/// Round half up (towards positive infinity) to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor
}

fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Total gain and loss, missing elevations counting as 0 m. No smoothing.
fn elevation_totals(points: &[TrackPoint]) -> (f64, f64) {
    points
        .windows(2)
        .fold((0.0, 0.0), |(gain, loss), pair| {
            let delta = pair[1].elevation_or_zero() - pair[0].elevation_or_zero();
            if delta > 0.0 {
                (gain + delta, loss)
            } else {
                (gain, loss - delta)
            }
        })
}

/// Derive the geometry summary of a track.
///
/// Every value is a pure function of the point sequence, so repeated calls
/// on the same track give identical results.
pub fn analyze(track: &ParsedTrack) -> GeometrySummary {
    let points = track.points();

    let distance_km = leg_distances(points).fold(0.0, |acc, leg| acc + leg);
    let (gain, loss) = elevation_totals(points);

    let start = Coordinate::from(track.first());
    let bounds = points
        .iter()
        .skip(1)
        .map(Coordinate::from)
        .fold(Bounds::around(start), Bounds::extend);

    GeometrySummary {
        distance_km: round_to(distance_km, 2),
        elevation_gain_m: round_to(gain, 0),
        elevation_loss_m: round_to(loss, 0),
        bounds,
        start,
        end: Coordinate::from(track.last()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(points: Vec<TrackPoint>) -> ParsedTrack {
        ParsedTrack::new(None, None, points).unwrap()
    }

    fn at(lat: f64, lng: f64) -> Coordinate {
        Coordinate { lat, lng }
    }

    #[test]
    fn test_haversine_one_degree_of_longitude_at_equator() {
        let d = haversine_km(at(0.0, 0.0), at(0.0, 1.0));
        assert!((d - 111.19508).abs() < 1e-4);
    }

    #[test]
    fn test_haversine_is_symmetric_and_zero_on_same_point() {
        let a = at(47.3769, 8.5417);
        let b = at(46.948, 7.4474);
        assert_eq!(haversine_km(a, a), 0.0);
        assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-12);
    }

    #[test]
    fn test_known_geometry() {
        let t = track(vec![
            TrackPoint::new(0.0, 0.0).with_elevation(100.0),
            TrackPoint::new(0.0, 0.01).with_elevation(150.0),
            TrackPoint::new(0.0, 0.02).with_elevation(120.0),
        ]);
        let summary = analyze(&t);

        let leg = haversine_km(at(0.0, 0.0), at(0.0, 0.01));
        assert_eq!(summary.distance_km, round_to(2.0 * leg, 2));
        assert_eq!(summary.distance_km, 2.22);
        assert_eq!(summary.elevation_gain_m, 50.0);
        assert_eq!(summary.elevation_loss_m, 30.0);
        assert_eq!(
            summary.bounds,
            Bounds {
                min_lat: 0.0,
                max_lat: 0.0,
                min_lng: 0.0,
                max_lng: 0.02,
            }
        );
        assert_eq!(summary.start, at(0.0, 0.0));
        assert_eq!(summary.end, at(0.0, 0.02));
    }

    #[test]
    fn test_single_point_track() {
        let t = track(vec![TrackPoint::new(45.5, -122.5).with_elevation(80.0)]);
        let summary = analyze(&t);
        assert_eq!(summary.distance_km, 0.0);
        assert!(summary.distance_km.is_sign_positive());
        assert_eq!(summary.elevation_gain_m, 0.0);
        assert_eq!(summary.elevation_loss_m, 0.0);
        assert_eq!(summary.bounds.min_lat, summary.bounds.max_lat);
        assert_eq!(summary.bounds.min_lng, summary.bounds.max_lng);
        assert_eq!(summary.start, summary.end);
    }

    #[test]
    fn test_missing_elevation_counts_as_zero() {
        let t = track(vec![
            TrackPoint::new(0.0, 0.0).with_elevation(100.0),
            TrackPoint::new(0.0, 0.001),
            TrackPoint::new(0.0, 0.002).with_elevation(120.0),
            TrackPoint::new(0.0, 0.003),
        ]);
        let summary = analyze(&t);
        // -100, +120, -120
        assert_eq!(summary.elevation_gain_m, 120.0);
        assert_eq!(summary.elevation_loss_m, 220.0);
    }

    #[test]
    fn test_raw_noise_is_not_smoothed() {
        let elevations = [10.0, 10.4, 10.0, 10.4, 10.0, 10.4];
        let t = track(
            elevations
                .iter()
                .map(|&e| TrackPoint::new(0.0, 0.0).with_elevation(e))
                .collect(),
        );
        let summary = analyze(&t);
        // 3 x 0.4 up, 2 x 0.4 down, rounded once at the end
        assert_eq!(summary.elevation_gain_m, 1.0);
        assert_eq!(summary.elevation_loss_m, 1.0);
    }

    #[test]
    fn test_bounds_are_not_endpoints() {
        let t = track(vec![
            TrackPoint::new(10.0, 10.0),
            TrackPoint::new(12.0, 8.0),
            TrackPoint::new(9.0, 11.0),
            TrackPoint::new(10.5, 10.5),
        ]);
        let summary = analyze(&t);
        assert_eq!(summary.bounds.min_lat, 9.0);
        assert_eq!(summary.bounds.max_lat, 12.0);
        assert_eq!(summary.bounds.min_lng, 8.0);
        assert_eq!(summary.bounds.max_lng, 11.0);
        assert_eq!(summary.start, at(10.0, 10.0));
        assert_eq!(summary.end, at(10.5, 10.5));
        assert_eq!(summary.bounds.to_bbox(), vec![8.0, 9.0, 11.0, 12.0]);
    }

    #[test]
    fn test_elevation_does_not_affect_distance() {
        let flat = track(vec![TrackPoint::new(1.0, 1.0), TrackPoint::new(1.1, 1.1)]);
        let steep = track(vec![
            TrackPoint::new(1.0, 1.0).with_elevation(0.0),
            TrackPoint::new(1.1, 1.1).with_elevation(3000.0),
        ]);
        assert_eq!(analyze(&flat).distance_km, analyze(&steep).distance_km);
    }

    #[test]
    fn test_analyze_is_deterministic() {
        let t = track(
            (0..500)
                .map(|i| {
                    let f = i as f64;
                    TrackPoint::new(46.0 + f * 1e-4, 7.0 + (f * 0.37).sin() * 1e-3)
                        .with_elevation(1000.0 + (f * 0.11).cos() * 25.0)
                })
                .collect(),
        );
        let a = analyze(&t);
        let b = analyze(&t);
        assert_eq!(a.distance_km.to_bits(), b.distance_km.to_bits());
        assert_eq!(a.elevation_gain_m.to_bits(), b.elevation_gain_m.to_bits());
        assert_eq!(a.elevation_loss_m.to_bits(), b.elevation_loss_m.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(1.004, 2), 1.0);
        assert_eq!(round_to(0.0, 2), 0.0);
    }
}
