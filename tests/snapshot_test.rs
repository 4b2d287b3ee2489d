use std::path::Path;

use trail_gpx::geometry::analyze;
use trail_gpx::ingest::ingest;
use trail_gpx::options::IngestOptions;
use trail_gpx::parser::extract;
use trail_gpx::profile::elevation_profile;

fn load_fixture(path: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{path}")).unwrap()
}

/// Compare actual JSON output against the expected snapshot file.
/// When `UPDATE_SNAPSHOTS=1` is set, write/overwrite the expected file instead.
fn assert_snapshot(actual: &serde_json::Value, expected_path: &str) {
    let path = format!("tests/fixtures/expected/{expected_path}");

    if matches!(std::env::var("UPDATE_SNAPSHOTS").as_deref(), Ok("1")) {
        let dir = Path::new(&path).parent().unwrap();
        std::fs::create_dir_all(dir).unwrap();
        let pretty = serde_json::to_string_pretty(actual).unwrap();
        std::fs::write(&path, pretty.as_bytes()).unwrap();
        eprintln!("Updated snapshot: {path}");
        return;
    }

    let expected_str = std::fs::read_to_string(&path).unwrap_or_else(|_| {
        panic!("Expected file not found: {path}. Run with UPDATE_SNAPSHOTS=1 to generate.")
    });
    let expected: serde_json::Value = serde_json::from_str(&expected_str)
        .unwrap_or_else(|e| panic!("Failed to parse {path}: {e}"));

    assert_eq!(
        *actual, expected,
        "Snapshot mismatch for {path}.\nRun with UPDATE_SNAPSHOTS=1 to update."
    );
}

#[test]
fn snapshot_01_known_geometry_summary() {
    let track = extract(&load_fixture("basic/01_known_geometry.gpx")).unwrap();
    let actual = serde_json::to_value(analyze(&track)).unwrap();
    assert_snapshot(&actual, "basic/01_known_geometry.summary.json");
}

#[test]
fn snapshot_01_known_geometry_profile() {
    let track = extract(&load_fixture("basic/01_known_geometry.gpx")).unwrap();
    let actual = serde_json::to_value(elevation_profile(track.points())).unwrap();
    assert_snapshot(&actual, "basic/01_known_geometry.profile.json");
}

#[test]
fn snapshot_02_single_point_upload() {
    let gpx = load_fixture("basic/02_single_point.gpx");
    let upload = ingest("02_single_point.gpx", gpx.as_bytes(), &IngestOptions::default()).unwrap();
    let actual = serde_json::to_value(&upload).unwrap();
    assert_snapshot(&actual, "basic/02_single_point.upload.json");
}
