use std::num::NonZeroUsize;

use serde::Deserialize;

/// Limits and defaults applied when a GPX upload is ingested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    /// Largest accepted file, in bytes (default: 10 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,

    /// Accepted file name suffixes, matched case-insensitively (default: [".gpx"])
    #[serde(default = "default_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Point cap for overview map paths (default: 50)
    #[serde(default = "default_max_display_points")]
    pub max_display_points: NonZeroUsize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            allowed_extensions: default_extensions(),
            max_display_points: default_max_display_points(),
        }
    }
}

impl IngestOptions {
    pub fn accepts_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.allowed_extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }
}

/// Options for GeoJSON rendering of tracks.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    /// Include elevation as the 3rd coordinate value (default: true)
    #[serde(default = "default_true")]
    pub include_elevation: bool,

    /// Include timestamps in coordinateProperties.times (default: true)
    #[serde(default = "default_true")]
    pub include_time: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_elevation: true,
            include_time: true,
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_extensions() -> Vec<String> {
    vec![".gpx".to_string()]
}

const DEFAULT_MAX_DISPLAY_POINTS: NonZeroUsize = NonZeroUsize::new(50).unwrap();

fn default_max_display_points() -> NonZeroUsize {
    DEFAULT_MAX_DISPLAY_POINTS
}

fn default_true() -> bool {
    true
}
