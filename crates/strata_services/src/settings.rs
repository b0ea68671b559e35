//! Settings management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use strata_core::{VerticalBounds, WorldBorder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings")]
    Encode(#[from] serde_json::Error),
}

/// Runtime settings. Every field falls back to its default when missing
/// from the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub world: WorldSettings,
    pub tracker: TrackerSettings,
    pub harness: HarnessSettings,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// Lowest block row.
    pub min_y: i32,
    /// Highest block row (inclusive).
    pub max_y: i32,
    pub border_center_x: f64,
    pub border_center_z: f64,
    pub border_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Listener radius in cells given to listening entities.
    pub listener_range: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessSettings {
    pub ticks: u32,
    pub entities: u32,
    pub seed: u64,
    /// Share of entities carrying a range listener, `0.0..=1.0`.
    pub listener_fraction: f64,
    /// Radius in blocks of the square the harness spawns in.
    pub spawn_radius: f64,
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl WorldSettings {
    pub fn vertical_bounds(&self) -> VerticalBounds {
        VerticalBounds::new(self.min_y, self.max_y)
    }

    pub fn world_border(&self) -> WorldBorder {
        WorldBorder::new(self.border_center_x, self.border_center_z, self.border_size)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            world: WorldSettings::default(),
            tracker: TrackerSettings::default(),
            harness: HarnessSettings::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            min_y: 0,
            max_y: 255,
            border_center_x: 0.0,
            border_center_z: 0.0,
            border_size: WorldBorder::DEFAULT_SIZE,
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self { listener_range: 2 }
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self {
            ticks: 200,
            entities: 256,
            seed: 0x5eed,
            listener_fraction: 0.25,
            spawn_radius: 96.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "world": { "min_y": -64, "max_y": 319 } }"#).unwrap();
        assert_eq!(settings.world.vertical_bounds(), VerticalBounds::new(-64, 319));
        assert_eq!(settings.world.border_size, WorldBorder::DEFAULT_SIZE);
        assert_eq!(settings.harness, HarnessSettings::default());
        assert_eq!(settings.log_filter, "info");
    }

    #[test]
    fn json_round_trip() {
        let mut settings = Settings::default();
        settings.tracker.listener_range = 5;
        let back: Settings = serde_json::from_str(&settings.to_json().unwrap()).unwrap();
        assert_eq!(back, settings);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Settings::load("/nonexistent/strata.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/strata.json"));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path =
            std::env::temp_dir().join(format!("strata-settings-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
