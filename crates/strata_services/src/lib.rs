//! Strata Services Layer
//!
//! Process-level plumbing shared by binaries: settings files and logging.

pub mod logging;
pub mod settings;

pub use settings::{HarnessSettings, Settings, SettingsError, TrackerSettings, WorldSettings};
