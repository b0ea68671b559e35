//! Spatial entity tracker
//!
//! Partitions space into 16³ cells and keeps, per cell, the entities
//! inside it and the range listeners subscribed to it. Listeners receive
//! "entered" and "left" notifications as entities and listeners move
//! between cells, so they never have to scan for nearby entities.
//!
//! The tracker is single-threaded and owned by the world it indexes; the
//! world calls the `on_*` hooks whenever an entity is added, removed or
//! crosses a cell boundary.

mod cell;
mod engine;
mod error;
mod listener;

pub use cell::{CellBox, CellPos};
pub use engine::{EntityTracker, TrackedEntity, TrackerStats};
pub use error::TrackerError;
pub use listener::{ListenerHandle, ListenerKey, NearbyEntityListener};
