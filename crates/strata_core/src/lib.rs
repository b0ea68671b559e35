//! Strata Core
//!
//! Broad-phase spatial queries for a voxel world simulation:
//! - Geometry primitives (boxes, block collision shapes)
//! - Chunk-aware block collision sweeping
//! - Entity collision queries and the world border fast path
//! - Incremental spatial entity tracking with listener fan-out
//!
//! World storage, block rules and the hooks that drive the tracker live
//! outside this crate and are consumed through the traits in [`world`].

pub mod collision;
mod entity;
pub mod math;
pub mod shape;
pub mod tracker;
pub mod world;

pub use glam;

pub use collision::{
    area_contains_block, block_collisions, box_collides_with_blocks, box_collides_with_entities,
    entity_collisions, is_box_fully_within_border, probe_below_feet, BlockCollisions,
    ChunkSectionSweeper, Collider, CollisionGroups, EntityCollisions, EntityKind, EntityView,
    KindGroup, SweepStats,
};
pub use entity::EntityId;
pub use shape::{Aabb, CollisionShape};
pub use tracker::{
    CellPos, EntityTracker, ListenerHandle, ListenerKey, NearbyEntityListener, TrackedEntity,
    TrackerError, TrackerStats,
};
pub use world::{
    BlockState, Chunk, ChunkSection, CollisionView, OversizedCounter, ShapeContext, VerticalBounds,
    WorldBorder,
};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
