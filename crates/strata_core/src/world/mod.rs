//! Interfaces consumed from the voxel world.
//!
//! Chunk storage, block rules and shape caches belong to the world layer.
//! The sweeper and the collision queries only see them through the traits
//! below, so any storage (palette containers, flat arrays, test doubles)
//! can be plugged in.

mod border;
pub mod flat;
mod oversized;

pub use border::WorldBorder;
pub use oversized::OversizedCounter;

use crate::collision::Collider;
use crate::math::{local_coord, section_coord, IVec3};
use crate::shape::CollisionShape;
use crate::EntityId;

/// Per-state block properties the collision code needs.
pub trait BlockState {
    /// The state's collision shape may extend outside its own unit cube.
    fn exceeds_cube(&self) -> bool;

    /// The state is the special-cased kind whose geometry can span
    /// diagonally across a two-block boundary (a moving piston).
    fn is_boundary_spanning(&self) -> bool {
        false
    }

    /// The fluid occupying this state has a shape exceeding the cube.
    fn fluid_exceeds_cube(&self) -> bool {
        false
    }

    /// Whether the state contributes to a section's oversized counter.
    fn counts_as_oversized(&self) -> bool {
        self.exceeds_cube() || self.is_boundary_spanning() || self.fluid_exceeds_cube()
    }
}

/// A 16³ block section of a chunk column.
pub trait ChunkSection {
    type Block: BlockState;

    /// Sections holding only air report empty and are never scanned.
    fn is_empty(&self) -> bool;

    /// Cached result of the section's oversized counter.
    fn has_oversized_blocks(&self) -> bool;

    /// Block state at section-local coordinates (each in `0..16`).
    fn block_state(&self, x: usize, y: usize, z: usize) -> &Self::Block;
}

/// A loaded chunk column.
pub trait Chunk {
    type Section: ChunkSection;

    /// Section at vertical section index `section_y`, if present.
    fn section(&self, section_y: i32) -> Option<&Self::Section>;
}

/// Read access to the world for collision queries.
pub trait CollisionView {
    type Block: BlockState;
    type Section: ChunkSection<Block = Self::Block>;
    type Chunk: Chunk<Section = Self::Section>;

    /// The chunk column at chunk coordinates, or `None` if it is not loaded.
    /// Queries never load chunks.
    fn existing_chunk(&self, chunk_x: i32, chunk_z: i32) -> Option<&Self::Chunk>;

    /// Collision shape of `block` placed at `pos`, in block-local coordinates.
    fn collision_shape(
        &self,
        block: &Self::Block,
        pos: IVec3,
        context: &ShapeContext,
    ) -> CollisionShape;

    fn world_border(&self) -> &WorldBorder;

    fn vertical_bounds(&self) -> VerticalBounds;

    /// Block state at a world position; `None` if unloaded or out of bounds.
    fn block_state_at(&self, pos: IVec3) -> Option<&Self::Block> {
        if !self.vertical_bounds().contains(pos.y) {
            return None;
        }
        let chunk = self.existing_chunk(section_coord(pos.x), section_coord(pos.z))?;
        let section = chunk.section(section_coord(pos.y))?;
        Some(section.block_state(local_coord(pos.x), local_coord(pos.y), local_coord(pos.z)))
    }
}

/// Inclusive range of block rows that exist in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalBounds {
    min_y: i32,
    max_y: i32,
}

impl VerticalBounds {
    pub fn new(min_y: i32, max_y: i32) -> Self {
        Self {
            min_y: min_y.min(max_y),
            max_y: min_y.max(max_y),
        }
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    #[inline]
    pub fn contains(&self, y: i32) -> bool {
        (self.min_y..=self.max_y).contains(&y)
    }

    #[inline]
    pub fn clamp(&self, y: i32) -> i32 {
        y.clamp(self.min_y, self.max_y)
    }

    #[inline]
    pub fn min_section(&self) -> i32 {
        section_coord(self.min_y)
    }

    #[inline]
    pub fn max_section(&self) -> i32 {
        section_coord(self.max_y)
    }

    #[inline]
    pub fn clamp_section(&self, section_y: i32) -> i32 {
        section_y.clamp(self.min_section(), self.max_section())
    }
}

impl Default for VerticalBounds {
    /// Sixteen sections, rows 0 to 255.
    fn default() -> Self {
        Self::new(0, 255)
    }
}

/// Facts about the entity asking for collisions, handed to shape lookups
/// so that context-dependent blocks (one-way platforms, scaffolding) can
/// answer differently per requester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeContext {
    entity: Option<EntityId>,
    min_y: f64,
    descending: bool,
}

impl ShapeContext {
    /// Context for queries made on behalf of no entity.
    pub const fn absent() -> Self {
        Self {
            entity: None,
            min_y: f64::NEG_INFINITY,
            descending: false,
        }
    }

    pub fn of(collider: &dyn Collider) -> Self {
        Self {
            entity: Some(collider.id()),
            min_y: collider.bounding_box().min().y,
            descending: collider.is_descending(),
        }
    }

    #[inline]
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    #[inline]
    pub fn is_descending(&self) -> bool {
        self.descending
    }

    /// True if the requester's feet are at or above `top_y`.
    #[inline]
    pub fn is_above(&self, top_y: f64) -> bool {
        self.min_y > top_y - 1.0e-5
    }
}

impl Default for ShapeContext {
    fn default() -> Self {
        Self::absent()
    }
}
