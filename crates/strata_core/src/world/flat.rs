//! In-memory reference world.
//!
//! Plain arrays of [`BlockKind`] per section, a handful of block kinds
//! covering every collision case (full cubes, partial shapes, oversized
//! shapes, context-dependent shapes, boundary-spanning shapes) and a flat
//! entity list. Used by the runtime harness and by tests; real worlds
//! implement [`CollisionView`] and [`EntityView`] over their own storage.

use super::{
    BlockState, Chunk, ChunkSection, CollisionView, OversizedCounter, ShapeContext, VerticalBounds,
    WorldBorder,
};
use crate::collision::{Collider, CollisionGroups, EntityKind, EntityView};
use crate::math::{local_coord, section_coord, DVec3, IVec3, SECTION_SIZE};
use crate::shape::{Aabb, CollisionShape};
use crate::tracker::{ListenerHandle, TrackedEntity};
use crate::EntityId;
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, HashMap};

const SECTION_VOLUME: usize = (SECTION_SIZE * SECTION_SIZE * SECTION_SIZE) as usize;

static SLAB: Lazy<CollisionShape> =
    Lazy::new(|| CollisionShape::cuboid(Aabb::from_bounds(0.0, 0.0, 0.0, 1.0, 0.5, 1.0)));
static FENCE: Lazy<CollisionShape> =
    Lazy::new(|| CollisionShape::cuboid(Aabb::from_bounds(0.375, 0.0, 0.375, 0.625, 1.5, 0.625)));
static PLATFORM: Lazy<CollisionShape> =
    Lazy::new(|| CollisionShape::cuboid(Aabb::from_bounds(0.0, 0.875, 0.0, 1.0, 1.0, 1.0)));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlockKind {
    #[default]
    Air,
    Solid,
    /// Bottom half slab.
    Slab,
    /// Post one and a half blocks tall.
    Fence,
    /// Thin top surface, solid only to entities standing above it and not
    /// descending.
    Platform,
    /// No collision shape.
    Water,
    /// A block being pushed: a unit cube displaced towards `toward`.
    MovingPiston { toward: IVec3 },
}

impl BlockKind {
    pub fn collision_shape(&self, pos: IVec3, context: &ShapeContext) -> CollisionShape {
        match self {
            BlockKind::Air | BlockKind::Water => CollisionShape::empty(),
            BlockKind::Solid => CollisionShape::full_cube(),
            BlockKind::Slab => SLAB.clone(),
            BlockKind::Fence => FENCE.clone(),
            BlockKind::Platform => {
                if context.is_above(f64::from(pos.y) + 1.0) && !context.is_descending() {
                    PLATFORM.clone()
                } else {
                    CollisionShape::empty()
                }
            }
            BlockKind::MovingPiston { toward } => {
                CollisionShape::full_cube().offset(toward.as_dvec3())
            }
        }
    }
}

impl BlockState for BlockKind {
    fn exceeds_cube(&self) -> bool {
        matches!(self, BlockKind::Fence | BlockKind::MovingPiston { .. })
    }

    fn is_boundary_spanning(&self) -> bool {
        matches!(self, BlockKind::MovingPiston { .. })
    }
}

pub struct FlatSection {
    blocks: Box<[BlockKind]>,
    non_air: u16,
    oversized: OversizedCounter,
}

impl FlatSection {
    pub fn new() -> Self {
        Self {
            blocks: vec![BlockKind::Air; SECTION_VOLUME].into_boxed_slice(),
            non_air: 0,
            oversized: OversizedCounter::new(),
        }
    }

    #[inline]
    fn index(x: usize, y: usize, z: usize) -> usize {
        (y << 8) | (z << 4) | x
    }

    /// Replaces the block at local coordinates, returning the old one.
    pub fn set(&mut self, x: usize, y: usize, z: usize, kind: BlockKind) -> BlockKind {
        let old = std::mem::replace(&mut self.blocks[Self::index(x, y, z)], kind);
        match (old == BlockKind::Air, kind == BlockKind::Air) {
            (true, false) => self.non_air += 1,
            (false, true) => self.non_air -= 1,
            _ => {}
        }
        self.oversized.on_block_replaced(&old, &kind);
        old
    }

    /// Rebuilds the cached counts from the block array.
    pub fn recount(&mut self) {
        self.non_air = self.blocks.iter().filter(|b| **b != BlockKind::Air).count() as u16;
        self.oversized.recount(self.blocks.iter());
    }
}

impl Default for FlatSection {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSection for FlatSection {
    type Block = BlockKind;

    fn is_empty(&self) -> bool {
        self.non_air == 0
    }

    fn has_oversized_blocks(&self) -> bool {
        self.oversized.has_oversized_blocks()
    }

    fn block_state(&self, x: usize, y: usize, z: usize) -> &BlockKind {
        &self.blocks[Self::index(x, y, z)]
    }
}

#[derive(Default)]
pub struct FlatChunk {
    sections: BTreeMap<i32, FlatSection>,
}

impl Chunk for FlatChunk {
    type Section = FlatSection;

    fn section(&self, section_y: i32) -> Option<&FlatSection> {
        self.sections.get(&section_y)
    }
}

/// An entity box standing on `position` (the centre of its base).
#[derive(Debug, Clone)]
pub struct FlatEntity {
    id: EntityId,
    kind: EntityKind,
    position: DVec3,
    size: DVec3,
    root_vehicle: Option<EntityId>,
    descending: bool,
    listener: Option<ListenerHandle>,
}

impl FlatEntity {
    /// `size` is width, height and depth. The id is assigned on spawn.
    pub fn new(kind: EntityKind, position: DVec3, size: DVec3) -> Self {
        Self {
            id: EntityId::from_raw(0),
            kind,
            position,
            size: size.abs(),
            root_vehicle: None,
            descending: false,
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: ListenerHandle) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn set_descending(&mut self, descending: bool) {
        self.descending = descending;
    }
}

impl Collider for FlatEntity {
    fn id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn bounding_box(&self) -> Aabb {
        let half = DVec3::new(self.size.x * 0.5, 0.0, self.size.z * 0.5);
        Aabb::new(self.position - half, self.position + half + DVec3::new(0.0, self.size.y, 0.0))
    }

    fn collision_box(&self) -> Option<Aabb> {
        CollisionGroups::standard()
            .collision_box
            .contains(self.kind)
            .then(|| self.bounding_box())
    }

    fn hard_collision_box(&self, other: &dyn Collider) -> Option<Aabb> {
        CollisionGroups::standard()
            .hard_collision_box
            .contains(self.kind)
            .then(|| other.bounding_box())
    }

    fn root_vehicle(&self) -> EntityId {
        self.root_vehicle.unwrap_or(self.id)
    }

    fn is_descending(&self) -> bool {
        self.descending
    }
}

impl TrackedEntity for FlatEntity {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn position(&self) -> DVec3 {
        self.position
    }

    fn nearby_listener(&self) -> Option<ListenerHandle> {
        self.listener.clone()
    }
}

pub struct FlatWorld {
    bounds: VerticalBounds,
    border: WorldBorder,
    chunks: HashMap<(i32, i32), FlatChunk>,
    entities: BTreeMap<EntityId, FlatEntity>,
    next_id: u64,
}

impl FlatWorld {
    pub fn new(bounds: VerticalBounds) -> Self {
        Self {
            bounds,
            border: WorldBorder::default(),
            chunks: HashMap::new(),
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn set_border(&mut self, border: WorldBorder) {
        self.border = border;
    }

    /// Places a block, loading its chunk if needed. Returns the replaced
    /// block, or `None` (and changes nothing) outside the vertical bounds.
    pub fn set_block(&mut self, pos: IVec3, kind: BlockKind) -> Option<BlockKind> {
        if !self.bounds.contains(pos.y) {
            tracing::warn!(?pos, ?kind, "block outside vertical bounds ignored");
            return None;
        }
        let section = self
            .chunks
            .entry((section_coord(pos.x), section_coord(pos.z)))
            .or_default()
            .sections
            .entry(section_coord(pos.y))
            .or_default();
        Some(section.set(local_coord(pos.x), local_coord(pos.y), local_coord(pos.z), kind))
    }

    /// Block at `pos`; air where nothing is loaded.
    pub fn block(&self, pos: IVec3) -> BlockKind {
        self.block_state_at(pos).copied().unwrap_or_default()
    }

    /// Drops a chunk column and its blocks. Returns whether it was loaded.
    pub fn unload_chunk(&mut self, chunk_x: i32, chunk_z: i32) -> bool {
        self.chunks.remove(&(chunk_x, chunk_z)).is_some()
    }

    pub fn loaded_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn spawn(&mut self, mut entity: FlatEntity) -> EntityId {
        let id = EntityId::from_raw(self.next_id);
        self.next_id += 1;
        entity.id = id;
        self.entities.insert(id, entity);
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<FlatEntity> {
        let entity = self.entities.remove(&id)?;
        for rider in self.entities.values_mut() {
            if rider.root_vehicle == Some(id) {
                rider.root_vehicle = None;
            }
        }
        Some(entity)
    }

    pub fn entity(&self, id: EntityId) -> Option<&FlatEntity> {
        self.entities.get(&id)
    }

    /// Moves an entity, returning its previous position.
    pub fn move_entity(&mut self, id: EntityId, to: DVec3) -> Option<DVec3> {
        let entity = self.entities.get_mut(&id)?;
        Some(std::mem::replace(&mut entity.position, to))
    }

    /// Seats `passenger` on `vehicle`'s chain. Returns false if either is
    /// missing.
    pub fn mount(&mut self, passenger: EntityId, vehicle: EntityId) -> bool {
        let Some(root) = self.entities.get(&vehicle).map(Collider::root_vehicle) else {
            return false;
        };
        match self.entities.get_mut(&passenger) {
            Some(entity) if passenger != root => {
                entity.root_vehicle = Some(root);
                true
            }
            _ => false,
        }
    }
}

impl CollisionView for FlatWorld {
    type Block = BlockKind;
    type Section = FlatSection;
    type Chunk = FlatChunk;

    fn existing_chunk(&self, chunk_x: i32, chunk_z: i32) -> Option<&FlatChunk> {
        self.chunks.get(&(chunk_x, chunk_z))
    }

    fn collision_shape(
        &self,
        block: &BlockKind,
        pos: IVec3,
        context: &ShapeContext,
    ) -> CollisionShape {
        block.collision_shape(pos, context)
    }

    fn world_border(&self) -> &WorldBorder {
        &self.border
    }

    fn vertical_bounds(&self) -> VerticalBounds {
        self.bounds
    }
}

impl EntityView for FlatWorld {
    fn entities_overlapping(&self, except: Option<EntityId>, area: &Aabb) -> Vec<&dyn Collider> {
        self.entities
            .values()
            .filter(|entity| Some(entity.id) != except && entity.bounding_box().intersects(area))
            .map(|entity| entity as &dyn Collider)
            .collect()
    }

    fn collision_groups(&self) -> Option<&CollisionGroups> {
        Some(CollisionGroups::standard())
    }
}
