//! Collision queries
//!
//! Block collisions come from [`ChunkSectionSweeper`], entity collisions
//! from [`EntityView`]. Both are exposed as lazy sequences and as
//! short-circuiting boolean checks. "No collision" is always an empty
//! result, never an error.

mod entities;
mod stats;
mod sweeper;

pub use entities::{
    entities_with_collision_box_for, Collider, CollisionGroups, EntityCollisions, EntityKind,
    EntityView, KindGroup,
};
pub use stats::{reset_sweep_stats, sweep_stats, SweepStats};
pub use sweeper::ChunkSectionSweeper;

use crate::math::{block_coord, local_coord, section_coord, IVec3, EPSILON};
use crate::shape::{Aabb, CollisionShape};
use crate::world::{Chunk, ChunkSection, CollisionView, ShapeContext, WorldBorder};
use std::iter::FusedIterator;

/// Lazy sequence of block collision shapes, optionally led by the world
/// border.
pub struct BlockCollisions<'w, V: CollisionView> {
    border: Option<CollisionShape>,
    sweeper: ChunkSectionSweeper<'w, V>,
}

impl<V: CollisionView> Iterator for BlockCollisions<'_, V> {
    type Item = CollisionShape;

    fn next(&mut self) -> Option<CollisionShape> {
        self.border.take().or_else(|| self.sweeper.step())
    }
}

impl<V: CollisionView> FusedIterator for BlockCollisions<'_, V> {}

/// Block shapes (and the border, for an entity on it) colliding with `aabb`.
pub fn block_collisions<'w, V: CollisionView>(
    view: &'w V,
    entity: Option<&dyn Collider>,
    aabb: Aabb,
) -> BlockCollisions<'w, V> {
    let context = entity.map_or_else(ShapeContext::absent, ShapeContext::of);
    let border = match entity {
        Some(entity)
            if !aabb.is_empty() && is_on_border(view.world_border(), &entity.bounding_box()) =>
        {
            Some(view.world_border().as_shape())
        }
        _ => None,
    };
    BlockCollisions {
        border,
        sweeper: ChunkSectionSweeper::new(view, aabb, context),
    }
}

/// Whether [`block_collisions`] would yield anything.
pub fn box_collides_with_blocks<V: CollisionView>(
    view: &V,
    entity: Option<&dyn Collider>,
    aabb: Aabb,
) -> bool {
    block_collisions(view, entity, aabb).next().is_some()
}

/// Collision boxes of entities near `aabb`. Empty for an empty box.
///
/// Candidates overlapping `aabb` grown by [`EPSILON`] are gathered once, on
/// the first pull, excluding `entity`, entities rejected by `predicate`
/// and entities sharing a vehicle chain with `entity`. Each candidate
/// yields its own collision box, then the requester's hard collision box
/// against it, whichever exist and intersect.
pub fn entity_collisions<'v, V, P>(
    view: &'v V,
    entity: Option<&'v dyn Collider>,
    aabb: Aabb,
    predicate: P,
) -> EntityCollisions<'v, V, P>
where
    V: EntityView + ?Sized,
    P: FnMut(&dyn Collider) -> bool,
{
    EntityCollisions::new(view, entity, aabb, predicate)
}

/// Whether [`entity_collisions`] would yield anything. Always false for an
/// empty box.
pub fn box_collides_with_entities<'v, V, P>(
    view: &'v V,
    entity: Option<&'v dyn Collider>,
    aabb: Aabb,
    predicate: P,
) -> bool
where
    V: EntityView + ?Sized,
    P: FnMut(&dyn Collider) -> bool,
{
    entity_collisions(view, entity, aabb, predicate).next().is_some()
}

/// Whether `aabb` lies entirely inside the border (floor/ceil of the bounds,
/// min inclusive, max exclusive).
#[inline]
pub fn is_box_fully_within_border(border: &WorldBorder, aabb: &Aabb) -> bool {
    border.fully_contains(aabb)
}

/// The box straddles the border: inside when shrunk by [`EPSILON`], not
/// inside when grown by it.
fn is_on_border(border: &WorldBorder, entity_box: &Aabb) -> bool {
    is_box_fully_within_border(border, &entity_box.contract(EPSILON))
        && !is_box_fully_within_border(border, &entity_box.expand(EPSILON))
}

/// Resolves the common "standing on something" case of a downward move
/// against the single block under the centre of the box's base.
///
/// Returns `Some(0.0)` when that block stops the motion completely and
/// `None` when the caller has to run the full sweep. Upward and zero
/// motion are always inconclusive.
pub fn probe_below_feet<V: CollisionView>(
    view: &V,
    entity_box: &Aabb,
    context: &ShapeContext,
    dy: f64,
) -> Option<f64> {
    if dy >= 0.0 {
        return None;
    }
    let center = entity_box.center();
    let pos = IVec3::new(
        block_coord(center.x),
        (entity_box.min().y.ceil() as i32).saturating_sub(1),
        block_coord(center.z),
    );
    let block = view.block_state_at(pos)?;
    let shape = view.collision_shape(block, pos, context).at_block(pos);
    let travel = shape.clip_y_motion(entity_box, dy);
    (travel.abs() < EPSILON).then_some(0.0)
}

/// Whether any loaded block inside the block bounds of `area` satisfies
/// `predicate`.
pub fn area_contains_block<V, F>(view: &V, area: &Aabb, mut predicate: F) -> bool
where
    V: CollisionView,
    F: FnMut(&V::Block) -> bool,
{
    let bounds = view.vertical_bounds();
    let (min, max) = (area.min(), area.max());
    let (min_x, max_x) = (block_coord(min.x), block_coord(max.x));
    let (min_z, max_z) = (block_coord(min.z), block_coord(max.z));
    let min_y = block_coord(min.y).max(bounds.min_y());
    let max_y = block_coord(max.y).min(bounds.max_y());

    for x in min_x..=max_x {
        for z in min_z..=max_z {
            let Some(chunk) = view.existing_chunk(section_coord(x), section_coord(z)) else {
                continue;
            };
            for y in min_y..=max_y {
                let Some(section) = chunk.section(section_coord(y)) else {
                    continue;
                };
                if section.is_empty() {
                    continue;
                }
                if predicate(section.block_state(local_coord(x), local_coord(y), local_coord(z))) {
                    return true;
                }
            }
        }
    }
    false
}
