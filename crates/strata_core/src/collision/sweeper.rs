//! Chunk-section sweeper: lazily yields the block collision shapes
//! intersecting a box.

use super::stats;
use crate::math::{
    block_coord, local_coord, section_coord, section_end, section_origin, DVec3, IVec3, EPSILON,
};
use crate::shape::{Aabb, CollisionShape};
use crate::world::{BlockState, Chunk, ChunkSection, CollisionView, ShapeContext};
use std::iter::FusedIterator;

/// Cursor over the block shapes colliding with a box.
///
/// Sections are visited Y innermost, then X, then Z; positions inside a
/// section X fastest, then Z, then Y. Unloaded chunks and empty sections
/// are skipped. Sections flagged as holding oversized blocks are scanned
/// one block past the box on every side, and blocks outside the box are
/// only tested when they can reach into it. Block bounds saturate at the
/// `i32` range, so very large finite boxes never overflow.
pub struct ChunkSectionSweeper<'w, V: CollisionView> {
    view: &'w V,
    aabb: Aabb,
    context: ShapeContext,
    min_y: i32,
    max_y: i32,
    /// Block bounds of the box, before any oversized extension.
    min: IVec3,
    max: IVec3,
    min_section: IVec3,
    max_section: IVec3,
    section_pos: IVec3,
    chunk: Option<&'w V::Chunk>,
    cursor: Option<SectionCursor<'w, V::Section>>,
    started: bool,
    exhausted: bool,
}

struct SectionCursor<'w, S> {
    section: &'w S,
    start: IVec3,
    end: IVec3,
    pos: IVec3,
    remaining: usize,
}

impl<'w, S> SectionCursor<'w, S> {
    fn new(section: &'w S, start: IVec3, end: IVec3) -> Self {
        let extent = (end - start + IVec3::ONE).as_uvec3();
        Self {
            section,
            start,
            end,
            pos: start,
            remaining: extent.x as usize * extent.y as usize * extent.z as usize,
        }
    }

    /// Returns the current position and steps X, then Z, then Y.
    fn advance(&mut self) -> IVec3 {
        let pos = self.pos;
        if self.pos.x < self.end.x {
            self.pos.x += 1;
        } else if self.pos.z < self.end.z {
            self.pos.x = self.start.x;
            self.pos.z += 1;
        } else {
            self.pos.x = self.start.x;
            self.pos.z = self.start.z;
            self.pos.y += 1;
        }
        self.remaining -= 1;
        pos
    }
}

impl<'w, V: CollisionView> ChunkSectionSweeper<'w, V> {
    /// Sweeps `aabb` on behalf of `context`'s entity. An empty box yields
    /// nothing.
    pub fn new(view: &'w V, aabb: Aabb, context: ShapeContext) -> Self {
        let bounds = view.vertical_bounds();
        let mut min = block_coords(aabb.min() - DVec3::splat(EPSILON));
        let mut max = block_coords(aabb.max() + DVec3::splat(EPSILON));
        min.y = bounds.clamp(min.y);
        max.y = bounds.clamp(max.y);

        let min_section = IVec3::new(
            section_coord(min.x.saturating_sub(1)),
            bounds.clamp_section(section_coord(min.y.saturating_sub(1))),
            section_coord(min.z.saturating_sub(1)),
        );
        let max_section = IVec3::new(
            section_coord(max.x.saturating_add(1)),
            bounds.clamp_section(section_coord(max.y.saturating_add(1))),
            section_coord(max.z.saturating_add(1)),
        );

        Self {
            view,
            aabb,
            context,
            min_y: bounds.min_y(),
            max_y: bounds.max_y(),
            min,
            max,
            min_section,
            max_section,
            section_pos: min_section,
            chunk: None,
            cursor: None,
            started: false,
            exhausted: aabb.is_empty(),
        }
    }

    /// The next colliding shape in world space, or `None` once the sweep is
    /// exhausted. Exhaustion is permanent.
    pub fn step(&mut self) -> Option<CollisionShape> {
        loop {
            if self.exhausted {
                return None;
            }
            if self.cursor.as_ref().map_or(true, |c| c.remaining == 0) {
                self.cursor = self.next_section();
                continue;
            }
            let Some(cursor) = self.cursor.as_mut() else {
                continue;
            };
            let pos = cursor.advance();
            let section = cursor.section;

            let edges_hit = self.edges_hit(pos);
            if edges_hit == 3 {
                continue;
            }
            let (x, y, z) = (local_coord(pos.x), local_coord(pos.y), local_coord(pos.z));
            let state = section.block_state(x, y, z);
            if !can_interact(state, edges_hit) {
                continue;
            }

            stats::record_shape_test();
            let shape = self.view.collision_shape(state, pos, &self.context);
            if let Some(hit) = collided_shape(&self.aabb, shape, pos) {
                stats::record_hit();
                return Some(hit);
            }
        }
    }

    /// Number of axes on which `pos` lies strictly outside the box's block
    /// bounds.
    #[inline]
    fn edges_hit(&self, pos: IVec3) -> u32 {
        (pos.cmplt(self.min) | pos.cmpgt(self.max)).bitmask().count_ones()
    }

    /// Moves to the next non-empty section and builds its cursor, or marks
    /// the sweep exhausted.
    fn next_section(&mut self) -> Option<SectionCursor<'w, V::Section>> {
        while self.advance_section() {
            let Some(chunk) = self.chunk else {
                continue;
            };
            let Some(section) = chunk.section(self.section_pos.y) else {
                continue;
            };
            if section.is_empty() {
                continue;
            }
            stats::record_section();

            let ext = IVec3::splat(i32::from(section.has_oversized_blocks()));
            let p = self.section_pos;
            let origin = IVec3::new(section_origin(p.x), section_origin(p.y), section_origin(p.z));
            let last = IVec3::new(section_end(p.x), section_end(p.y), section_end(p.z));
            let mut start = self.min.saturating_sub(ext).max(origin);
            let mut end = self.max.saturating_add(ext).min(last);
            start.y = start.y.max(self.min_y);
            end.y = end.y.min(self.max_y);

            if start.cmpgt(end).any() {
                continue;
            }
            tracing::trace!(section = ?self.section_pos, ?start, ?end, "sweeping section");
            return Some(SectionCursor::new(section, start, end));
        }
        self.exhausted = true;
        None
    }

    /// Steps the section cursor Y, then X, then Z. The chunk is fetched once
    /// per column; an unloaded column skips its remaining rows.
    fn advance_section(&mut self) -> bool {
        if !self.started {
            self.started = true;
            if self.min_section.cmpgt(self.max_section).any() {
                return false;
            }
            self.chunk = self.view.existing_chunk(self.section_pos.x, self.section_pos.z);
            return true;
        }
        if self.chunk.is_some() && self.section_pos.y < self.max_section.y {
            self.section_pos.y += 1;
            return true;
        }
        self.section_pos.y = self.min_section.y;
        if self.section_pos.x < self.max_section.x {
            self.section_pos.x += 1;
        } else if self.section_pos.z < self.max_section.z {
            self.section_pos.x = self.min_section.x;
            self.section_pos.z += 1;
        } else {
            return false;
        }
        self.chunk = self.view.existing_chunk(self.section_pos.x, self.section_pos.z);
        true
    }
}

impl<V: CollisionView> Iterator for ChunkSectionSweeper<'_, V> {
    type Item = CollisionShape;

    #[inline]
    fn next(&mut self) -> Option<CollisionShape> {
        self.step()
    }
}

impl<V: CollisionView> FusedIterator for ChunkSectionSweeper<'_, V> {}

fn block_coords(v: DVec3) -> IVec3 {
    IVec3::new(block_coord(v.x), block_coord(v.y), block_coord(v.z))
}

/// Blocks outside the box on one axis matter only if their shape leaves
/// the unit cube; outside on two axes only if they can span a diagonal.
#[inline]
fn can_interact<B: BlockState>(state: &B, edges_hit: u32) -> bool {
    match edges_hit {
        0 => true,
        1 => state.exceeds_cube(),
        2 => state.is_boundary_spanning(),
        _ => false,
    }
}

fn collided_shape(aabb: &Aabb, shape: CollisionShape, pos: IVec3) -> Option<CollisionShape> {
    if shape.is_empty() {
        return None;
    }
    if shape.is_full_cube() && shape.translation() == DVec3::ZERO {
        return aabb.intersects_block(pos).then(|| shape.at_block(pos));
    }
    let placed = shape.at_block(pos);
    placed.intersects(aabb).then_some(placed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::flat::{BlockKind, FlatWorld};
    use crate::world::VerticalBounds;

    fn sweep(world: &FlatWorld, aabb: Aabb) -> Vec<CollisionShape> {
        ChunkSectionSweeper::new(world, aabb, ShapeContext::absent()).collect()
    }

    #[test]
    fn unit_block_collides_only_when_overlapping() {
        let mut world = FlatWorld::new(VerticalBounds::default());
        world.set_block(IVec3::ZERO, BlockKind::Solid);

        let hits = sweep(&world, Aabb::UNIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].bounding_box(), Some(Aabb::UNIT));

        assert!(sweep(&world, Aabb::from_bounds(2.0, 0.0, 0.0, 3.0, 1.0, 1.0)).is_empty());
        // Face contact is not a collision.
        assert!(sweep(&world, Aabb::from_bounds(1.0, 0.0, 0.0, 2.0, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn empty_box_yields_nothing() {
        let mut world = FlatWorld::new(VerticalBounds::default());
        world.set_block(IVec3::ZERO, BlockKind::Solid);
        let flat = Aabb::from_bounds(0.2, 0.2, 0.2, 0.2, 0.2, 0.2);

        let mut sweeper = ChunkSectionSweeper::new(&world, flat, ShapeContext::absent());
        assert!(sweeper.step().is_none());
        assert!(sweeper.step().is_none());
    }

    #[test]
    fn unloaded_chunks_contribute_nothing() {
        let mut world = FlatWorld::new(VerticalBounds::default());
        world.set_block(IVec3::new(20, 0, 0), BlockKind::Solid);
        world.unload_chunk(1, 0);
        assert!(sweep(&world, Aabb::block(IVec3::new(20, 0, 0))).is_empty());
    }

    #[test]
    fn results_cross_section_boundaries_in_order() {
        let mut world = FlatWorld::new(VerticalBounds::default());
        for pos in [IVec3::new(15, 15, 0), IVec3::new(16, 15, 0), IVec3::new(15, 16, 0)] {
            world.set_block(pos, BlockKind::Solid);
        }
        let hits = sweep(&world, Aabb::from_bounds(14.5, 14.5, 0.2, 16.5, 16.5, 0.8));
        let mins: Vec<_> = hits.iter().filter_map(|s| s.bounding_box()).map(|b| b.min()).collect();
        // Section (0,0,0), then (0,1,0), then (1,0,0).
        assert_eq!(
            mins,
            vec![
                DVec3::new(15.0, 15.0, 0.0),
                DVec3::new(15.0, 16.0, 0.0),
                DVec3::new(16.0, 15.0, 0.0),
            ]
        );
    }

    #[test]
    fn fence_below_reaches_into_box_above() {
        let mut world = FlatWorld::new(VerticalBounds::default());
        world.set_block(IVec3::new(0, 10, 0), BlockKind::Fence);

        let above = Aabb::from_bounds(0.3, 11.2, 0.3, 0.7, 11.8, 0.7);
        let hits = sweep(&world, above);
        assert_eq!(hits.len(), 1);

        // A full block one below cannot reach up.
        let mut world = FlatWorld::new(VerticalBounds::default());
        world.set_block(IVec3::new(0, 10, 0), BlockKind::Solid);
        world.set_block(IVec3::new(5, 10, 5), BlockKind::Fence);
        assert!(sweep(&world, above).is_empty());
    }

    #[test]
    fn sweep_is_clamped_to_vertical_bounds() {
        let mut world = FlatWorld::new(VerticalBounds::new(0, 31));
        world.set_block(IVec3::new(0, 31, 0), BlockKind::Solid);
        let tall = Aabb::from_bounds(0.1, 20.0, 0.1, 0.9, 400.0, 0.9);
        assert_eq!(sweep(&world, tall).len(), 1);
    }
}
