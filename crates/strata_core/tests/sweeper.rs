//! Sweeper behaviour against a hand-built world whose section flags can be
//! forced independently of the blocks they hold.

use std::cell::Cell;
use std::collections::HashMap;

use strata_core::glam::{DVec3, IVec3};
use strata_core::{
    Aabb, BlockState, Chunk, ChunkSection, ChunkSectionSweeper, CollisionShape, CollisionView,
    ShapeContext, VerticalBounds, WorldBorder,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Block {
    Air,
    Solid,
    /// Post reaching half a block above its cell.
    Post,
    /// Unit cube displaced by the offset; exceeds the cube but is not
    /// boundary-spanning.
    Shifted(IVec3),
    /// Unit cube displaced by the offset, flagged boundary-spanning.
    Spanning(IVec3),
}

static AIR: Block = Block::Air;

impl BlockState for Block {
    fn exceeds_cube(&self) -> bool {
        matches!(self, Block::Post | Block::Shifted(_) | Block::Spanning(_))
    }

    fn is_boundary_spanning(&self) -> bool {
        matches!(self, Block::Spanning(_))
    }
}

#[derive(Default)]
struct Section {
    blocks: HashMap<(usize, usize, usize), Block>,
    oversized: bool,
    force_empty: bool,
}

impl ChunkSection for Section {
    type Block = Block;

    fn is_empty(&self) -> bool {
        self.force_empty || self.blocks.is_empty()
    }

    fn has_oversized_blocks(&self) -> bool {
        self.oversized
    }

    fn block_state(&self, x: usize, y: usize, z: usize) -> &Block {
        self.blocks.get(&(x, y, z)).unwrap_or(&AIR)
    }
}

#[derive(Default)]
struct Column {
    sections: HashMap<i32, Section>,
}

impl Chunk for Column {
    type Section = Section;

    fn section(&self, section_y: i32) -> Option<&Section> {
        self.sections.get(&section_y)
    }
}

#[derive(Default)]
struct TestView {
    columns: HashMap<(i32, i32), Column>,
    border: WorldBorder,
    /// Lookups of non-air shapes.
    shape_lookups: Cell<usize>,
}

impl TestView {
    fn put(&mut self, pos: IVec3, block: Block) -> &mut Section {
        let section = self
            .columns
            .entry((pos.x >> 4, pos.z >> 4))
            .or_default()
            .sections
            .entry(pos.y >> 4)
            .or_default();
        let local = ((pos.x & 15) as usize, (pos.y & 15) as usize, (pos.z & 15) as usize);
        section.blocks.insert(local, block);
        section
    }

    fn sweep(&self, aabb: Aabb) -> Vec<CollisionShape> {
        ChunkSectionSweeper::new(self, aabb, ShapeContext::absent()).collect()
    }
}

impl CollisionView for TestView {
    type Block = Block;
    type Section = Section;
    type Chunk = Column;

    fn existing_chunk(&self, chunk_x: i32, chunk_z: i32) -> Option<&Column> {
        self.columns.get(&(chunk_x, chunk_z))
    }

    fn collision_shape(
        &self,
        block: &Block,
        _pos: IVec3,
        _context: &ShapeContext,
    ) -> CollisionShape {
        if *block != Block::Air {
            self.shape_lookups.set(self.shape_lookups.get() + 1);
        }
        match block {
            Block::Air => CollisionShape::empty(),
            Block::Solid => CollisionShape::full_cube(),
            Block::Post => CollisionShape::cuboid(Aabb::from_bounds(0.4, 0.0, 0.4, 0.6, 1.5, 0.6)),
            Block::Shifted(by) | Block::Spanning(by) => {
                CollisionShape::full_cube().offset(by.as_dvec3())
            }
        }
    }

    fn world_border(&self) -> &WorldBorder {
        &self.border
    }

    fn vertical_bounds(&self) -> VerticalBounds {
        VerticalBounds::default()
    }
}

fn above_post() -> Aabb {
    Aabb::from_bounds(0.3, 11.2, 0.3, 0.7, 11.8, 0.7)
}

#[test]
fn oversized_flag_gates_boundary_extension() {
    let mut view = TestView::default();
    view.put(IVec3::new(0, 10, 0), Block::Post).oversized = true;
    assert_eq!(view.sweep(above_post()).len(), 1);

    let mut view = TestView::default();
    view.put(IVec3::new(0, 10, 0), Block::Post).oversized = false;
    assert!(view.sweep(above_post()).is_empty());
    assert_eq!(view.shape_lookups.get(), 0);
}

#[test]
fn one_edge_requires_exceeding_the_cube() {
    let mut view = TestView::default();
    view.put(IVec3::new(0, 10, 0), Block::Solid).oversized = true;
    assert!(view.sweep(above_post()).is_empty());
    assert_eq!(view.shape_lookups.get(), 0);
}

#[test]
fn two_edges_require_boundary_spanning() {
    let inside = Aabb::from_bounds(0.2, 0.2, 0.2, 0.8, 0.8, 0.8);
    let diagonal = IVec3::new(-1, 0, -1);

    let mut view = TestView::default();
    view.put(IVec3::new(1, 0, 1), Block::Spanning(diagonal)).oversized = true;
    let hits = view.sweep(inside);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].bounding_box(), Some(Aabb::UNIT));

    let mut view = TestView::default();
    view.put(IVec3::new(1, 0, 1), Block::Shifted(diagonal)).oversized = true;
    assert!(view.sweep(inside).is_empty());
}

#[test]
fn three_edges_are_never_tested() {
    let mut view = TestView::default();
    view.put(IVec3::new(1, 1, 1), Block::Spanning(IVec3::new(-1, -1, -1))).oversized = true;
    assert!(view.sweep(Aabb::from_bounds(0.2, 0.2, 0.2, 0.8, 0.8, 0.8)).is_empty());
    assert_eq!(view.shape_lookups.get(), 0);
}

#[test]
fn empty_sections_are_not_scanned() {
    let mut view = TestView::default();
    view.put(IVec3::ZERO, Block::Solid).force_empty = true;
    assert!(view.sweep(Aabb::UNIT).is_empty());
    assert_eq!(view.shape_lookups.get(), 0);
}

#[test]
fn positions_walk_x_then_z_then_y() {
    let mut view = TestView::default();
    for pos in [IVec3::new(0, 1, 0), IVec3::new(0, 0, 1), IVec3::new(1, 0, 0), IVec3::ZERO] {
        view.put(pos, Block::Solid);
    }
    let order: Vec<DVec3> = view
        .sweep(Aabb::from_bounds(0.1, 0.1, 0.1, 1.9, 1.9, 1.9))
        .iter()
        .filter_map(CollisionShape::bounding_box)
        .map(|b| b.min())
        .collect();
    assert_eq!(
        order,
        vec![
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(0.0, 1.0, 0.0),
        ]
    );
}

#[test]
fn stepping_resumes_where_it_stopped() {
    let mut view = TestView::default();
    for x in 0..40 {
        view.put(IVec3::new(x, 3, 7), Block::Solid);
    }
    let aabb = Aabb::from_bounds(0.5, 3.1, 7.1, 38.5, 3.9, 7.9);
    let all = view.sweep(aabb);
    assert_eq!(all.len(), 39);

    let mut sweeper = ChunkSectionSweeper::new(&view, aabb, ShapeContext::absent());
    let mut stepped = Vec::new();
    while let Some(shape) = sweeper.step() {
        stepped.push(shape);
    }
    assert_eq!(stepped, all);
    assert!(sweeper.step().is_none());
    assert!(sweeper.next().is_none());
}
