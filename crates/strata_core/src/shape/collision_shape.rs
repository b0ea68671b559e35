use super::Aabb;
use crate::math::{DVec3, IVec3};
use std::sync::Arc;

/// Collision geometry of a block, an entity box or the world border.
///
/// Shapes are built in local coordinates by whoever owns them (block states
/// cache theirs) and translated with [`CollisionShape::offset`]. Translation
/// never copies the box list: compound shapes share it through an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionShape {
    kind: ShapeKind,
    offset: DVec3,
}

#[derive(Debug, Clone, PartialEq)]
enum ShapeKind {
    Empty,
    /// Exactly the unit cube `[0, 1]³` before translation.
    FullCube,
    Boxes(Arc<[Aabb]>),
}

impl CollisionShape {
    pub const fn empty() -> Self {
        Self {
            kind: ShapeKind::Empty,
            offset: DVec3::ZERO,
        }
    }

    pub const fn full_cube() -> Self {
        Self {
            kind: ShapeKind::FullCube,
            offset: DVec3::ZERO,
        }
    }

    /// A single box. The unit cube is recognised and mapped to the fast path.
    pub fn cuboid(aabb: Aabb) -> Self {
        Self::union([aabb])
    }

    /// Union of boxes. Degenerate boxes are dropped; a lone unit cube becomes
    /// [`CollisionShape::full_cube`].
    pub fn union(boxes: impl IntoIterator<Item = Aabb>) -> Self {
        let boxes: Vec<Aabb> = boxes.into_iter().filter(|b| !b.is_empty()).collect();
        match boxes.as_slice() {
            [] => Self::empty(),
            [only] if *only == Aabb::UNIT => Self::full_cube(),
            _ => Self {
                kind: ShapeKind::Boxes(boxes.into()),
                offset: DVec3::ZERO,
            },
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self.kind, ShapeKind::Empty)
    }

    /// True when the shape is provably one full block, which lets callers
    /// use a plain box/box test instead of walking sub-boxes.
    #[inline]
    pub fn is_full_cube(&self) -> bool {
        matches!(self.kind, ShapeKind::FullCube)
    }

    /// Translation applied to the local geometry.
    #[inline]
    pub fn translation(&self) -> DVec3 {
        self.offset
    }

    pub fn offset(&self, delta: DVec3) -> Self {
        Self {
            kind: self.kind.clone(),
            offset: self.offset + delta,
        }
    }

    /// Translates a block-local shape to the block at `pos`.
    #[inline]
    pub fn at_block(&self, pos: IVec3) -> Self {
        self.offset(pos.as_dvec3())
    }

    /// The boxes making up the shape, translated.
    pub fn boxes(&self) -> impl Iterator<Item = Aabb> + '_ {
        let local: &[Aabb] = match &self.kind {
            ShapeKind::Empty => &[],
            ShapeKind::FullCube => std::slice::from_ref(&UNIT_CUBE),
            ShapeKind::Boxes(boxes) => boxes,
        };
        local.iter().map(move |b| b.offset(self.offset))
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        self.boxes().reduce(|acc, b| acc.union(&b))
    }

    /// True if the occupied volume of this shape and `aabb` overlap with
    /// non-zero volume.
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        match &self.kind {
            ShapeKind::Empty => false,
            ShapeKind::FullCube => UNIT_CUBE.offset(self.offset).intersects(aabb),
            ShapeKind::Boxes(_) => self.boxes().any(|b| b.intersects(aabb)),
        }
    }

    /// Limits vertical motion `dy` of `moving` against every box of the shape.
    pub fn clip_y_motion(&self, moving: &Aabb, dy: f64) -> f64 {
        self.boxes().fold(dy, |dy, b| b.clip_y_motion(moving, dy))
    }
}

static UNIT_CUBE: Aabb = Aabb::UNIT;
