//! Cell coordinates, packed keys and cubes of cells.

use crate::math::{block_coord, section_coord, DVec3, I64Vec3, IVec3};
use std::fmt;

const XZ_BITS: u32 = 22;
const Y_BITS: u32 = 20;
const XZ_MASK: u64 = (1 << XZ_BITS) - 1;
const Y_MASK: u64 = (1 << Y_BITS) - 1;
const X_SHIFT: u32 = Y_BITS + XZ_BITS;
const Z_SHIFT: u32 = Y_BITS;

/// Coordinates of one 16³ cell of world space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CellPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing the block at `pos`.
    pub const fn from_block(pos: IVec3) -> Self {
        Self::new(section_coord(pos.x), section_coord(pos.y), section_coord(pos.z))
    }

    /// Cell containing the world position `pos`.
    pub fn from_position(pos: DVec3) -> Self {
        Self::new(
            section_coord(block_coord(pos.x)),
            section_coord(block_coord(pos.y)),
            section_coord(block_coord(pos.z)),
        )
    }

    /// Packs the coordinates into one key: 22 bits of X, 22 bits of Z and
    /// 20 bits of Y, each two's complement.
    ///
    /// Distinct for X and Z in `[-2^21, 2^21)` and Y in `[-2^19, 2^19)`.
    #[inline]
    pub const fn key(self) -> u64 {
        ((self.x as u64 & XZ_MASK) << X_SHIFT)
            | ((self.z as u64 & XZ_MASK) << Z_SHIFT)
            | (self.y as u64 & Y_MASK)
    }

    #[inline]
    pub const fn from_key(key: u64) -> Self {
        let raw = key as i64;
        Self {
            x: (raw >> X_SHIFT) as i32,
            z: ((raw << XZ_BITS) >> (XZ_BITS + Y_BITS)) as i32,
            y: ((raw << (XZ_BITS + XZ_BITS)) >> (XZ_BITS + XZ_BITS)) as i32,
        }
    }

    #[inline]
    fn as_ivec3(self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }
}

impl fmt::Display for CellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Inclusive cube (or, after vertical clamping, cuboid) of cells. May be
/// empty when clamping removes every row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CellBox {
    min: IVec3,
    max: IVec3,
}

impl CellBox {
    /// The `(2r + 1)³` cells centred on `center`, with the vertical axis
    /// limited to sections `min_section..=max_section`. Bounds saturate at
    /// the `i32` range.
    pub fn around(center: CellPos, radius: u32, min_section: i32, max_section: i32) -> Self {
        let r = radius.min(i32::MAX as u32) as i32;
        let c = center.as_ivec3();
        let mut min = c.saturating_sub(IVec3::splat(r));
        let mut max = c.saturating_add(IVec3::splat(r));
        min.y = min.y.max(min_section);
        max.y = max.y.min(max_section);
        Self { min, max }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    #[inline]
    pub fn contains(&self, pos: CellPos) -> bool {
        let p = pos.as_ivec3();
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Number of cells, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let extent = (self.max.as_i64vec3() - self.min.as_i64vec3() + I64Vec3::ONE).as_u64vec3();
        let cells = extent.x.saturating_mul(extent.y).saturating_mul(extent.z);
        usize::try_from(cells).unwrap_or(usize::MAX)
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Self {
                min: self.min.min(other.min),
                max: self.max.max(other.max),
            },
        }
    }

    /// Cells in X, then Y, then Z nesting (Z innermost).
    pub fn iter(&self) -> impl Iterator<Item = CellPos> {
        let (min, max) = (self.min, self.max);
        let empty = self.is_empty();
        (min.x..=max.x)
            .flat_map(move |x| {
                (min.y..=max.y)
                    .flat_map(move |y| (min.z..=max.z).map(move |z| CellPos::new(x, y, z)))
            })
            .filter(move |_| !empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_round_trips_extremes() {
        for pos in [
            CellPos::new(0, 0, 0),
            CellPos::new(-1, -1, -1),
            CellPos::new((1 << 21) - 1, (1 << 19) - 1, -(1 << 21)),
            CellPos::new(-(1 << 21), -(1 << 19), (1 << 21) - 1),
        ] {
            assert_eq!(CellPos::from_key(pos.key()), pos);
        }
    }

    #[test]
    fn neighbouring_cells_have_distinct_keys() {
        let origin = CellPos::new(0, 0, 0).key();
        assert_ne!(origin, CellPos::new(1, 0, 0).key());
        assert_ne!(origin, CellPos::new(0, 1, 0).key());
        assert_ne!(origin, CellPos::new(0, 0, 1).key());
        assert_ne!(CellPos::new(-1, 0, 0).key(), CellPos::new(0, 0, -1).key());
    }

    #[test]
    fn cell_of_negative_positions() {
        assert_eq!(CellPos::from_position(DVec3::new(-0.1, 15.9, 16.0)), CellPos::new(-1, 0, 1));
        assert_eq!(CellPos::from_block(IVec3::new(-17, 0, 31)), CellPos::new(-2, 0, 1));
    }

    #[test]
    fn cube_is_clamped_vertically() {
        let cube = CellBox::around(CellPos::new(0, 0, 0), 2, 0, 15);
        assert_eq!(cube.len(), 5 * 3 * 5);
        assert_eq!(cube.iter().count(), cube.len());
        assert!(!cube.contains(CellPos::new(0, -1, 0)));

        let above_world = CellBox::around(CellPos::new(0, 40, 0), 1, 0, 15);
        assert!(above_world.is_empty());
        assert_eq!(above_world.iter().count(), 0);
    }

    #[test]
    fn cube_at_the_edge_of_the_key_range_saturates() {
        let corner = CellPos::new(i32::MAX, 0, i32::MIN);
        let cube = CellBox::around(corner, 3, 0, 15);
        assert!(cube.contains(corner));
        assert_eq!(cube.len(), 4 * 4 * 4);

        let huge = CellBox::around(CellPos::new(0, 0, 0), u32::MAX, 0, 0);
        assert!(huge.contains(CellPos::new(i32::MIN, 0, i32::MAX)));
    }

    #[test]
    fn union_ignores_empty_boxes() {
        let a = CellBox::around(CellPos::new(0, 5, 0), 1, 0, 15);
        let empty = CellBox::around(CellPos::new(0, 40, 0), 1, 0, 15);
        assert_eq!(a.union(&empty), a);
        assert_eq!(empty.union(&a), a);
        let b = CellBox::around(CellPos::new(3, 5, 0), 1, 0, 15);
        assert_eq!(a.union(&b).len(), 6 * 3 * 3);
    }
}
