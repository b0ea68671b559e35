use crate::math::{DVec3, IVec3, EPSILON};

/// Axis-aligned box in world (or block-local) coordinates.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components; the
///   constructors normalise swapped corners instead of rejecting them.
/// - Values are `f64`; bounds may be infinite (the world border shape uses
///   unbounded slabs).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    min: DVec3,
    max: DVec3,
}

impl Aabb {
    /// `[0, 1]³`.
    pub const UNIT: Aabb = Aabb {
        min: DVec3::ZERO,
        max: DVec3::ONE,
    };

    /// Builds a box from two opposite corners in any order.
    #[inline]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Builds a box from explicit per-axis bounds.
    #[inline]
    pub fn from_bounds(
        min_x: f64,
        min_y: f64,
        min_z: f64,
        max_x: f64,
        max_y: f64,
        max_z: f64,
    ) -> Self {
        Self::new(DVec3::new(min_x, min_y, min_z), DVec3::new(max_x, max_y, max_z))
    }

    /// The unit cube occupying block `pos`.
    #[inline]
    pub fn block(pos: IVec3) -> Self {
        let min = pos.as_dvec3();
        Self {
            min,
            max: min + DVec3::ONE,
        }
    }

    #[inline]
    pub fn min(&self) -> DVec3 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> DVec3 {
        self.max
    }

    /// Per-axis side lengths.
    #[inline]
    pub fn lengths(&self) -> DVec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn average_side_length(&self) -> f64 {
        let l = self.lengths();
        (l.x + l.y + l.z) / 3.0
    }

    /// A box is degenerate for collision purposes once its average side
    /// length drops to [`EPSILON`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.average_side_length() <= EPSILON
    }

    /// Grows every face outwards by `margin`. Negative margins shrink; a box
    /// shrunk past zero thickness is re-normalised.
    #[inline]
    pub fn expand(&self, margin: f64) -> Self {
        let m = DVec3::splat(margin);
        Self::new(self.min - m, self.max + m)
    }

    /// Shrinks every face inwards by `margin`.
    #[inline]
    pub fn contract(&self, margin: f64) -> Self {
        self.expand(-margin)
    }

    #[inline]
    pub fn offset(&self, delta: DVec3) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }

    /// Strict overlap test: boxes that only touch on a face do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Strict overlap against the unit cube at `pos`, without building it.
    #[inline]
    pub fn intersects_block(&self, pos: IVec3) -> bool {
        let x = f64::from(pos.x);
        let y = f64::from(pos.y);
        let z = f64::from(pos.z);
        self.min.x < x + 1.0
            && self.max.x > x
            && self.min.y < y + 1.0
            && self.max.y > y
            && self.min.z < z + 1.0
            && self.max.z > z
    }

    /// Returns the smallest box containing both.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Limits a vertical motion `dy` of `moving` so that it stops at this box.
    ///
    /// Only boxes overlapping `moving` on the X and Z axes can block it; the
    /// result is `dy` unchanged when this box is not in the way.
    pub fn clip_y_motion(&self, moving: &Self, dy: f64) -> f64 {
        let overlaps_xz = moving.max.x > self.min.x
            && moving.min.x < self.max.x
            && moving.max.z > self.min.z
            && moving.min.z < self.max.z;
        if !overlaps_xz {
            return dy;
        }
        if dy > 0.0 && moving.max.y <= self.min.y {
            let gap = self.min.y - moving.max.y;
            if gap < dy {
                return gap;
            }
        } else if dy < 0.0 && moving.min.y >= self.max.y {
            let gap = self.max.y - moving.min.y;
            if gap > dy {
                return gap;
            }
        }
        dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_normalises_corners() {
        let b = Aabb::from_bounds(1.0, 2.0, 3.0, 0.0, 0.0, 0.0);
        assert_eq!(b.min(), DVec3::new(0.0, 0.0, 0.0));
        assert_eq!(b.max(), DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn touching_faces_do_not_intersect() {
        let a = Aabb::from_bounds(0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        let b = Aabb::from_bounds(1.0, 0.0, 0.0, 2.0, 1.0, 1.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&a));
        assert!(!a.intersects_block(IVec3::new(1, 0, 0)));
        assert!(a.intersects_block(IVec3::ZERO));
    }

    #[test]
    fn emptiness_uses_average_side() {
        assert!(Aabb::from_bounds(0.0, 0.0, 0.0, 0.0, 0.0, 0.0).is_empty());
        // one long side is enough to be non-empty
        assert!(!Aabb::from_bounds(0.0, 0.0, 0.0, 1.0, 0.0, 0.0).is_empty());
    }

    #[test]
    fn contract_past_zero_stays_normalised() {
        let b = Aabb::from_bounds(0.0, 0.0, 0.0, 1.0e-8, 1.0, 1.0).contract(1.0e-7);
        assert!(b.min().x <= b.max().x);
    }

    #[test]
    fn clip_y_motion_stops_on_top_face() {
        let floor = Aabb::block(IVec3::ZERO);
        let body = Aabb::from_bounds(0.2, 1.5, 0.2, 0.8, 3.3, 0.8);
        assert_eq!(floor.clip_y_motion(&body, -2.0), -0.5);
        assert_eq!(floor.clip_y_motion(&body, -0.25), -0.25);
        let beside = body.offset(DVec3::new(2.0, 0.0, 0.0));
        assert_eq!(floor.clip_y_motion(&beside, -2.0), -2.0);
    }
}
