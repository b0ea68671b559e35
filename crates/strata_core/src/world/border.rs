use crate::shape::{Aabb, CollisionShape};

/// Square world border centred on `(center_x, center_z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBorder {
    center_x: f64,
    center_z: f64,
    size: f64,
}

impl WorldBorder {
    pub const DEFAULT_SIZE: f64 = 6.0e7;

    pub fn new(center_x: f64, center_z: f64, size: f64) -> Self {
        Self {
            center_x,
            center_z,
            size: size.abs(),
        }
    }

    #[inline]
    pub fn bound_west(&self) -> f64 {
        self.center_x - self.size / 2.0
    }

    #[inline]
    pub fn bound_east(&self) -> f64 {
        self.center_x + self.size / 2.0
    }

    #[inline]
    pub fn bound_north(&self) -> f64 {
        self.center_z - self.size / 2.0
    }

    #[inline]
    pub fn bound_south(&self) -> f64 {
        self.center_z + self.size / 2.0
    }

    /// Fast containment check that avoids building the border shape.
    ///
    /// The bounds are widened to whole blocks; both corners must lie inside,
    /// min-inclusive and max-exclusive, on X and Z.
    pub fn fully_contains(&self, aabb: &Aabb) -> bool {
        let min_x = self.bound_west().floor();
        let min_z = self.bound_north().floor();
        let max_x = self.bound_east().ceil();
        let max_z = self.bound_south().ceil();

        let (lo, hi) = (aabb.min(), aabb.max());
        lo.x >= min_x
            && lo.x < max_x
            && lo.z >= min_z
            && lo.z < max_z
            && hi.x >= min_x
            && hi.x < max_x
            && hi.z >= min_z
            && hi.z < max_z
    }

    /// The solid region outside the border: four unbounded slabs.
    pub fn as_shape(&self) -> CollisionShape {
        let (w, e) = (self.bound_west(), self.bound_east());
        let (n, s) = (self.bound_north(), self.bound_south());
        let inf = f64::INFINITY;
        CollisionShape::union([
            Aabb::from_bounds(-inf, -inf, -inf, w, inf, inf),
            Aabb::from_bounds(e, -inf, -inf, inf, inf, inf),
            Aabb::from_bounds(w, -inf, -inf, e, inf, n),
            Aabb::from_bounds(w, -inf, s, e, inf, inf),
        ])
    }
}

impl Default for WorldBorder {
    fn default() -> Self {
        Self::new(0.0, 0.0, Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_follow_center_and_size() {
        let border = WorldBorder::new(10.0, -4.0, 20.0);
        assert_eq!(border.bound_west(), 0.0);
        assert_eq!(border.bound_east(), 20.0);
        assert_eq!(border.bound_north(), -14.0);
        assert_eq!(border.bound_south(), 6.0);
    }

    #[test]
    fn fully_contains_is_max_exclusive() {
        let border = WorldBorder::new(0.0, 0.0, 20.0);
        assert!(border.fully_contains(&Aabb::from_bounds(-10.0, 0.0, -1.0, 9.5, 2.0, 1.0)));
        assert!(!border.fully_contains(&Aabb::from_bounds(-10.0, 0.0, -1.0, 10.0, 2.0, 1.0)));
        assert!(!border.fully_contains(&Aabb::from_bounds(-10.5, 0.0, -1.0, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn shape_covers_only_the_outside() {
        let border = WorldBorder::new(0.0, 0.0, 20.0);
        let shape = border.as_shape();
        assert!(!shape.intersects(&Aabb::from_bounds(-9.0, 0.0, -9.0, 9.0, 2.0, 9.0)));
        assert!(shape.intersects(&Aabb::from_bounds(9.5, 0.0, 0.0, 10.5, 2.0, 1.0)));
        assert!(shape.intersects(&Aabb::from_bounds(0.0, 0.0, -10.5, 1.0, 2.0, -9.5)));
    }
}
