//! World-space math
//!
//! Re-exports glam with the constants and block/section conversions shared
//! by the sweeper and the tracker.

pub use glam::*;

/// Tolerance for box emptiness and for rounding box bounds to blocks.
pub const EPSILON: f64 = 1.0e-7;

/// Blocks per section edge.
pub const SECTION_SIZE: i32 = 16;

/// `log2(SECTION_SIZE)`.
pub const SECTION_SHIFT: u32 = 4;

/// Block coordinate containing the world coordinate `v`.
#[inline]
pub fn block_coord(v: f64) -> i32 {
    v.floor() as i32
}

/// Section coordinate containing block coordinate `block`.
#[inline]
pub const fn section_coord(block: i32) -> i32 {
    block >> SECTION_SHIFT
}

/// First block coordinate of section `section`.
#[inline]
pub const fn section_origin(section: i32) -> i32 {
    section << SECTION_SHIFT
}

/// Last block coordinate of section `section`.
#[inline]
pub const fn section_end(section: i32) -> i32 {
    section_origin(section) + SECTION_SIZE - 1
}

/// Position of block coordinate `block` inside its section.
#[inline]
pub const fn local_coord(block: i32) -> usize {
    (block & (SECTION_SIZE - 1)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_math_handles_negative_blocks() {
        assert_eq!(section_coord(-1), -1);
        assert_eq!(section_coord(-16), -1);
        assert_eq!(section_coord(-17), -2);
        assert_eq!(section_origin(-1), -16);
        assert_eq!(section_end(-1), -1);
        assert_eq!(local_coord(-1), 15);
        assert_eq!(local_coord(17), 1);
        assert_eq!(block_coord(-0.5), -1);
    }
}
