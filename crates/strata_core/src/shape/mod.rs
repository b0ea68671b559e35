//! Geometry primitives shared by the sweeper, the entity queries and the
//! world border fast path.
//!
//! Only the minimal shape algebra needed for broad-phase decisions lives
//! here: strict box overlap, translation and a single-axis motion clip.

mod aabb;
mod collision_shape;

pub use aabb::Aabb;
pub use collision_shape::CollisionShape;
