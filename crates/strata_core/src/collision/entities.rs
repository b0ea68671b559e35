//! Entity collision capability, kind allow-lists and the entity collision
//! sequence.

use crate::math::EPSILON;
use crate::shape::{Aabb, CollisionShape};
use crate::EntityId;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;

/// Registry name of an entity type, e.g. `"boat"`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKind(&'static str);

impl EntityKind {
    pub const BOAT: EntityKind = EntityKind("boat");
    pub const MINECART: EntityKind = EntityKind("minecart");
    pub const SHULKER: EntityKind = EntityKind("shulker");
    pub const STRIDER: EntityKind = EntityKind("strider");

    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An entity as seen by collision queries.
pub trait Collider {
    fn id(&self) -> EntityId;

    fn kind(&self) -> EntityKind;

    fn bounding_box(&self) -> Aabb;

    /// Box other entities collide with, for kinds that are solid to others
    /// (boats, shulkers).
    fn collision_box(&self) -> Option<Aabb> {
        None
    }

    /// Box this entity collides with when pushing against `other`.
    fn hard_collision_box(&self, _other: &dyn Collider) -> Option<Aabb> {
        None
    }

    /// Bottom of the entity's vehicle chain; the entity itself when it
    /// rides nothing.
    fn root_vehicle(&self) -> EntityId {
        self.id()
    }

    /// Riders never collide with their own vehicle chain.
    fn is_connected_through_vehicle(&self, other: &dyn Collider) -> bool {
        self.root_vehicle() == other.root_vehicle()
    }

    /// Whether the entity is deliberately moving down through one-way
    /// blocks (sneaking on scaffolding).
    fn is_descending(&self) -> bool {
        false
    }
}

/// Set of entity kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindGroup {
    kinds: HashSet<EntityKind>,
}

impl KindGroup {
    pub fn contains(&self, kind: EntityKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl FromIterator<EntityKind> for KindGroup {
    fn from_iter<I: IntoIterator<Item = EntityKind>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().collect(),
        }
    }
}

/// Allow-lists of the kinds that override the collision box hooks.
///
/// Entities of any other kind never produce a collision box and never
/// report a hard collision box, so queries may skip them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionGroups {
    pub collision_box: KindGroup,
    pub hard_collision_box: KindGroup,
}

static STANDARD: Lazy<CollisionGroups> = Lazy::new(|| CollisionGroups {
    collision_box: [EntityKind::BOAT, EntityKind::MINECART, EntityKind::SHULKER]
        .into_iter()
        .collect(),
    hard_collision_box: [EntityKind::BOAT, EntityKind::MINECART, EntityKind::STRIDER]
        .into_iter()
        .collect(),
});

impl CollisionGroups {
    /// Boats, minecarts and shulkers are solid to others; boats, minecarts
    /// and striders push against them.
    pub fn standard() -> &'static CollisionGroups {
        &STANDARD
    }
}

/// Read access to the entities of a world.
pub trait EntityView {
    /// Entities whose bounding box intersects `area`, except `except`.
    fn entities_overlapping(&self, except: Option<EntityId>, area: &Aabb) -> Vec<&dyn Collider>;

    /// Like [`entities_overlapping`](Self::entities_overlapping), restricted
    /// to kinds in `group`. Views with per-kind storage should override.
    fn entities_of_group(
        &self,
        except: Option<EntityId>,
        group: &KindGroup,
        area: &Aabb,
    ) -> Vec<&dyn Collider> {
        let mut found = self.entities_overlapping(except, area);
        found.retain(|entity| group.contains(entity.kind()));
        found
    }

    /// Allow-lists enabling the pre-filter; `None` gathers every entity.
    fn collision_groups(&self) -> Option<&CollisionGroups> {
        None
    }
}

/// Entities in `area` that can produce a collision box for `entity`.
pub fn entities_with_collision_box_for<'v, V>(
    view: &'v V,
    area: &Aabb,
    entity: Option<&dyn Collider>,
) -> Vec<&'v dyn Collider>
where
    V: EntityView + ?Sized,
{
    let except = entity.map(|e| e.id());
    match view.collision_groups() {
        Some(groups) if !entity.is_some_and(|e| groups.hard_collision_box.contains(e.kind())) => {
            view.entities_of_group(except, &groups.collision_box, area)
        }
        _ => view.entities_overlapping(except, area),
    }
}

/// Lazy sequence of entity collision boxes. See
/// [`entity_collisions`](super::entity_collisions).
pub struct EntityCollisions<'v, V: ?Sized, P> {
    view: &'v V,
    entity: Option<&'v dyn Collider>,
    area: Aabb,
    predicate: P,
    candidates: Option<std::vec::IntoIter<&'v dyn Collider>>,
    pending: Option<CollisionShape>,
}

impl<'v, V, P> EntityCollisions<'v, V, P>
where
    V: EntityView + ?Sized,
    P: FnMut(&dyn Collider) -> bool,
{
    /// Gathers around `aabb` grown by [`EPSILON`]. An empty `aabb` starts
    /// out exhausted.
    pub(crate) fn new(
        view: &'v V,
        entity: Option<&'v dyn Collider>,
        aabb: Aabb,
        predicate: P,
    ) -> Self {
        Self {
            view,
            entity,
            area: aabb.expand(EPSILON),
            predicate,
            candidates: aabb.is_empty().then(|| Vec::new().into_iter()),
            pending: None,
        }
    }
}

impl<V, P> Iterator for EntityCollisions<'_, V, P>
where
    V: EntityView + ?Sized,
    P: FnMut(&dyn Collider) -> bool,
{
    type Item = CollisionShape;

    fn next(&mut self) -> Option<CollisionShape> {
        if let Some(shape) = self.pending.take() {
            return Some(shape);
        }
        let (view, entity, area) = (self.view, self.entity, self.area);
        let candidates = self.candidates.get_or_insert_with(|| {
            entities_with_collision_box_for(view, &area, entity).into_iter()
        });

        for other in candidates.by_ref() {
            if !(self.predicate)(other) {
                continue;
            }
            if entity.is_some_and(|e| e.is_connected_through_vehicle(other)) {
                continue;
            }
            let own = other
                .collision_box()
                .filter(|b| area.intersects(b))
                .map(CollisionShape::cuboid);
            let hard = entity
                .and_then(|e| e.hard_collision_box(other))
                .filter(|b| area.intersects(b))
                .map(CollisionShape::cuboid);
            match (own, hard) {
                (Some(own), hard) => {
                    self.pending = hard;
                    return Some(own);
                }
                (None, Some(hard)) => return Some(hard),
                (None, None) => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_groups() {
        let groups = CollisionGroups::standard();
        assert!(groups.collision_box.contains(EntityKind::SHULKER));
        assert!(!groups.collision_box.contains(EntityKind::STRIDER));
        assert!(groups.hard_collision_box.contains(EntityKind::STRIDER));
        assert!(!groups.hard_collision_box.contains(EntityKind::new("zombie")));
        assert_eq!(groups.collision_box.len(), 3);
    }
}
