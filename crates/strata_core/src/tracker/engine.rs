//! The tracker itself: entity and listener registration per cell.

use super::cell::{CellBox, CellPos};
use super::error::TrackerError;
use super::listener::{ListenerHandle, ListenerKey};
use crate::math::DVec3;
use crate::world::VerticalBounds;
use crate::EntityId;
use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use strata_metrics::Counter;

/// What the tracker needs to know about an entity when a hook fires.
pub trait TrackedEntity {
    fn entity_id(&self) -> EntityId;

    /// Current position; only read when a teleport completes.
    fn position(&self) -> DVec3;

    /// The entity's range listener, if it has one.
    fn nearby_listener(&self) -> Option<ListenerHandle> {
        None
    }
}

#[derive(Default)]
struct TrackedCell {
    entities: IndexSet<EntityId>,
    listeners: IndexMap<ListenerKey, ListenerHandle>,
    exact_listeners: IndexSet<ListenerKey>,
}

impl TrackedCell {
    fn is_unused(&self) -> bool {
        self.entities.is_empty() && self.listeners.is_empty()
    }
}

struct ListenerRecord {
    handle: ListenerHandle,
    anchor: CellPos,
    range: u32,
    exact: bool,
    cells: Vec<CellPos>,
}

/// Notification and structure counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerStats {
    pub tracked_entities: usize,
    pub cells: usize,
    pub listeners: usize,
    /// Zero unless built with the `metrics` feature.
    pub entered_notifications: u64,
    pub left_notifications: u64,
    pub moved_notifications: u64,
}

/// Index of entities and range listeners by 16³ cell.
///
/// Driven by the owning world through the `on_*` hooks. Every hook checks
/// its preconditions before touching the index, so an `Err` leaves the
/// tracker exactly as it was.
pub struct EntityTracker {
    min_section: i32,
    max_section: i32,
    cells: HashMap<u64, TrackedCell>,
    entities: HashMap<EntityId, CellPos>,
    listeners: HashMap<ListenerKey, ListenerRecord>,
    teleporting: HashSet<EntityId>,
    counter: Counter,
}

impl EntityTracker {
    /// Listener cubes are clamped vertically to the sections covering `bounds`.
    pub fn new(bounds: VerticalBounds) -> Self {
        Self {
            min_section: bounds.min_section(),
            max_section: bounds.max_section(),
            cells: HashMap::new(),
            entities: HashMap::new(),
            listeners: HashMap::new(),
            teleporting: HashSet::new(),
            counter: Counter::new(),
        }
    }

    // ------------------------------------------------------------------
    // Hooks
    // ------------------------------------------------------------------

    /// Adding an entity that is between the two halves of a teleport
    /// cancels the teleport.
    pub fn on_entity_added(
        &mut self,
        cell: CellPos,
        entity: &dyn TrackedEntity,
    ) -> Result<(), TrackerError> {
        let id = entity.entity_id();
        if let Some(&existing) = self.entities.get(&id) {
            return Err(violation(TrackerError::AlreadyTracked {
                entity: id,
                cell,
                existing,
            }));
        }
        let listener = entity.nearby_listener().filter(|l| l.cell_range() > 0);
        if let Some(handle) = &listener {
            if let Some(record) = self.listeners.get(&handle.key()) {
                return Err(violation(TrackerError::ListenerAlreadyInstalled {
                    entity: id,
                    listener: handle.key(),
                    cell,
                    anchor: record.anchor,
                }));
            }
        }

        tracing::trace!(entity = %id, %cell, "entity added");
        self.teleporting.remove(&id);
        self.insert_entity(cell, id);
        if let Some(handle) = listener {
            self.install_listener(cell, handle);
        }
        Ok(())
    }

    pub fn on_entity_removed(
        &mut self,
        cell: CellPos,
        entity: &dyn TrackedEntity,
    ) -> Result<(), TrackerError> {
        let id = entity.entity_id();
        self.expect_tracked_at(id, cell)?;
        let listener = self.installed_listener(id, cell, entity)?;

        tracing::trace!(entity = %id, %cell, "entity removed");
        self.erase_entity(cell, id);
        if let Some(key) = listener {
            self.uninstall_listener(key);
        }
        Ok(())
    }

    /// Moves an entity between cells. `old` must be the cell it was last
    /// added at. `old == new` is allowed and behaves as remove-then-add.
    pub fn on_entity_moved(
        &mut self,
        old: CellPos,
        new: CellPos,
        entity: &dyn TrackedEntity,
    ) -> Result<(), TrackerError> {
        let id = entity.entity_id();
        self.expect_tracked_at(id, old)?;
        let listener = self.installed_listener(id, old, entity)?;

        tracing::trace!(entity = %id, from = %old, to = %new, "entity moved");
        self.erase_entity(old, id);
        self.insert_entity(new, id);
        if let Some(key) = listener {
            self.move_listener(key, new);
        }
        Ok(())
    }

    /// Notifies exact-movement listeners of the entity's cell. Untracked
    /// entities are ignored.
    pub fn on_entity_moved_within_cell(&mut self, entity: EntityId) {
        let Some(cell) = self.entities.get(&entity) else {
            return;
        };
        let Some(tracked) = self.cells.get(&cell.key()) else {
            return;
        };
        if tracked.exact_listeners.is_empty() {
            return;
        }
        for key in &tracked.exact_listeners {
            if let Some(handle) = tracked.listeners.get(key) {
                handle.listener().on_entity_moved_in_range(entity);
            }
        }
        self.counter.increment("moved", tracked.exact_listeners.len() as u64);
    }

    /// First half of a teleport: the entity leaves its recorded cell.
    pub fn before_teleport(&mut self, entity: &dyn TrackedEntity) -> Result<(), TrackerError> {
        let id = entity.entity_id();
        let Some(&cell) = self.entities.get(&id) else {
            return Err(violation(TrackerError::CellMismatch {
                entity: id,
                expected: CellPos::from_position(entity.position()),
                actual: None,
            }));
        };
        let listener = self.installed_listener(id, cell, entity)?;

        tracing::debug!(entity = %id, from = %cell, "teleport started");
        self.erase_entity(cell, id);
        if let Some(key) = listener {
            self.uninstall_listener(key);
        }
        self.teleporting.insert(id);
        Ok(())
    }

    /// Second half of a teleport: the entity is added at the cell of its
    /// current position.
    pub fn after_teleport(&mut self, entity: &dyn TrackedEntity) -> Result<(), TrackerError> {
        let id = entity.entity_id();
        if !self.teleporting.contains(&id) {
            return Err(violation(TrackerError::NoTeleportInProgress {
                entity: id,
                tracked: self.entities.get(&id).copied(),
            }));
        }
        let cell = CellPos::from_position(entity.position());
        self.on_entity_added(cell, entity)?;
        tracing::debug!(entity = %id, to = %cell, "teleport finished");
        Ok(())
    }

    /// Drops a pending teleport of an entity that will never be re-added,
    /// such as one despawned between the two halves. Returns whether a
    /// teleport was pending.
    pub fn cancel_teleport(&mut self, entity: EntityId) -> bool {
        let pending = self.teleporting.remove(&entity);
        if pending {
            tracing::debug!(%entity, "teleport cancelled");
        }
        pending
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn is_teleporting(&self, entity: EntityId) -> bool {
        self.teleporting.contains(&entity)
    }

    pub fn tracked_cell(&self, entity: EntityId) -> Option<CellPos> {
        self.entities.get(&entity).copied()
    }

    pub fn tracked_entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of cells holding at least one entity or subscription.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Entities in `cell`, in insertion order.
    pub fn entities_in(&self, cell: CellPos) -> impl Iterator<Item = EntityId> + '_ {
        self.cells
            .get(&cell.key())
            .into_iter()
            .flat_map(|tracked| tracked.entities.iter().copied())
    }

    pub fn listener_count_in(&self, cell: CellPos) -> usize {
        self.cells.get(&cell.key()).map_or(0, |tracked| tracked.listeners.len())
    }

    pub fn is_listening(&self, listener: &ListenerHandle) -> bool {
        self.listeners.contains_key(&listener.key())
    }

    /// The recorded subscription of an installed listener.
    pub fn listener_cells(&self, listener: &ListenerHandle) -> Option<&[CellPos]> {
        self.listeners.get(&listener.key()).map(|record| record.cells.as_slice())
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            tracked_entities: self.entities.len(),
            cells: self.cells.len(),
            listeners: self.listeners.len(),
            entered_notifications: self.counter.get("entered"),
            left_notifications: self.counter.get("left"),
            moved_notifications: self.counter.get("moved"),
        }
    }

    // ------------------------------------------------------------------
    // Checks
    // ------------------------------------------------------------------

    fn expect_tracked_at(&self, entity: EntityId, expected: CellPos) -> Result<(), TrackerError> {
        match self.entities.get(&entity) {
            Some(&actual) if actual == expected => Ok(()),
            actual => Err(violation(TrackerError::CellMismatch {
                entity,
                expected,
                actual: actual.copied(),
            })),
        }
    }

    /// The key of the entity's installed listener, if it participates.
    ///
    /// A listener with a recorded subscription always participates, so a
    /// range change after install cannot leak cells. A listener with a
    /// positive range and no record is a violation.
    fn installed_listener(
        &self,
        id: EntityId,
        cell: CellPos,
        entity: &dyn TrackedEntity,
    ) -> Result<Option<ListenerKey>, TrackerError> {
        let Some(handle) = entity.nearby_listener() else {
            return Ok(None);
        };
        let key = handle.key();
        if self.listeners.contains_key(&key) {
            return Ok(Some(key));
        }
        if handle.cell_range() == 0 {
            return Ok(None);
        }
        Err(violation(TrackerError::ListenerNotInstalled {
            entity: id,
            listener: key,
            cell,
        }))
    }

    // ------------------------------------------------------------------
    // Mutation (preconditions already checked)
    // ------------------------------------------------------------------

    fn insert_entity(&mut self, cell: CellPos, id: EntityId) {
        self.entities.insert(id, cell);
        let tracked = self.cells.entry(cell.key()).or_default();
        for handle in tracked.listeners.values() {
            handle.listener().on_entity_entered_range(id);
        }
        self.counter.increment("entered", tracked.listeners.len() as u64);
        tracked.entities.insert(id);
    }

    fn erase_entity(&mut self, cell: CellPos, id: EntityId) {
        self.entities.remove(&id);
        let key = cell.key();
        let Some(tracked) = self.cells.get_mut(&key) else {
            return;
        };
        if tracked.entities.shift_remove(&id) {
            for handle in tracked.listeners.values() {
                handle.listener().on_entity_left_range(id);
            }
            self.counter.increment("left", tracked.listeners.len() as u64);
        }
        if tracked.is_unused() {
            self.cells.remove(&key);
        }
    }

    fn listener_cube(&self, anchor: CellPos, range: u32) -> CellBox {
        CellBox::around(anchor, range, self.min_section, self.max_section)
    }

    fn install_listener(&mut self, anchor: CellPos, handle: ListenerHandle) {
        let range = handle.cell_range();
        let exact = handle.wants_exact_movement();
        let cube = self.listener_cube(anchor, range);
        let cells: Vec<CellPos> = cube.iter().collect();
        for &pos in &cells {
            self.subscribe(pos, &handle, exact);
        }
        handle.listener().on_initial_population_complete();
        tracing::debug!(
            listener = %handle.key(),
            %anchor,
            range,
            cells = cells.len(),
            "listener installed"
        );

        self.listeners.insert(
            handle.key(),
            ListenerRecord {
                handle,
                anchor,
                range,
                exact,
                cells,
            },
        );
    }

    fn uninstall_listener(&mut self, key: ListenerKey) {
        let Some(record) = self.listeners.remove(&key) else {
            return;
        };
        for &pos in &record.cells {
            self.unsubscribe(pos, &record.handle);
        }
        tracing::debug!(listener = %key, anchor = %record.anchor, "listener uninstalled");
    }

    /// Re-anchors a listener, touching only the cells that differ between
    /// the old and new cubes.
    fn move_listener(&mut self, key: ListenerKey, anchor: CellPos) {
        let Some(record) = self.listeners.get(&key) else {
            return;
        };
        let (handle, range, exact) = (record.handle.clone(), record.range, record.exact);
        let before = self.listener_cube(record.anchor, range);
        let after = self.listener_cube(anchor, range);

        for pos in before.union(&after).iter() {
            match (before.contains(pos), after.contains(pos)) {
                (true, false) => self.unsubscribe(pos, &handle),
                (false, true) => self.subscribe(pos, &handle, exact),
                _ => {}
            }
        }
        handle.listener().on_initial_population_complete();

        if let Some(record) = self.listeners.get_mut(&key) {
            record.anchor = anchor;
            record.cells = after.iter().collect();
        }
    }

    fn subscribe(&mut self, pos: CellPos, handle: &ListenerHandle, exact: bool) {
        let tracked = self.cells.entry(pos.key()).or_default();
        {
            let mut listener = handle.listener();
            for &entity in &tracked.entities {
                listener.on_entity_entered_range(entity);
            }
        }
        self.counter.increment("entered", tracked.entities.len() as u64);
        tracked.listeners.insert(handle.key(), handle.clone());
        if exact {
            tracked.exact_listeners.insert(handle.key());
        }
    }

    fn unsubscribe(&mut self, pos: CellPos, handle: &ListenerHandle) {
        let key = pos.key();
        let Some(tracked) = self.cells.get_mut(&key) else {
            tracing::error!(
                listener = %handle.key(),
                cell = %pos,
                "recorded subscription has no cell"
            );
            debug_assert!(false, "recorded subscription has no cell");
            return;
        };
        if tracked.listeners.shift_remove(&handle.key()).is_some() {
            tracked.exact_listeners.shift_remove(&handle.key());
            let mut listener = handle.listener();
            for &entity in &tracked.entities {
                listener.on_entity_left_range(entity);
            }
            self.counter.increment("left", tracked.entities.len() as u64);
        }
        if tracked.is_unused() {
            self.cells.remove(&key);
        }
    }
}

impl Default for EntityTracker {
    fn default() -> Self {
        Self::new(VerticalBounds::default())
    }
}

fn violation(err: TrackerError) -> TrackerError {
    tracing::error!(%err, "entity tracker consistency violation");
    err
}
