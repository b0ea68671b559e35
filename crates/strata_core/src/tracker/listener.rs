//! Range listeners and the shared handles the tracker keeps to them.

use crate::EntityId;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Subscriber to entities entering and leaving a cube of cells around its
/// owner.
pub trait NearbyEntityListener {
    /// Radius of the subscribed cube in cells. Zero disables listening.
    fn cell_range(&self) -> u32;

    fn on_entity_entered_range(&mut self, entity: EntityId);

    fn on_entity_left_range(&mut self, entity: EntityId);

    /// Called once after an install or a move has delivered every "entered"
    /// notification it caused.
    fn on_initial_population_complete(&mut self) {}

    /// Listeners answering true also hear about movement that stays inside
    /// a cell. Read once at install time.
    fn wants_exact_movement(&self) -> bool {
        false
    }

    fn on_entity_moved_in_range(&mut self, _entity: EntityId) {}
}

/// Shared handle to a listener, compared by identity.
#[derive(Clone)]
pub struct ListenerHandle(Rc<RefCell<dyn NearbyEntityListener>>);

impl ListenerHandle {
    /// Wraps a listener the caller keeps typed access to.
    pub fn new<L: NearbyEntityListener + 'static>(listener: Rc<RefCell<L>>) -> Self {
        Self(listener)
    }

    #[inline]
    pub fn key(&self) -> ListenerKey {
        ListenerKey(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub fn cell_range(&self) -> u32 {
        self.0.borrow().cell_range()
    }

    pub fn wants_exact_movement(&self) -> bool {
        self.0.borrow().wants_exact_movement()
    }

    /// Panics if the listener is already borrowed, which only happens when
    /// a listener calls back into the tracker from a notification.
    pub(crate) fn listener(&self) -> RefMut<'_, dyn NearbyEntityListener + 'static> {
        self.0.borrow_mut()
    }
}

impl PartialEq for ListenerHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ListenerHandle {}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListenerHandle").field(&self.key()).finish()
    }
}

/// Identity of a listener handle: the address of its shared allocation.
/// Stable for as long as any clone of the handle is alive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerKey(usize);

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener@{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl NearbyEntityListener for Silent {
        fn cell_range(&self) -> u32 {
            1
        }
        fn on_entity_entered_range(&mut self, _entity: EntityId) {}
        fn on_entity_left_range(&mut self, _entity: EntityId) {}
    }

    #[test]
    fn clones_share_identity() {
        let shared = Rc::new(RefCell::new(Silent));
        let a = ListenerHandle::new(shared.clone());
        let b = ListenerHandle::new(shared);
        let other = ListenerHandle::new(Rc::new(RefCell::new(Silent)));

        assert_eq!(a, b.clone());
        assert_eq!(a.key(), b.key());
        assert_ne!(a, other);
        assert!(!a.wants_exact_movement());
    }
}
