//! Consistency violations reported by the tracker.

use super::cell::CellPos;
use super::listener::ListenerKey;
use crate::EntityId;
use thiserror::Error;

/// A hook was called in a way that contradicts the tracker's index.
///
/// The index is left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("{entity} added at cell {cell} but is already tracked at {existing}")]
    AlreadyTracked {
        entity: EntityId,
        cell: CellPos,
        existing: CellPos,
    },

    #[error("{entity} expected at cell {expected} but {}", registration(.actual))]
    CellMismatch {
        entity: EntityId,
        expected: CellPos,
        actual: Option<CellPos>,
    },

    #[error("{listener} of {entity} installed again at {cell}, already anchored at {anchor}")]
    ListenerAlreadyInstalled {
        entity: EntityId,
        listener: ListenerKey,
        cell: CellPos,
        anchor: CellPos,
    },

    #[error("{listener} of {entity} has no recorded subscription (entity at {cell})")]
    ListenerNotInstalled {
        entity: EntityId,
        listener: ListenerKey,
        cell: CellPos,
    },

    #[error("{entity} finished a teleport that never started; {}", registration(.tracked))]
    NoTeleportInProgress {
        entity: EntityId,
        tracked: Option<CellPos>,
    },
}

fn registration(cell: &Option<CellPos>) -> String {
    match cell {
        Some(cell) => format!("it is tracked at {cell}"),
        None => "it is not tracked".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_both_cells() {
        let err = TrackerError::CellMismatch {
            entity: EntityId::from_raw(3),
            expected: CellPos::new(0, 0, 0),
            actual: Some(CellPos::new(1, 0, 0)),
        };
        assert_eq!(
            err.to_string(),
            "entity#3 expected at cell [0, 0, 0] but it is tracked at [1, 0, 0]"
        );

        let err = TrackerError::CellMismatch {
            entity: EntityId::from_raw(3),
            expected: CellPos::new(0, 0, 0),
            actual: None,
        };
        assert!(err.to_string().ends_with("it is not tracked"));
    }
}
