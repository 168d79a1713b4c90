//! Undo/redo journal for paint edits.
//!
//! The grid itself offers no history; the painter captures before/after
//! deltas for every edit and replays them through the grid's normal
//! mutation surface. One journal entry is one atomic group: a single
//! click is a group of one, a fill or clear is one group covering the
//! whole operation.

use bevy::prelude::*;

use crate::palette::TilePrototype;

/// One cell's before/after delta. `None` means the cell was (or becomes)
/// unoccupied.
#[derive(Debug, Clone)]
pub struct CellEdit {
    pub cell: IVec3,
    pub before: Option<TilePrototype>,
    pub after: Option<TilePrototype>,
}

/// Edits applied together as one undo step.
pub type EditGroup = Vec<CellEdit>;

#[derive(Resource, Debug)]
pub struct EditJournal {
    undo: Vec<EditGroup>,
    redo: Vec<EditGroup>,
    capacity: usize,
}

impl Default for EditJournal {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl EditJournal {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Record a freshly applied edit group. Invalidates the redo stack.
    pub fn push(&mut self, group: EditGroup) {
        if group.is_empty() {
            return;
        }
        self.redo.clear();
        self.undo.push(group);
        if self.undo.len() > self.capacity {
            self.undo.remove(0);
        }
    }

    /// Pop the most recent group for undoing. The group moves to the redo
    /// stack; the caller applies the `before` states.
    pub fn undo(&mut self) -> Option<EditGroup> {
        let group = self.undo.pop()?;
        self.redo.push(group.clone());
        Some(group)
    }

    /// Pop the most recently undone group for redoing. The group moves
    /// back to the undo stack; the caller applies the `after` states.
    pub fn redo(&mut self) -> Option<EditGroup> {
        let group = self.redo.pop()?;
        self.undo.push(group.clone());
        Some(group)
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(x: i32) -> EditGroup {
        vec![CellEdit {
            cell: IVec3::new(x, 0, 0),
            before: None,
            after: Some(TilePrototype::new("stone")),
        }]
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut journal = EditJournal::default();
        journal.push(edit(0));
        journal.push(edit(1));
        assert_eq!(journal.undo_len(), 2);

        let group = journal.undo().unwrap();
        assert_eq!(group[0].cell.x, 1);
        assert_eq!((journal.undo_len(), journal.redo_len()), (1, 1));

        let group = journal.redo().unwrap();
        assert_eq!(group[0].cell.x, 1);
        assert_eq!((journal.undo_len(), journal.redo_len()), (2, 0));
    }

    #[test]
    fn test_push_invalidates_redo() {
        let mut journal = EditJournal::default();
        journal.push(edit(0));
        journal.undo().unwrap();
        assert_eq!(journal.redo_len(), 1);

        journal.push(edit(1));
        assert_eq!(journal.redo_len(), 0);
        assert!(journal.redo().is_none());
    }

    #[test]
    fn test_empty_group_ignored() {
        let mut journal = EditJournal::default();
        journal.push(Vec::new());
        assert_eq!(journal.undo_len(), 0);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut journal = EditJournal::with_capacity(2);
        journal.push(edit(0));
        journal.push(edit(1));
        journal.push(edit(2));
        assert_eq!(journal.undo_len(), 2);

        assert_eq!(journal.undo().unwrap()[0].cell.x, 2);
        assert_eq!(journal.undo().unwrap()[0].cell.x, 1);
        assert!(journal.undo().is_none());
    }

    #[test]
    fn test_undo_empty_is_none() {
        let mut journal = EditJournal::default();
        assert!(journal.undo().is_none());
        assert!(journal.redo().is_none());
    }
}
