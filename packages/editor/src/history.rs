//! # History
//!
//! Undo and redo over batches of operations.
//!
//! ## Design
//!
//! - Every committed change is saved as one batch, repairs included
//! - Undo applies the inverse of each operation in reverse order and moves
//!   the batch to the redo stack
//! - Redo reapplies the original operations in order
//! - New batches clear the redo stack
//! - Selection-only batches never become undo steps of their own: they fold
//!   into the previous batch
//! - Typing and deleting chars one at a time merges into the previous batch
//!   when it continues where that batch left off
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new();
//! history.save(&operations);
//!
//! let mut change = Change::new(value, &schema, &mut keys, &config);
//! history.undo(&mut change)?;
//! ```

use folio_model::{char_len, Operation};
use tracing::{debug, info};

use crate::change::Change;
use crate::config::EditorConfig;
use crate::errors::EditorResult;

/// Operations that are undone and redone together
#[derive(Debug, Clone, PartialEq)]
pub struct OperationBatch {
    /// The operations in this batch (in application order)
    pub operations: Vec<Operation>,
}

impl OperationBatch {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }

    /// Inverses in the order they must be applied to undo the batch
    pub fn inverses(&self) -> Vec<Operation> {
        self.operations.iter().rev().map(Operation::invert).collect()
    }

    fn is_selection_only(&self) -> bool {
        self.operations.iter().all(Operation::is_selection)
    }

    /// Last operation that is not a selection change
    fn last_edit(&self) -> Option<&Operation> {
        self.operations.iter().rev().find(|op| !op.is_selection())
    }

    /// Fold a selection-only batch into this one
    fn absorb_selection(&mut self, operations: Vec<Operation>) {
        for operation in operations {
            if let Operation::SetSelection {
                properties: later_properties,
                new_properties: later_new,
            } = &operation
            {
                if let Some(Operation::SetSelection {
                    properties,
                    new_properties,
                }) = self.operations.last_mut()
                {
                    // Keep the oldest pre-image, take the newest state.
                    *properties = later_properties.extend(properties);
                    *new_properties = new_properties.extend(later_new);
                    continue;
                }
            }
            self.operations.push(operation);
        }
    }
}

/// Undo/redo history for an editor session
#[derive(Debug)]
pub struct History {
    /// Saved batches (most recent last)
    undos: Vec<OperationBatch>,

    /// Undone batches (most recent last)
    redos: Vec<OperationBatch>,

    /// Maximum number of undo levels (0 = unlimited)
    limit: usize,

    /// Merge consecutive typing into one batch
    merge_typing: bool,
}

impl History {
    /// Create a history with the default limit (100)
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            undos: Vec::new(),
            redos: Vec::new(),
            limit,
            merge_typing: true,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            merge_typing: config.merge_typing,
            ..Self::with_limit(config.history_limit)
        }
    }

    /// Record a committed batch of operations
    pub fn save(&mut self, operations: &[Operation]) {
        if operations.is_empty() {
            return;
        }
        let batch = OperationBatch::new(operations.to_vec());

        if batch.is_selection_only() {
            match self.undos.last_mut() {
                Some(previous) => previous.absorb_selection(batch.operations),
                None => debug!("Dropping selection-only batch with nothing to attach to"),
            }
            return;
        }

        if self.merge_typing {
            if let Some(previous) = self.undos.last_mut() {
                if continues(previous, &batch) {
                    debug!(operations = batch.operations.len(), "Merging batch into previous");
                    previous.operations.extend(batch.operations);
                    self.redos.clear();
                    return;
                }
            }
        }

        self.push(batch);
    }

    fn push(&mut self, batch: OperationBatch) {
        self.undos.push(batch);

        if self.limit > 0 && self.undos.len() > self.limit {
            self.undos.remove(0);
        }

        self.redos.clear();
    }

    /// Undo the most recent batch through `change`. Returns false when there
    /// is nothing to undo.
    pub fn undo(&mut self, change: &mut Change<'_>) -> EditorResult<bool> {
        let Some(batch) = self.undos.pop() else {
            return Ok(false);
        };

        if let Err(error) = change.apply_operations(batch.inverses()) {
            self.undos.push(batch);
            return Err(error);
        }

        info!(operations = batch.operations.len(), "Undo");
        self.redos.push(batch);
        Ok(true)
    }

    /// Redo the most recently undone batch through `change`
    pub fn redo(&mut self, change: &mut Change<'_>) -> EditorResult<bool> {
        let Some(batch) = self.redos.pop() else {
            return Ok(false);
        };

        if let Err(error) = change.apply_operations(batch.operations.clone()) {
            self.redos.push(batch);
            return Err(error);
        }

        info!(operations = batch.operations.len(), "Redo");
        self.undos.push(batch);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undos.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redos.len()
    }

    /// The batch the next undo would revert
    pub fn peek_undo(&self) -> Option<&OperationBatch> {
        self.undos.last()
    }

    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `batch` is a single char-level edit that picks up where the
/// last edit of `previous` stopped
fn continues(previous: &OperationBatch, batch: &OperationBatch) -> bool {
    let mut edits = batch.operations.iter().filter(|op| !op.is_selection());
    let (Some(edit), None) = (edits.next(), edits.next()) else {
        return false;
    };
    let Some(last) = previous.last_edit() else {
        return false;
    };

    match (last, edit) {
        (
            Operation::InsertText {
                path: last_path,
                offset: last_offset,
                text: last_text,
                ..
            },
            Operation::InsertText { path, offset, .. },
        ) => path == last_path && *offset == last_offset + char_len(last_text),
        (
            Operation::RemoveText {
                path: last_path,
                offset: last_offset,
                ..
            },
            Operation::RemoveText { path, offset, text },
        ) => {
            let backspace = offset + char_len(text) == *last_offset;
            let forward_delete = offset == last_offset;
            path == last_path && (backspace || forward_delete)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::{Affinity, Point, SelectionProperties};

    fn insert(offset: usize, text: &str) -> Operation {
        Operation::InsertText {
            path: vec![0, 0],
            offset,
            text: text.to_string(),
            marks: None,
            affinity: Affinity::Forward,
        }
    }

    fn remove(offset: usize, text: &str) -> Operation {
        Operation::RemoveText {
            path: vec![0, 0],
            offset,
            text: text.to_string(),
        }
    }

    fn select(from: usize, to: usize) -> Operation {
        Operation::SetSelection {
            properties: SelectionProperties {
                anchor: Some(Point::new(vec![0, 0], from)),
                ..SelectionProperties::default()
            },
            new_properties: SelectionProperties {
                anchor: Some(Point::new(vec![0, 0], to)),
                ..SelectionProperties::default()
            },
        }
    }

    #[test]
    fn test_history_creation() {
        let history = History::new();
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_typing_merges() {
        let mut history = History::new();
        history.save(&[insert(3, "d")]);
        history.save(&[insert(4, "e")]);
        history.save(&[insert(5, "f")]);
        assert_eq!(history.undo_levels(), 1);

        // A jump elsewhere starts a new step.
        history.save(&[insert(0, "x")]);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_backspace_and_forward_delete_merge() {
        let mut history = History::new();
        history.save(&[remove(4, "d")]);
        history.save(&[remove(3, "c")]);
        history.save(&[remove(3, "x")]);
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.peek_undo().unwrap().operations.len(), 3);

        history.save(&[insert(3, "y")]);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_merging_can_be_disabled() {
        let mut history = History::from_config(&EditorConfig {
            merge_typing: false,
            ..EditorConfig::default()
        });
        history.save(&[insert(3, "d")]);
        history.save(&[insert(4, "e")]);
        assert_eq!(history.undo_levels(), 2);
    }

    #[test]
    fn test_selection_batches_fold() {
        let mut history = History::new();
        history.save(&[select(0, 1)]);
        assert_eq!(history.undo_levels(), 0);

        history.save(&[insert(0, "a"), select(0, 1)]);
        history.save(&[select(1, 2)]);
        history.save(&[select(2, 3)]);

        let batch = history.peek_undo().unwrap();
        assert_eq!(batch.operations.len(), 2);
        assert_eq!(batch.operations[1], select(0, 3));
    }

    #[test]
    fn test_limit_enforced() {
        let mut history = History::with_limit(2);
        for i in 0..3 {
            history.save(&[insert(i * 10, "z")]);
        }
        assert_eq!(history.undo_levels(), 2);
        assert_eq!(history.peek_undo().unwrap().operations, vec![insert(20, "z")]);
    }

    #[test]
    fn test_batch_inverses_run_backwards() {
        let batch = OperationBatch::new(vec![insert(0, "a"), insert(1, "b")]);
        assert_eq!(
            batch.inverses(),
            vec![
                Operation::RemoveText {
                    path: vec![0, 0],
                    offset: 1,
                    text: "b".to_string()
                },
                Operation::RemoveText {
                    path: vec![0, 0],
                    offset: 0,
                    text: "a".to_string()
                },
            ]
        );
    }
}
