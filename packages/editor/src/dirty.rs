//! # Dirty Paths
//!
//! Paths flagged for schema re-validation. Every applied operation marks the
//! nodes it touched plus their ancestors, and rebases what is already queued
//! so a queued path keeps pointing at the same node.

use folio_model::{path, Operation, Path};

/// Paths an operation leaves needing validation, in the order they should be
/// queued (ancestors first, so the deepest path pops first)
pub fn dirty_paths(operation: &Operation) -> Vec<Path> {
    match operation {
        Operation::InsertText { path, .. }
        | Operation::RemoveText { path, .. }
        | Operation::AddMark { path, .. }
        | Operation::RemoveMark { path, .. }
        | Operation::SetMark { path, .. }
        | Operation::SetNode { path, .. } => with_ancestors(path),

        Operation::InsertNode { path, node } => {
            let mut paths = with_ancestors(path);
            for descendant in node.descendant_paths() {
                let mut full = path.clone();
                full.extend(descendant);
                paths.push(full);
            }
            paths
        }

        Operation::SplitNode { path, .. } => {
            let mut paths = with_ancestors(path);
            paths.push(path::increment(path, 1, None));
            paths
        }

        Operation::MergeNode { path, .. } => with_ancestors(&path::decrement(path, 1, None)),

        Operation::MoveNode { path, new_path } => {
            if path == new_path {
                return Vec::new();
            }
            let mut paths: Vec<Path> = path::ancestors(path)
                .iter()
                .flat_map(|ancestor| path::transform(ancestor, operation))
                .collect();
            paths.extend(path::ancestors(&path::move_target(path, new_path)));
            paths
        }

        Operation::RemoveNode { path, .. } => path::ancestors(path),

        Operation::SetSelection { .. } | Operation::SetValue { .. } => Vec::new(),
    }
}

fn with_ancestors(path: &[usize]) -> Vec<Path> {
    let mut paths = path::ancestors(path);
    paths.push(path.to_vec());
    paths
}

/// Queue of paths awaiting normalization, without duplicates
#[derive(Debug, Clone, Default)]
pub struct DirtyPaths {
    paths: Vec<Path>,
}

impl DirtyPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebase the queue through `operation`, then queue what it touched
    pub fn record(&mut self, operation: &Operation) {
        self.rebase(operation);
        self.extend(dirty_paths(operation));
    }

    /// Rebase queued paths through an applied operation. Paths of removed
    /// nodes drop out; a split node stays queued under both halves.
    pub fn rebase(&mut self, operation: &Operation) {
        let queued = std::mem::take(&mut self.paths);
        let rebased = queued
            .iter()
            .flat_map(|queued| path::transform(queued, operation));
        self.extend(rebased);
    }

    pub fn extend(&mut self, paths: impl IntoIterator<Item = Path>) {
        for path in paths {
            self.push(path);
        }
    }

    pub fn push(&mut self, path: Path) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// Most recently queued path
    pub fn pop(&mut self) -> Option<Path> {
        self.paths.pop()
    }

    pub fn contains(&self, path: &[usize]) -> bool {
        self.paths.iter().any(|queued| queued == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn clear(&mut self) {
        self.paths.clear();
    }
}
