//! # Normalization
//!
//! The fixpoint loop. Dirty paths are drained one at a time; for each node
//! the first failing schema rule repairs it, and the node is re-validated
//! until it passes, disappears, or exhausts its iteration budget.
//!
//! Repairs run with normalization suppressed. The operations they apply only
//! queue more dirty paths, which the same drain loop picks up, so there is no
//! recursion between rules.

use folio_model::{Node, Path};
use tracing::{debug, instrument};

use crate::change::Change;
use crate::errors::{EditorError, EditorResult};

impl<'a> Change<'a> {
    /// Normalize every queued dirty path
    pub fn normalize_dirty_paths(&mut self) -> EditorResult<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }

        let previous = self.normalize;
        self.normalize = false;
        let result = self.drain_dirty_paths();
        self.normalize = previous;
        result
    }

    fn drain_dirty_paths(&mut self) -> EditorResult<()> {
        while let Some(path) = self.dirty.pop() {
            self.normalize_node_by_path(path)?;
        }
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    fn normalize_node_by_path(&mut self, mut path: Path) -> EditorResult<()> {
        let schema = self.schema;
        let Some(mut node) = self.value.document.get(&path).cloned() else {
            return Ok(());
        };

        let max = self.config.normalize_iteration_base + schema.len() + child_count(&node);
        let mut iterations = 0;

        while let Some((rule, violation)) = schema.validate_node(&node) {
            debug!(rule = rule.name(), key = node.key(), violation = ?violation, "Normalizing node");
            rule.normalize(self, &node, violation)?;

            // Re-find the node by path, or by key if the repair moved it.
            let document = &self.value.document;
            match document.get(&path) {
                Some(found) if found.key() == node.key() => node = found.clone(),
                _ => match document.path_of_key(node.key()) {
                    Some(moved) => {
                        node = document.assert_node(&moved)?.clone();
                        path = moved;
                    }
                    None => break,
                },
            }

            iterations += 1;
            if iterations > max {
                return Err(EditorError::NormalizationBudgetExceeded {
                    key: node.key().to_string(),
                    path,
                    iterations,
                });
            }
        }

        Ok(())
    }
}

fn child_count(node: &Node) -> usize {
    if node.is_text() {
        1
    } else {
        node.children().len()
    }
}
