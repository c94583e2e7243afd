//! # Change
//!
//! One in-flight batch of edits. A `Change` starts from a value, applies
//! operations one at a time, tracks which paths need re-validation, and runs
//! schema normalization whenever it is not suppressed.
//!
//! ```text
//!   idle ──change()──▶ batching ──(normalize enabled)──▶ normalizing
//!    ▲                    │  ▲                               │
//!    │                    │  └───────── repairs ─────────────┘
//!    └──── into_parts ────┘
//! ```
//!
//! A change that returned an error is half-applied and must be dropped; the
//! editor never commits one.

use folio_model::{Affinity, KeyGenerator, Operation, Point, Ranged, SelectionProperties, Value};
use tracing::{debug, warn};

use crate::config::EditorConfig;
use crate::dirty::DirtyPaths;
use crate::errors::{EditorError, EditorResult};
use crate::schema::Schema;

/// Attempts at drawing a key not already used by the document
const MAX_KEY_ATTEMPTS: usize = 1_000;

pub struct Change<'a> {
    pub(crate) value: Value,
    pub(crate) operations: Vec<Operation>,
    pub(crate) dirty: DirtyPaths,
    pub(crate) normalize: bool,
    pub(crate) schema: &'a Schema,
    pub(crate) keys: &'a mut KeyGenerator,
    pub(crate) config: &'a EditorConfig,
}

impl<'a> Change<'a> {
    pub fn new(
        value: Value,
        schema: &'a Schema,
        keys: &'a mut KeyGenerator,
        config: &'a EditorConfig,
    ) -> Self {
        Self {
            value,
            operations: Vec::new(),
            dirty: DirtyPaths::new(),
            normalize: true,
            schema,
            keys,
            config,
        }
    }

    /// The value as of the last applied operation
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Operations applied so far, in order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        self.config
    }

    /// Whether applying an operation runs normalization right away
    pub fn is_normalizing(&self) -> bool {
        self.normalize
    }

    /// Paths queued for normalization
    pub fn dirty_paths(&self) -> &DirtyPaths {
        &self.dirty
    }

    /// A fresh key that the current document does not use yet
    pub fn generate_key(&mut self) -> EditorResult<String> {
        let document = &self.value.document;
        unused_key(self.keys, |key| document.has_key(key))
    }

    pub fn keys(&mut self) -> &mut KeyGenerator {
        self.keys
    }

    /// Apply one operation, queue the paths it dirtied, and normalize unless
    /// suppressed
    pub fn apply_operation(&mut self, operation: Operation) -> EditorResult<()> {
        debug!(op = operation.type_name(), path = ?operation.path(), "Applying operation");
        let value = operation.apply(&self.value)?;
        self.dirty.record(&operation);
        self.value = value;
        self.operations.push(operation);

        if self.normalize {
            self.normalize_dirty_paths()?;
        }
        Ok(())
    }

    /// Apply several operations and normalize once at the end
    pub fn apply_operations(
        &mut self,
        operations: impl IntoIterator<Item = Operation>,
    ) -> EditorResult<()> {
        self.without_normalizing(|change| {
            for operation in operations {
                change.apply_operation(operation)?;
            }
            Ok(())
        })
    }

    /// Run `f` with normalization suppressed, then normalize once if it was
    /// enabled before
    pub fn without_normalizing<F, T>(&mut self, f: F) -> EditorResult<T>
    where
        F: FnOnce(&mut Change<'a>) -> EditorResult<T>,
    {
        let previous = self.normalize;
        self.normalize = false;
        let result = f(self);
        self.normalize = previous;

        let output = result?;
        if self.normalize {
            self.normalize_dirty_paths()?;
        }
        Ok(output)
    }

    /// Re-validate the whole document
    pub fn normalize(&mut self) -> EditorResult<()> {
        let document = &self.value.document;
        let mut paths = vec![Vec::new()];
        paths.extend(document.descendant_paths());
        self.dirty.extend(paths);
        self.normalize_dirty_paths()
    }

    /// Leave the selection somewhere usable: an invalid selection is reset to
    /// the start of the document, and an unset one is moved there when the
    /// config asks for it.
    pub fn finish_selection(&mut self) -> EditorResult<()> {
        let selection = &self.value.selection;
        let start = self.value.start_point();

        if selection.is_set() && !self.value.has_valid_selection() {
            warn!(
                anchor = ?selection.anchor,
                focus = ?selection.focus,
                "Selection no longer addresses text nodes; resetting to document start"
            );
            return self.select_point(start);
        }

        if selection.is_unset() && self.config.select_start_when_unset && !start.is_unset() {
            debug!("Selection unset after change; moving to document start");
            return self.select_point(start);
        }

        Ok(())
    }

    fn select_point(&mut self, point: Point) -> EditorResult<()> {
        let properties = SelectionProperties {
            anchor: Some(point.clone()),
            focus: Some(point),
            is_focused: None,
        };
        self.apply_operation(Operation::SetSelection {
            properties: self.value.selection.pick(&properties),
            new_properties: properties,
        })
    }

    /// Consume the change, yielding the final value and every operation
    /// applied, repairs included
    pub fn into_parts(self) -> (Value, Vec<Operation>) {
        (self.value, self.operations)
    }
}

/// Draw keys from `keys` until one is not `taken`
pub(crate) fn unused_key(
    keys: &mut KeyGenerator,
    taken: impl Fn(&str) -> bool,
) -> EditorResult<String> {
    for _ in 0..MAX_KEY_ATTEMPTS {
        let key = keys.generate();
        if !taken(&key) {
            return Ok(key);
        }
    }
    Err(EditorError::InvalidCommand(format!(
        "key generator produced only keys already in use after {} attempts",
        MAX_KEY_ATTEMPTS
    )))
}

impl std::fmt::Debug for Change<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Change")
            .field("operations", &self.operations.len())
            .field("dirty", &self.dirty.len())
            .field("normalize", &self.normalize)
            .finish()
    }
}
