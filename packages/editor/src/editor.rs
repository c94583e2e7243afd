//! # Editor Session
//!
//! Owns the current value and everything needed to change it: the schema,
//! the history, the key generator and the config.
//!
//! Every edit goes through [`Editor::change`]. The closure gets a fresh
//! [`Change`]; when it returns, the batch is normalized once, the selection is
//! made usable, and the result is committed: saved to history, the version
//! bumped, and listeners told about the new value and the ordered operations.
//! A closure that fails leaves the editor untouched.

use folio_model::{KeyGenerator, Operation, Value};
use tracing::{debug, info};

use crate::change::Change;
use crate::config::EditorConfig;
use crate::errors::EditorResult;
use crate::history::History;
use crate::schema::Schema;

type Listener = Box<dyn FnMut(&Value, &[Operation])>;

/// Outcome of one committed batch
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeResult {
    /// Editor version after the batch
    pub version: u64,

    /// Every operation applied, in order
    pub operations: Vec<Operation>,
}

/// Single-user editing session
pub struct Editor {
    value: Value,
    history: History,
    schema: Schema,
    keys: KeyGenerator,
    config: EditorConfig,

    /// Bumped on every commit that applied at least one operation
    version: u64,

    /// Whether commits are recorded in history
    saving: bool,

    listeners: Vec<Listener>,
}

impl Editor {
    /// Create an editor with the core schema and default config
    pub fn new(value: Value) -> EditorResult<Self> {
        Self::with_parts(value, Schema::new(), KeyGenerator::new(), EditorConfig::default())
    }

    pub fn with_config(value: Value, config: EditorConfig) -> EditorResult<Self> {
        Self::with_parts(value, Schema::new(), KeyGenerator::new(), config)
    }

    /// Create an editor from its parts. The initial value is normalized
    /// against `schema`; those repairs are not undoable.
    pub fn with_parts(
        value: Value,
        schema: Schema,
        keys: KeyGenerator,
        config: EditorConfig,
    ) -> EditorResult<Self> {
        let mut editor = Self {
            history: History::from_config(&config),
            value,
            schema,
            keys,
            config,
            version: 0,
            saving: true,
            listeners: Vec::new(),
        };

        let mut change = Change::new(
            editor.value.clone(),
            &editor.schema,
            &mut editor.keys,
            &editor.config,
        );
        change.normalize()?;
        change.finish_selection()?;
        let (value, operations) = change.into_parts();
        editor.value = value;

        info!(
            rules = editor.schema.len(),
            repairs = operations.len(),
            "Created editor session"
        );
        Ok(editor)
    }

    /// Run `f` as one batch and commit it
    pub fn change<F>(&mut self, f: F) -> EditorResult<ChangeResult>
    where
        F: FnOnce(&mut Change<'_>) -> EditorResult<()>,
    {
        let mut change = Change::new(self.value.clone(), &self.schema, &mut self.keys, &self.config);
        change.without_normalizing(f)?;
        change.finish_selection()?;
        let (value, operations) = change.into_parts();

        let save = self.saving;
        Ok(self.commit(value, operations, save))
    }

    /// Apply pre-built operations as one batch
    pub fn apply_operations(
        &mut self,
        operations: impl IntoIterator<Item = Operation>,
    ) -> EditorResult<ChangeResult> {
        self.change(|change| change.apply_operations(operations))
    }

    /// Revert the most recent batch. Returns `None` when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> EditorResult<Option<ChangeResult>> {
        if !self.history.can_undo() {
            return Ok(None);
        }

        let mut change = Change::new(self.value.clone(), &self.schema, &mut self.keys, &self.config);
        self.history.undo(&mut change)?;
        let (value, operations) = change.into_parts();

        info!(version = self.version + 1, "Undo");
        Ok(Some(self.commit(value, operations, false)))
    }

    /// Reapply the most recently undone batch
    pub fn redo(&mut self) -> EditorResult<Option<ChangeResult>> {
        if !self.history.can_redo() {
            return Ok(None);
        }

        let mut change = Change::new(self.value.clone(), &self.schema, &mut self.keys, &self.config);
        self.history.redo(&mut change)?;
        let (value, operations) = change.into_parts();

        info!(version = self.version + 1, "Redo");
        Ok(Some(self.commit(value, operations, false)))
    }

    /// Run `f` with history recording switched off
    pub fn without_saving<F, T>(&mut self, f: F) -> T
    where
        F: FnOnce(&mut Editor) -> T,
    {
        let previous = self.saving;
        self.saving = false;
        let result = f(self);
        self.saving = previous;
        result
    }

    /// Register a listener called after every commit with the new value
    /// and the operations that produced it
    pub fn on_change(&mut self, listener: impl FnMut(&Value, &[Operation]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn commit(&mut self, value: Value, operations: Vec<Operation>, save: bool) -> ChangeResult {
        if operations.is_empty() {
            return ChangeResult {
                version: self.version,
                operations,
            };
        }

        if save {
            self.history.save(&operations);
        }
        self.value = value;
        self.version += 1;
        debug!(
            version = self.version,
            operations = operations.len(),
            "Committed change"
        );

        for listener in &mut self.listeners {
            listener(&self.value, &operations);
        }

        ChangeResult {
            version: self.version,
            operations,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whether commits are currently recorded in history
    pub fn is_saving(&self) -> bool {
        self.saving
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("version", &self.version)
            .field("history", &self.history)
            .field("schema", &self.schema)
            .field("saving", &self.saving)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
