//! # Folio Editor
//!
//! Editing engine on top of the immutable `folio-model` document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ editor: session, versioning, listeners      │
//! │  - Commits one batch per change()           │
//! │  - Records batches in history               │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ change: one in-flight batch                 │
//! │  - Commands → operations                    │
//! │  - Dirty paths → schema normalization       │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ folio-model: apply / invert / transform     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Operations are the only way to edit**: commands, schema repairs,
//!    undo and redo all reduce to operations on the model
//! 2. **The document is always normalized between batches**: rules only
//!    run at batch boundaries, never halfway through a command
//! 3. **Paths are positions, keys are identities**: multi-step commands look
//!    nodes up by key before every step
//!
//! ## Usage
//!
//! ```rust
//! use folio_editor::{Editor, Node, Point, Selection, Value};
//!
//! let value = Value::new(Node::document(
//!     "doc",
//!     vec![Node::block("p", "paragraph", vec![Node::text("t", "Hello")])],
//! ))?
//! .with_selection(Selection::collapsed(Point::new(vec![0, 0], 5)));
//!
//! let mut editor = Editor::new(value)?;
//! editor.change(|change| change.insert_text(", world"))?;
//! assert_eq!(editor.value().document.text_content(), "Hello, world");
//!
//! editor.undo()?;
//! assert_eq!(editor.value().document.text_content(), "Hello");
//! # Ok::<(), folio_editor::EditorError>(())
//! ```

mod change;
mod commands;
mod config;
mod core_rules;
mod dirty;
mod editor;
mod errors;
mod history;
mod normalize;
mod schema;

pub use change::Change;
pub use commands::Direction;
pub use config::EditorConfig;
pub use core_rules::{
    BlockChildrenRule, DocumentChildrenRule, EmptyInlineRule, ExtraEmptyTextsRule,
    InlineChildrenRule, InlinePaddingRule, MergeAdjacentTextsRule, TextPresenceRule,
};
pub use dirty::{dirty_paths, DirtyPaths};
pub use editor::{ChangeResult, Editor};
pub use errors::{EditorError, EditorResult};
pub use history::{History, OperationBatch};
pub use schema::{InlinePadding, Rule, Schema, Violation};

// Re-export model types for convenience
pub use folio_model::{
    Affinity, Data, Decoration, KeyGenerator, Mark, MarkProperties, MarkSet, ModelError, Node,
    NodeKind, NodeProperties, Operation, Path, Point, Range, Ranged, Selection,
    SelectionProperties, Text, Value, ValueProperties,
};
