//! # Folio Model
//!
//! Immutable document model for rich-text editing.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ path: coordinates + transform through ops   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node / tree: persistent document tree       │
//! │  - Document → Block → Inline → Text         │
//! │  - Structural sharing via Arc children      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ value: document + selection + decorations   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ operation: apply / invert / JSON wire form  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate mutates in place: `apply` takes a value and returns
//! the next one, sharing every untouched subtree with its input.
//!
//! ## Usage
//!
//! ```rust
//! use folio_model::{Affinity, Node, Operation, Value};
//!
//! let value = Value::new(Node::document(
//!     "doc",
//!     vec![Node::block("p", "paragraph", vec![Node::text("t", "Hllo")])],
//! ))?;
//!
//! let op = Operation::InsertText {
//!     path: vec![0, 0],
//!     offset: 1,
//!     text: "e".to_string(),
//!     marks: None,
//!     affinity: Affinity::Forward,
//! };
//! let next = op.apply(&value)?;
//! assert_eq!(next.document.text_content(), "Hello");
//!
//! let back = op.invert().apply(&next)?;
//! assert_eq!(back.document, value.document);
//! # Ok::<(), folio_model::ModelError>(())
//! ```

mod apply;
mod error;
mod invert;
mod key;
mod node;
mod operation;
pub mod path;
mod range;
mod tree;
mod value;

pub use apply::apply;
pub use error::{ModelError, ModelResult};
pub use invert::invert;
pub use key::KeyGenerator;
pub use node::{
    char_len, char_slice, Data, Element, Mark, MarkProperties, MarkSet, Node, NodeKind,
    NodeProperties, Text,
};
pub use operation::{Affinity, Operation};
pub use path::Path;
pub use range::{Decoration, Point, Range, Ranged, Selection, SelectionProperties};
pub use value::{Value, ValueProperties};
