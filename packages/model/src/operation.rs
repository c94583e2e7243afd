//! # Operations
//!
//! The closed set of atomic edits. Operations are the only way a document
//! changes and the unit of inversion (undo) and serialization.
//!
//! ## Wire format
//!
//! ```json
//! { "type": "insert_text", "path": [0, 0], "offset": 1, "text": "X" }
//! { "type": "split_node", "path": [0], "position": 3, "properties": { "key": "9", "type": "paragraph" } }
//! ```
//!
//! Every operation carries what it needs to be undone: removed nodes and text
//! travel with `remove_*`, and `set_*` operations carry both the old
//! `properties` and the `newProperties`.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::node::{Mark, MarkProperties, MarkSet, Node, NodeProperties};
use crate::path::Path;
use crate::range::SelectionProperties;
use crate::value::ValueProperties;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`
    InsertNode { path: Path, node: Node },

    /// Remove the node at `path`; `node` is the removed subtree
    RemoveNode { path: Path, node: Node },

    /// Relocate the subtree at `path` to `new_path`
    #[serde(rename_all = "camelCase")]
    MoveNode { path: Path, new_path: Path },

    /// Merge the node at `path` into its previous sibling. `position` is the
    /// previous sibling's length and `properties` describe the merged node.
    MergeNode {
        path: Path,
        position: usize,
        #[serde(default)]
        properties: NodeProperties,
    },

    /// Split the node at `path` at `position`; the new second half takes
    /// `properties` (its key is required). A text point sitting exactly on
    /// `position` follows `affinity`.
    SplitNode {
        path: Path,
        position: usize,
        #[serde(default)]
        properties: NodeProperties,
        #[serde(default, skip_serializing_if = "Affinity::is_forward")]
        affinity: Affinity,
    },

    /// Insert `text` into a text node. When `marks` is given it must match
    /// the node's marks. A point sitting exactly on `offset` follows
    /// `affinity`.
    InsertText {
        path: Path,
        offset: usize,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        marks: Option<MarkSet>,
        #[serde(default, skip_serializing_if = "Affinity::is_forward")]
        affinity: Affinity,
    },

    /// Remove exactly `text` from a text node
    RemoveText { path: Path, offset: usize, text: String },

    AddMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    RemoveMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    /// Update `mark`'s fields with `properties`
    SetMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
        properties: MarkProperties,
    },

    #[serde(rename_all = "camelCase")]
    SetNode {
        path: Path,
        properties: NodeProperties,
        new_properties: NodeProperties,
    },

    #[serde(rename_all = "camelCase")]
    SetSelection {
        properties: SelectionProperties,
        new_properties: SelectionProperties,
    },

    #[serde(rename_all = "camelCase")]
    SetValue {
        properties: ValueProperties,
        new_properties: ValueProperties,
    },
}

/// Where a range endpoint lying exactly on an insertion or split point ends
/// up. Inverses of removals and merges are backward so the points those
/// left in place stay put on undo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    /// Past the inserted content, into the second half of a split
    #[default]
    Forward,
    /// In front of the inserted content, in the first half of a split
    Backward,
}

impl Affinity {
    pub fn is_forward(&self) -> bool {
        matches!(self, Affinity::Forward)
    }
}

const OPERATION_TYPES: &[&str] = &[
    "insert_node",
    "remove_node",
    "move_node",
    "merge_node",
    "split_node",
    "insert_text",
    "remove_text",
    "add_mark",
    "remove_mark",
    "set_mark",
    "set_node",
    "set_selection",
    "set_value",
];

impl Operation {
    /// The wire tag of this operation
    pub fn type_name(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::AddMark { .. } => "add_mark",
            Operation::RemoveMark { .. } => "remove_mark",
            Operation::SetMark { .. } => "set_mark",
            Operation::SetNode { .. } => "set_node",
            Operation::SetSelection { .. } => "set_selection",
            Operation::SetValue { .. } => "set_value",
        }
    }

    /// The path this operation targets, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::AddMark { path, .. }
            | Operation::RemoveMark { path, .. }
            | Operation::SetMark { path, .. }
            | Operation::SetNode { path, .. } => Some(path),
            Operation::SetSelection { .. } | Operation::SetValue { .. } => None,
        }
    }

    pub fn is_selection(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    pub fn to_json(&self) -> ModelResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse an operation, rejecting unknown `type` tags explicitly
    pub fn from_json(json: serde_json::Value) -> ModelResult<Self> {
        let tag = json
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ModelError::UnknownOperation("<missing type>".to_string()))?;
        if !OPERATION_TYPES.contains(&tag) {
            return Err(ModelError::UnknownOperation(tag.to_string()));
        }
        Ok(serde_json::from_value(json)?)
    }
}
