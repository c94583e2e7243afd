//! # Apply
//!
//! `apply(value, operation) -> value`, one case per operation. Besides the
//! document edit itself, every case keeps the selection and decorations
//! pointing at the same content:
//!
//! - text edits shift offsets in the edited text and drop atomic decorations
//!   the edit lands inside;
//! - text splits and merges move points between the two halves;
//! - a point lying exactly where text is inserted or split follows the
//!   operation's [`Affinity`];
//! - structural edits rebase point paths with [`path::transform`];
//! - points inside a removed subtree are relocated to the nearest surviving
//!   text, or lost when there is none.

use std::cmp::Ordering;

use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::node::{char_len, MarkSet, Node, NodeProperties};
use crate::operation::{Affinity, Operation};
use crate::path::{self, Path};
use crate::range::{Point, Ranged, Selection, SelectionProperties};
use crate::value::{Value, ValueProperties};

/// Apply `operation` to `value`, returning the new value
pub fn apply(value: &Value, operation: &Operation) -> ModelResult<Value> {
    debug!(operation = operation.type_name(), path = ?operation.path(), "Applying operation");

    match operation {
        Operation::InsertText {
            path,
            offset,
            text,
            marks,
            affinity,
        } => apply_insert_text(value, path, *offset, text, marks.as_ref(), *affinity),

        Operation::RemoveText { path, offset, text } => {
            apply_remove_text(value, path, *offset, text)
        }

        Operation::AddMark {
            path,
            offset,
            length,
            mark,
        } => {
            assert_whole_text(value, path, *offset, *length)?;
            let document = value.document.add_mark(path, mark)?;
            Ok(with_document(value, document))
        }

        Operation::RemoveMark {
            path,
            offset,
            length,
            mark,
        } => {
            assert_whole_text(value, path, *offset, *length)?;
            let document = value.document.remove_mark(path, mark)?;
            Ok(with_document(value, document))
        }

        Operation::SetMark {
            path,
            offset,
            length,
            mark,
            properties,
        } => {
            assert_whole_text(value, path, *offset, *length)?;
            let document = value
                .document
                .replace_mark(path, mark, mark.merge(properties))?;
            Ok(with_document(value, document))
        }

        Operation::InsertNode { path, node } => {
            let document = value.document.insert_node(path, node.clone())?;
            Ok(rebase_structural(value, document, operation))
        }

        Operation::RemoveNode { path, node } => {
            let existing = value.document.assert_node(path)?;
            if existing != node {
                return Err(ModelError::InvalidOperation(format!(
                    "remove_node payload does not match the node at {:?}",
                    path
                )));
            }
            let document = value.document.remove_node(path)?;
            Ok(rebase_structural(value, document, operation))
        }

        Operation::MoveNode { path, new_path } => apply_move_node(value, path, new_path, operation),

        Operation::MergeNode { path, position, .. } => {
            let previous_path = previous_sibling(path)?;
            let previous = value.document.assert_node(&previous_path)?;
            if previous.length() != *position {
                return Err(ModelError::InvalidOperation(format!(
                    "merge_node position {} does not match previous sibling length {}",
                    position,
                    previous.length()
                )));
            }
            let document = value.document.merge_node(path)?;
            Ok(rebase_structural(value, document, operation))
        }

        Operation::SplitNode {
            path,
            position,
            properties,
            ..
        } => {
            let document = value.document.split_node(path, *position, properties)?;
            Ok(rebase_structural(value, document, operation))
        }

        Operation::SetNode {
            path,
            new_properties,
            ..
        } => apply_set_node(value, path, new_properties),

        Operation::SetSelection { new_properties, .. } => {
            Ok(apply_set_selection(value, new_properties))
        }

        Operation::SetValue { new_properties, .. } => Ok(apply_set_value(value, new_properties)),
    }
}

impl Operation {
    /// Apply this operation to `value`
    pub fn apply(&self, value: &Value) -> ModelResult<Value> {
        apply(value, self)
    }
}

fn with_document(value: &Value, document: Node) -> Value {
    Value {
        document,
        ..value.clone()
    }
}

fn apply_insert_text(
    value: &Value,
    path: &Path,
    offset: usize,
    text: &str,
    marks: Option<&MarkSet>,
    affinity: Affinity,
) -> ModelResult<Value> {
    let target = value.document.assert_text(path)?;
    if let Some(marks) = marks {
        if marks != &target.marks {
            return Err(ModelError::InvalidOperation(format!(
                "insert_text marks do not match the text node at {:?}",
                path
            )));
        }
    }

    let document = value.document.insert_text(path, offset, text)?;
    let mut next = with_document(value, document);
    let length = char_len(text);

    clear_atomic_decorations(&mut next, path, offset, offset);
    rebase_points(&mut next, |point| {
        let moves = point.offset > offset || (point.offset == offset && affinity.is_forward());
        if point.path.as_ref() == Some(path) && moves {
            Some(Point::new(path.clone(), point.offset + length))
        } else {
            Some(point.clone())
        }
    });

    Ok(next)
}

fn apply_remove_text(value: &Value, path: &Path, offset: usize, text: &str) -> ModelResult<Value> {
    let document = value.document.remove_text(path, offset, text)?;
    let mut next = with_document(value, document);
    let length = char_len(text);
    let end = offset + length;

    clear_atomic_decorations(&mut next, path, offset, end);
    rebase_points(&mut next, |point| {
        if point.path.as_ref() != Some(path) {
            return Some(point.clone());
        }
        let moved = if point.offset >= end {
            point.offset - length
        } else if point.offset > offset {
            offset
        } else {
            point.offset
        };
        Some(Point::new(path.clone(), moved))
    });

    Ok(next)
}

/// Marks are uniform per text node, so mark operations must span it entirely
fn assert_whole_text(value: &Value, path: &Path, offset: usize, length: usize) -> ModelResult<()> {
    let text = value.document.assert_text(path)?;
    if offset != 0 || length != text.len() {
        return Err(ModelError::InvalidOperation(format!(
            "mark range {}..{} does not cover the whole text node at {:?} (length {})",
            offset,
            offset + length,
            path,
            text.len()
        )));
    }
    Ok(())
}

fn apply_move_node(
    value: &Value,
    path: &Path,
    new_path: &Path,
    operation: &Operation,
) -> ModelResult<Value> {
    if path == new_path {
        return Ok(value.clone());
    }
    if path.is_empty() || new_path.is_empty() {
        return Err(ModelError::InvalidOperation(
            "the document root cannot be moved".to_string(),
        ));
    }
    if path::is_above(path, new_path) {
        return Err(ModelError::InvalidOperation(format!(
            "cannot move node at {:?} inside itself to {:?}",
            path, new_path
        )));
    }

    let node = value.document.assert_node(path)?.clone();
    let removed = value.document.remove_node(path)?;
    let document = removed.insert_node(&path::move_target(path, new_path), node)?;
    Ok(rebase_structural(value, document, operation))
}

fn apply_set_node(value: &Value, path: &Path, properties: &NodeProperties) -> ModelResult<Value> {
    if properties.key.is_some() {
        warn!(path = ?path, "set_node cannot change a node's key; ignoring `key`");
    }
    let node = value.document.assert_node(path)?;
    let updated = node.with_properties(properties);
    let document = value.document.replace_node(path, updated)?;
    Ok(with_document(value, document))
}

fn apply_set_selection(value: &Value, properties: &SelectionProperties) -> Value {
    let merged = value.selection.merge(properties);
    let selection = merged.normalize(&value.document);
    if selection != merged {
        warn!(
            anchor = ?merged.anchor,
            focus = ?merged.focus,
            "Selection did not resolve to text nodes and was normalized"
        );
    }
    Value {
        selection,
        ..value.clone()
    }
}

fn apply_set_value(value: &Value, properties: &ValueProperties) -> Value {
    value.merge(properties)
}

fn previous_sibling(path: &[usize]) -> ModelResult<Path> {
    match path.last() {
        Some(&index) if index > 0 => Ok(path::decrement(path, 1, None)),
        _ => Err(ModelError::InvalidOperation(format!(
            "node at {:?} has no previous sibling",
            path
        ))),
    }
}

/// Rebase every range endpoint through a structural operation. `value` still
/// holds the old document; `document` is the new one.
fn rebase_structural(value: &Value, document: Node, operation: &Operation) -> Value {
    let old_document = &value.document;
    let mut next = with_document(value, document);

    rebase_points(&mut next, |point| {
        let point_path = point.path.as_ref()?;

        match operation {
            Operation::MergeNode { path, position, .. } if point_path == path => {
                if old_document.get(path).map(Node::is_text).unwrap_or(false) {
                    let merged_into = path::decrement(path, 1, None);
                    return Some(Point::new(merged_into, point.offset + position));
                }
            }
            Operation::SplitNode {
                path,
                position,
                affinity,
                ..
            } if point_path == path => {
                let moves = point.offset > *position
                    || (point.offset == *position && affinity.is_forward());
                if moves {
                    return Some(Point::new(
                        path::increment(path, 1, None),
                        point.offset - position,
                    ));
                }
                return Some(point.clone());
            }
            _ => {}
        }

        match path::transform(point_path, operation).into_iter().next() {
            Some(rebased) => Some(Point::new(rebased, point.offset)),
            None => relocate_removed_point(old_document, operation),
        }
    });

    next
}

/// Where a point inside a removed subtree goes: the end of the previous text,
/// else the start of the next text, else nowhere.
fn relocate_removed_point(old_document: &Node, operation: &Operation) -> Option<Point> {
    let removed = operation.path()?;

    if let Some((text_path, text)) = old_document.previous_text(removed) {
        let rebased = path::transform(&text_path, operation).into_iter().next()?;
        return Some(Point::new(rebased, text.len()));
    }

    if let Some((text_path, _)) = old_document.next_text(removed) {
        let rebased = path::transform(&text_path, operation).into_iter().next()?;
        return Some(Point::new(rebased, 0));
    }

    None
}

/// Map every set point of the selection and decorations. Returning `None`
/// means the point is lost: the selection is unset and a decoration dropped.
fn rebase_points<F>(value: &mut Value, mut f: F)
where
    F: FnMut(&Point) -> Option<Point>,
{
    if value.selection.is_set() {
        let anchor = f(&value.selection.anchor);
        let focus = f(&value.selection.focus);
        value.selection = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Selection {
                anchor,
                focus,
                is_focused: value.selection.is_focused,
            },
            _ => {
                debug!("Selection lost its anchor or focus and was unset");
                Selection {
                    is_focused: value.selection.is_focused,
                    ..Selection::default()
                }
            }
        };
    }

    let decorations = std::mem::take(&mut value.decorations);
    value.decorations = decorations
        .into_iter()
        .filter_map(|mut decoration| {
            if decoration.is_unset() {
                return Some(decoration);
            }
            decoration.anchor = f(&decoration.anchor)?;
            decoration.focus = f(&decoration.focus)?;
            Some(decoration)
        })
        .collect();
}

/// Drop atomic decorations that the edit span `start..end` on `path` falls
/// inside of or overlaps.
fn clear_atomic_decorations(value: &mut Value, path: &Path, start: usize, end: usize) {
    let edit_start = Point::new(path.clone(), start);
    let edit_end = Point::new(path.clone(), end);
    let before = |a: &Point, b: &Point| a.compare(b) == Some(Ordering::Less);

    value.decorations.retain(|decoration| {
        if !decoration.atomic || decoration.is_unset() {
            return true;
        }
        let overlaps = before(decoration.start(), &edit_end) && before(&edit_start, decoration.end());
        if overlaps {
            debug!(mark = %decoration.mark.mark_type, "Dropping atomic decoration");
        }
        !overlaps
    });
}