//! # Commands
//!
//! Everything a caller can ask a [`Change`](crate::change::Change) to do,
//! layered from the bottom up:
//!
//! ```text
//!   at_selection   insert_text, delete, split_block, toggle_mark, ...
//!        │
//!   at_range       the same edits against an explicit range
//!        │
//!   by_path        one node at a time, addressed by path or key
//!        │
//!   Change::apply_operation
//! ```
//!
//! [`selection`] holds the commands that only move the cursor.

mod at_range;
mod at_selection;
mod by_path;
mod selection;

use folio_model::{Node, Path, Point, Ranged};

use crate::errors::{EditorError, EditorResult};

/// Which way a cursor walks through the text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

/// Path of a set point
pub(crate) fn point_path(point: &Point) -> EditorResult<Path> {
    point
        .path
        .clone()
        .ok_or_else(|| EditorError::InvalidCommand("point is unset".to_string()))
}

/// Start and end of `range` in document order, checked against `document`
pub(crate) fn range_edges(document: &Node, range: &impl Ranged) -> EditorResult<(Point, Point)> {
    let (start, end) = (range.start().clone(), range.end().clone());
    for point in [&start, &end] {
        if !point.is_valid_in(document) {
            return Err(EditorError::InvalidCommand(format!(
                "point {:?}@{} does not address a text in the document",
                point.path, point.offset
            )));
        }
    }
    Ok((start, end))
}

/// The point `n` chars away from `point`. Stepping from one leaf block into
/// the next counts as one char. Clamped at the document edges.
pub(crate) fn offset_point(
    document: &Node,
    point: &Point,
    n: usize,
    direction: Direction,
) -> Option<Point> {
    let path = point.path.as_ref()?;
    let texts = document.texts();
    let mut index = texts.iter().position(|(text_path, _)| text_path == path)?;
    let mut offset = point.offset.min(texts[index].1.len());
    let mut remaining = n;

    loop {
        let (text_path, text) = &texts[index];
        match direction {
            Direction::Backward => {
                if remaining <= offset {
                    return Some(Point::new(text_path.clone(), offset - remaining));
                }
                remaining -= offset;
                if index == 0 {
                    return Some(Point::new(text_path.clone(), 0));
                }
                let (previous_path, previous) = &texts[index - 1];
                if !same_block(document, text_path, previous_path) {
                    remaining -= 1;
                }
                index -= 1;
                offset = previous.len();
            }
            Direction::Forward => {
                let len = text.len();
                if offset + remaining <= len {
                    return Some(Point::new(text_path.clone(), offset + remaining));
                }
                remaining -= len - offset;
                if index + 1 == texts.len() {
                    return Some(Point::new(text_path.clone(), len));
                }
                let next_path = &texts[index + 1].0;
                if !same_block(document, text_path, next_path) {
                    remaining -= 1;
                }
                index += 1;
                offset = 0;
            }
        }
    }
}

fn same_block(document: &Node, a: &[usize], b: &[usize]) -> bool {
    let block = |path: &[usize]| document.closest_block(path).map(|(block_path, _)| block_path);
    block(a) == block(b)
}

/// End of the last text inside the node at `path`
pub(crate) fn end_of_node(document: &Node, path: &[usize]) -> EditorResult<Point> {
    let node = document.assert_node(path)?;
    let (mut text_path, text) = match node.last_text() {
        Some(found) => found,
        None => {
            return Err(EditorError::InvalidCommand(format!(
                "node at {:?} holds no text",
                path
            )))
        }
    };
    let offset = text.len();
    let mut full = path.to_vec();
    full.append(&mut text_path);
    Ok(Point::new(full, offset))
}
