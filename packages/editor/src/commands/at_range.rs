//! Commands against an explicit range.
//!
//! Multi-step edits capture keys up front and look paths up again before
//! every step, so earlier steps can shift the tree freely. They run with
//! normalization suppressed and leave the repairs to the end of the batch.

use folio_model::{path, Mark, Node, NodeProperties, Path, Point, Range, Ranged};

use super::{offset_point, point_path, range_edges, Direction};
use crate::change::Change;
use crate::errors::{EditorError, EditorResult};

/// The slice `from..to` of the text at `path`
#[derive(Debug)]
struct TextSegment {
    path: Path,
    from: usize,
    to: usize,
    has_mark: bool,
}

impl<'a> Change<'a> {
    /// Insert `text` at the start of `range`, deleting its contents first.
    /// Text inside a void is ignored.
    pub fn insert_text_at_range(&mut self, range: &Range, text: &str) -> EditorResult<()> {
        self.without_normalizing(|change| {
            let start = change.delete_expanded(range)?;
            let path = point_path(&start)?;
            if change.value.document.closest_void(&path).is_some() {
                return Ok(());
            }
            change.insert_text_by_path(&path, start.offset, text)
        })
    }

    /// Delete everything inside `range`. When it spans blocks, the end block
    /// is merged into the start block.
    pub fn delete_at_range(&mut self, range: &Range) -> EditorResult<()> {
        if range.is_collapsed() {
            return Ok(());
        }
        let (start, end) = range_edges(&self.value.document, range)?;
        let start_path = point_path(&start)?;
        let end_path = point_path(&end)?;

        if start_path == end_path {
            return self.remove_text_by_path(&start_path, start.offset, end.offset - start.offset);
        }

        self.without_normalizing(|change| {
            change.delete_across(&start_path, start.offset, &end_path, end.offset)
        })
    }

    fn delete_across(
        &mut self,
        start_path: &[usize],
        start_offset: usize,
        end_path: &[usize],
        end_offset: usize,
    ) -> EditorResult<()> {
        let document = &self.value.document;
        let start_key = document.assert_text(start_path)?.key.clone();
        let start_len = document.assert_text(start_path)?.len();
        let end_key = document.assert_text(end_path)?.key.clone();
        let block_key = |path: &[usize]| {
            document
                .closest_block(path)
                .map(|(_, block)| block.key().to_string())
        };
        let start_block = block_key(start_path);
        let end_block = block_key(end_path);

        // Whole subtrees strictly between the two texts, outermost only.
        let between = |path: &[usize]| path::is_after(path, start_path) && path::is_before(path, end_path);
        let covered: Vec<String> = document
            .descendant_paths()
            .into_iter()
            .filter(|candidate| between(candidate) && !between(&path::lift(candidate)))
            .filter_map(|candidate| document.get(&candidate).map(|node| node.key().to_string()))
            .collect();

        self.remove_text_by_key(&end_key, 0, end_offset)?;
        self.remove_text_by_key(&start_key, start_offset, start_len - start_offset)?;
        for key in covered.iter().rev() {
            self.remove_node_by_key(key)?;
        }

        match (start_block, end_block) {
            (Some(start_block), Some(end_block)) if start_block != end_block => {
                self.join_blocks(&start_block, &end_block)
            }
            _ => Ok(()),
        }
    }

    /// Pull the content of `end` into `start` and drop what is left of it
    fn join_blocks(&mut self, start: &str, end: &str) -> EditorResult<()> {
        let document = &self.value.document;
        let start_path = document.assert_path_of_key(start)?;
        let end_path = document.assert_path_of_key(end)?;

        if path::lift(&start_path) == path::lift(&end_path)
            && path::increment(&start_path, 1, None) == end_path
        {
            return self.merge_node_by_path(&end_path);
        }

        let count = document.assert_node(&end_path)?.children().len();
        for _ in 0..count {
            let document = &self.value.document;
            let start_path = document.assert_path_of_key(start)?;
            let mut child = document.assert_path_of_key(end)?;
            child.push(0);
            let index = document.assert_node(&start_path)?.children().len();
            self.move_node_by_path(&child, &start_path, index)?;
        }

        // Remove the emptied block and any ancestors it leaves empty.
        let mut target = self.value.document.assert_path_of_key(end)?;
        loop {
            let parent = path::lift(&target);
            self.remove_node_by_path(&target)?;
            if parent.is_empty() || !self.value.document.assert_node(&parent)?.children().is_empty() {
                return Ok(());
            }
            target = parent;
        }
    }

    /// Delete `n` chars before a collapsed range, or the range itself when
    /// expanded
    pub fn delete_backward_at_range(&mut self, range: &Range, n: usize) -> EditorResult<()> {
        self.delete_by_chars(range, n, Direction::Backward)
    }

    /// Delete `n` chars after a collapsed range, or the range itself when
    /// expanded
    pub fn delete_forward_at_range(&mut self, range: &Range, n: usize) -> EditorResult<()> {
        self.delete_by_chars(range, n, Direction::Forward)
    }

    fn delete_by_chars(&mut self, range: &Range, n: usize, direction: Direction) -> EditorResult<()> {
        if range.is_expanded() {
            return self.delete_at_range(range);
        }
        if n == 0 {
            return Ok(());
        }

        let (point, _) = range_edges(&self.value.document, range)?;
        let path = point_path(&point)?;
        if let Some((void_path, _)) = self.value.document.closest_void(&path) {
            return self.remove_node_by_path(&void_path);
        }

        let Some(other) = offset_point(&self.value.document, &point, n, direction) else {
            return Ok(());
        };
        let target = match direction {
            Direction::Backward => Range::new(other, point),
            Direction::Forward => Range::new(point, other),
        };
        self.delete_at_range(&target)
    }

    /// Split the block holding the start of `range`, and `height - 1` more
    /// block ancestors above it
    pub fn split_block_at_range(&mut self, range: &Range, height: usize) -> EditorResult<()> {
        self.without_normalizing(|change| {
            let start = change.delete_expanded(range)?;
            let text_path = point_path(&start)?;
            let document = &change.value.document;

            let Some((mut ancestor, _)) = document.closest_block(&text_path) else {
                return Err(EditorError::InvalidCommand(format!(
                    "no block holds {:?}",
                    text_path
                )));
            };
            for _ in 1..height {
                let parent = path::lift(&ancestor);
                match document.get(&parent) {
                    Some(node) if node.is_block() => ancestor = parent,
                    _ => break,
                }
            }

            change.split_descendants_by_path(&ancestor, &text_path, start.offset)
        })
    }

    /// Insert `block` next to the block holding the start of `range`,
    /// splitting that block when the range sits in its middle. Returns the
    /// path the new block landed at.
    pub fn insert_block_at_range(&mut self, range: &Range, block: Node) -> EditorResult<Path> {
        if !block.is_block() {
            return Err(EditorError::InvalidCommand(format!(
                "expected a block, got {:?}",
                block.kind()
            )));
        }

        self.without_normalizing(|change| {
            let start = change.delete_expanded(range)?;
            let text_path = point_path(&start)?;
            let document = &change.value.document;
            let Some((block_path, current)) = document.closest_block(&text_path) else {
                return Err(EditorError::InvalidCommand(format!(
                    "no block holds {:?}",
                    text_path
                )));
            };

            let offset = current.offset_of(&text_path[block_path.len()..]) + start.offset;
            let at_start = offset == 0;
            let at_end = offset == current.text_len();
            let index = block_path.last().copied().unwrap_or(0);
            let parent = path::lift(&block_path);

            let index = if current.is_void() || current.text_len() == 0 || (at_end && !at_start) {
                index + 1
            } else if at_start {
                index
            } else {
                change.split_descendants_by_path(&block_path, &text_path, start.offset)?;
                index + 1
            };

            change.insert_node_by_path(&parent, index, block)?;
            let mut landed = parent;
            landed.push(index);
            Ok(landed)
        })
    }

    /// Insert `inline` at the start of `range`, splitting the text there.
    /// Returns the path the inline landed at, or `None` inside a void.
    pub fn insert_inline_at_range(&mut self, range: &Range, inline: Node) -> EditorResult<Option<Path>> {
        if !inline.is_inline() {
            return Err(EditorError::InvalidCommand(format!(
                "expected an inline, got {:?}",
                inline.kind()
            )));
        }

        self.without_normalizing(|change| {
            let start = change.delete_expanded(range)?;
            let text_path = point_path(&start)?;
            if change.value.document.closest_void(&text_path).is_some() {
                return Ok(None);
            }

            change.split_node_by_path(&text_path, start.offset, NodeProperties::default())?;
            let parent = path::lift(&text_path);
            let index = text_path.last().copied().unwrap_or(0) + 1;
            change.insert_node_by_path(&parent, index, inline)?;

            let mut landed = parent;
            landed.push(index);
            Ok(Some(landed))
        })
    }

    pub fn add_mark_at_range(&mut self, range: &Range, mark: Mark) -> EditorResult<()> {
        let segments = self.text_segments(range, &mark)?;
        self.without_normalizing(|change| {
            for segment in segments.iter().rev().filter(|segment| !segment.has_mark) {
                let path = change.isolate_segment(segment)?;
                change.add_mark_by_path(&path, mark.clone())?;
            }
            Ok(())
        })
    }

    pub fn remove_mark_at_range(&mut self, range: &Range, mark: Mark) -> EditorResult<()> {
        let segments = self.text_segments(range, &mark)?;
        self.without_normalizing(|change| {
            for segment in segments.iter().rev().filter(|segment| segment.has_mark) {
                let path = change.isolate_segment(segment)?;
                change.remove_mark_by_path(&path, mark.clone())?;
            }
            Ok(())
        })
    }

    /// Remove `mark` if every char in `range` has it, otherwise add it
    pub fn toggle_mark_at_range(&mut self, range: &Range, mark: Mark) -> EditorResult<()> {
        let segments = self.text_segments(range, &mark)?;
        if segments.is_empty() {
            return Ok(());
        }
        if segments.iter().all(|segment| segment.has_mark) {
            self.remove_mark_at_range(range, mark)
        } else {
            self.add_mark_at_range(range, mark)
        }
    }

    /// Set `properties` on every leaf block touched by `range`
    pub fn set_blocks_at_range(&mut self, range: &Range, properties: NodeProperties) -> EditorResult<()> {
        let (start, end) = range_edges(&self.value.document, range)?;
        let start_path = point_path(&start)?;
        let end_path = point_path(&end)?;

        let document = &self.value.document;
        let mut blocks: Vec<Path> = Vec::new();
        for (text_path, _) in document.texts() {
            if path::is_before(&text_path, &start_path) || path::is_after(&text_path, &end_path) {
                continue;
            }
            if let Some((block_path, _)) = document.closest_block(&text_path) {
                if blocks.last() != Some(&block_path) {
                    blocks.push(block_path);
                }
            }
        }

        self.without_normalizing(|change| {
            for block in &blocks {
                change.set_node_by_path(block, properties.clone())?;
            }
            Ok(())
        })
    }

    /// Delete an expanded range and return where its start now is
    fn delete_expanded(&mut self, range: &Range) -> EditorResult<Point> {
        let (start, _) = range_edges(&self.value.document, range)?;
        if range.is_expanded() {
            self.delete_at_range(range)?;
        }
        Ok(start)
    }

    /// Non-empty slices of every text inside `range`
    fn text_segments(&self, range: &Range, mark: &Mark) -> EditorResult<Vec<TextSegment>> {
        if range.is_collapsed() {
            return Ok(Vec::new());
        }
        let (start, end) = range_edges(&self.value.document, range)?;
        let start_path = point_path(&start)?;
        let end_path = point_path(&end)?;

        let segments = self
            .value
            .document
            .texts()
            .into_iter()
            .filter(|(text_path, _)| {
                !path::is_before(text_path, &start_path) && !path::is_after(text_path, &end_path)
            })
            .map(|(text_path, text)| {
                let from = if text_path == start_path { start.offset } else { 0 };
                let to = if text_path == end_path { end.offset } else { text.len() };
                TextSegment {
                    has_mark: text.has_mark(mark),
                    path: text_path,
                    from,
                    to,
                }
            })
            .filter(|segment| segment.from < segment.to)
            .collect();

        Ok(segments)
    }

    /// Split the text so `segment` stands alone; returns its path
    fn isolate_segment(&mut self, segment: &TextSegment) -> EditorResult<Path> {
        let len = self.value.document.assert_text(&segment.path)?.len();
        if segment.to < len {
            self.split_node_by_path(&segment.path, segment.to, NodeProperties::default())?;
        }
        if segment.from > 0 {
            self.split_node_by_path(&segment.path, segment.from, NodeProperties::default())?;
            return Ok(path::increment(&segment.path, 1, None));
        }
        Ok(segment.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::change::Change;
    use crate::config::EditorConfig;
    use crate::schema::Schema;
    use folio_model::{KeyGenerator, Mark, Node, NodeProperties, Point, Range, Value};

    fn value() -> Value {
        Value::new(Node::document(
            "doc",
            vec![
                Node::block("a", "paragraph", vec![Node::text("t0", "one")]),
                Node::block("b", "paragraph", vec![Node::text("t1", "two")]),
                Node::block(
                    "q",
                    "quote",
                    vec![Node::block("c", "paragraph", vec![Node::text("t2", "three")])],
                ),
            ],
        ))
        .unwrap()
    }

    fn range(anchor: (Vec<usize>, usize), focus: (Vec<usize>, usize)) -> Range {
        Range::new(Point::new(anchor.0, anchor.1), Point::new(focus.0, focus.1))
    }

    #[test]
    fn test_delete_within_text() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.delete_at_range(&range((vec![0, 0], 1), (vec![0, 0], 3))).unwrap();
        assert_eq!(change.value().document.get(&[0]).unwrap().text_content(), "o");
    }

    #[test]
    fn test_delete_across_sibling_blocks_merges() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        // Backward range: anchor after focus.
        change.delete_at_range(&range((vec![1, 0], 1), (vec![0, 0], 2))).unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.children().len(), 2);
        assert_eq!(doc.get(&[0]).unwrap().text_content(), "onwo");
        assert_eq!(doc.get(&[0]).unwrap().children().len(), 1);
    }

    #[test]
    fn test_delete_into_nested_block_prunes_ancestors() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.delete_at_range(&range((vec![0, 0], 1), (vec![2, 0, 0], 2))).unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.children().len(), 1);
        assert_eq!(doc.text_content(), "oree");
        assert!(!doc.has_key("q"));
    }

    #[test]
    fn test_delete_backward_merges_blocks() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change
            .delete_backward_at_range(&Range::collapsed(Point::new(vec![1, 0], 0)), 1)
            .unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.get(&[0]).unwrap().text_content(), "onetwo");
        assert_eq!(doc.children().len(), 2);
    }

    #[test]
    fn test_split_block_with_height() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change
            .split_block_at_range(&Range::collapsed(Point::new(vec![2, 0, 0], 2)), 2)
            .unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.children().len(), 4);
        assert_eq!(doc.get(&[2]).unwrap().text_content(), "th");
        assert_eq!(doc.get(&[3]).unwrap().node_type(), Some("quote"));
        assert_eq!(doc.get(&[3]).unwrap().text_content(), "ree");
    }

    #[test]
    fn test_insert_block_positions() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        let heading = || Node::block("h", "heading", vec![Node::text("ht", "H")]);
        let at_start = change
            .insert_block_at_range(&Range::collapsed(Point::new(vec![0, 0], 0)), heading())
            .unwrap();
        assert_eq!(at_start, vec![0]);

        let middle = change
            .insert_block_at_range(&Range::collapsed(Point::new(vec![2, 0], 1)), heading())
            .unwrap();
        assert_eq!(middle, vec![3]);

        let doc = &change.value().document;
        let texts: Vec<String> = doc.children().iter().map(|c| c.text_content()).collect();
        assert_eq!(texts, vec!["H", "one", "t", "H", "wo", "three"]);
    }

    #[test]
    fn test_insert_inline_splits_text() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        let link = Node::inline("l", "link", vec![Node::text("lt", "X")]);
        let landed = change
            .insert_inline_at_range(&Range::collapsed(Point::new(vec![0, 0], 1)), link)
            .unwrap();
        assert_eq!(landed, Some(vec![0, 1]));

        let block = change.value().document.get(&[0]).unwrap();
        assert_eq!(block.children().len(), 3);
        assert_eq!(block.text_content(), "oXne");
    }

    #[test]
    fn test_toggle_mark_splits_at_edges() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);
        let bold = Mark::new("bold");

        let target = range((vec![0, 0], 1), (vec![1, 0], 2));
        change.toggle_mark_at_range(&target, bold.clone()).unwrap();

        let doc = &change.value().document;
        let first = doc.get(&[0]).unwrap();
        assert_eq!(first.children().len(), 2);
        assert!(!doc.assert_text(&[0, 0]).unwrap().has_mark(&bold));
        assert_eq!(doc.assert_text(&[0, 1]).unwrap().text, "ne");
        assert!(doc.assert_text(&[0, 1]).unwrap().has_mark(&bold));
        assert_eq!(doc.assert_text(&[1, 0]).unwrap().text, "tw");
        assert!(doc.assert_text(&[1, 0]).unwrap().has_mark(&bold));

        // Toggling the same range again restores the plain texts.
        let target = range((vec![0, 1], 0), (vec![1, 0], 2));
        change.toggle_mark_at_range(&target, bold.clone()).unwrap();
        let doc = &change.value().document;
        assert_eq!(doc.get(&[0]).unwrap().children().len(), 1);
        assert_eq!(doc.get(&[1]).unwrap().children().len(), 1);
        assert!(doc.texts().iter().all(|(_, text)| text.marks.is_empty()));
    }

    #[test]
    fn test_set_blocks_touches_leaf_blocks_in_range() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        let target = range((vec![1, 0], 0), (vec![2, 0, 0], 1));
        change
            .set_blocks_at_range(&target, NodeProperties::node_type("heading"))
            .unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.get(&[0]).unwrap().node_type(), Some("paragraph"));
        assert_eq!(doc.get(&[1]).unwrap().node_type(), Some("heading"));
        assert_eq!(doc.get(&[2]).unwrap().node_type(), Some("quote"));
        assert_eq!(doc.get(&[2, 0]).unwrap().node_type(), Some("heading"));
    }
}
