//! Range commands applied at the current selection

use folio_model::{Mark, Node, NodeProperties, Point, Ranged};

use super::{end_of_node, point_path};
use crate::change::Change;
use crate::errors::EditorResult;

impl<'a> Change<'a> {
    /// Type `text` over the selection and leave the cursor after it
    pub fn insert_text(&mut self, text: &str) -> EditorResult<()> {
        let range = self.selection_range()?;
        let start = range.start().clone();
        self.without_normalizing(|change| {
            change.insert_text_at_range(&range, text)?;
            let path = point_path(&start)?;
            if change.value.document.closest_void(&path).is_none() {
                change.move_to(Point::new(path, start.offset + folio_model::char_len(text)))?;
            }
            Ok(())
        })
    }

    pub fn delete(&mut self) -> EditorResult<()> {
        let range = self.selection_range()?;
        let start = range.start().clone();
        self.without_normalizing(|change| {
            change.delete_at_range(&range)?;
            change.move_to(start)
        })
    }

    pub fn delete_backward(&mut self, n: usize) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.without_normalizing(|change| {
            change.delete_backward_at_range(&range, n)?;
            change.collapse_to_start()
        })
    }

    pub fn delete_forward(&mut self, n: usize) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.without_normalizing(|change| {
            change.delete_forward_at_range(&range, n)?;
            change.collapse_to_start()
        })
    }

    pub fn split_block(&mut self, height: usize) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.without_normalizing(|change| {
            change.split_block_at_range(&range, height)?;
            change.collapse_to_end()
        })
    }

    /// Insert `block` at the selection and move the cursor to its end
    pub fn insert_block(&mut self, block: Node) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.without_normalizing(|change| {
            let landed = change.insert_block_at_range(&range, block)?;
            let point = end_of_node(&change.value.document, &landed)?;
            change.move_to(point)
        })
    }

    /// Insert `inline` at the selection and move the cursor to its end
    pub fn insert_inline(&mut self, inline: Node) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.without_normalizing(|change| {
            let Some(landed) = change.insert_inline_at_range(&range, inline)? else {
                return Ok(());
            };
            // An inline with no text yet gets one from normalization.
            match end_of_node(&change.value.document, &landed) {
                Ok(point) => change.move_to(point),
                Err(_) => Ok(()),
            }
        })
    }

    pub fn add_mark(&mut self, mark: Mark) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.add_mark_at_range(&range, mark)
    }

    pub fn remove_mark(&mut self, mark: Mark) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.remove_mark_at_range(&range, mark)
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.toggle_mark_at_range(&range, mark)
    }

    pub fn set_blocks(&mut self, properties: NodeProperties) -> EditorResult<()> {
        let range = self.selection_range()?;
        self.set_blocks_at_range(&range, properties)
    }
}
