//! Commands that move the selection without touching the document

use folio_model::{Operation, Point, Range, Ranged, SelectionProperties};

use super::{offset_point, Direction};
use crate::change::Change;
use crate::errors::{EditorError, EditorResult};

impl<'a> Change<'a> {
    /// Set the fields of `properties` that differ from the current
    /// selection. Nothing is applied when none differ.
    pub fn select(&mut self, properties: SelectionProperties) -> EditorResult<()> {
        let current = &self.value.selection;
        let changed = SelectionProperties {
            anchor: properties.anchor.filter(|anchor| anchor != &current.anchor),
            focus: properties.focus.filter(|focus| focus != &current.focus),
            is_focused: properties.is_focused.filter(|focused| *focused != current.is_focused),
        };
        if changed == SelectionProperties::default() {
            return Ok(());
        }

        let properties = current.pick(&changed);
        self.apply_operation(Operation::SetSelection {
            properties,
            new_properties: changed,
        })
    }

    pub fn select_range(&mut self, range: &impl Ranged) -> EditorResult<()> {
        self.select(SelectionProperties::range(range))
    }

    pub fn deselect(&mut self) -> EditorResult<()> {
        self.select(SelectionProperties {
            anchor: Some(Point::unset()),
            focus: Some(Point::unset()),
            is_focused: Some(false),
        })
    }

    pub fn focus(&mut self) -> EditorResult<()> {
        self.select(SelectionProperties {
            is_focused: Some(true),
            ..SelectionProperties::default()
        })
    }

    pub fn blur(&mut self) -> EditorResult<()> {
        self.select(SelectionProperties {
            is_focused: Some(false),
            ..SelectionProperties::default()
        })
    }

    /// Collapse the selection onto `point`
    pub fn move_to(&mut self, point: Point) -> EditorResult<()> {
        self.select_range(&Range::collapsed(point))
    }

    pub fn move_to_start_of_document(&mut self) -> EditorResult<()> {
        let point = Point::start_of(&self.value.document);
        self.move_to(point)
    }

    pub fn move_to_end_of_document(&mut self) -> EditorResult<()> {
        let point = Point::end_of(&self.value.document);
        self.move_to(point)
    }

    pub fn collapse_to_start(&mut self) -> EditorResult<()> {
        let point = self.selection_range()?.start().clone();
        self.move_to(point)
    }

    pub fn collapse_to_end(&mut self) -> EditorResult<()> {
        let point = self.selection_range()?.end().clone();
        self.move_to(point)
    }

    pub fn collapse_to_anchor(&mut self) -> EditorResult<()> {
        let point = self.selection_range()?.anchor;
        self.move_to(point)
    }

    pub fn collapse_to_focus(&mut self) -> EditorResult<()> {
        let point = self.selection_range()?.focus;
        self.move_to(point)
    }

    /// Move both ends of the selection `n` chars back
    pub fn move_backward(&mut self, n: usize) -> EditorResult<()> {
        self.move_by(n, Direction::Backward)
    }

    /// Move both ends of the selection `n` chars forward
    pub fn move_forward(&mut self, n: usize) -> EditorResult<()> {
        self.move_by(n, Direction::Forward)
    }

    fn move_by(&mut self, n: usize, direction: Direction) -> EditorResult<()> {
        let range = self.selection_range()?;
        let document = &self.value.document;
        let walk = |point: &Point| {
            offset_point(document, point, n, direction).ok_or_else(|| {
                EditorError::InvalidCommand(format!(
                    "selection point {:?} is not inside a text",
                    point.path
                ))
            })
        };
        let moved = Range::new(walk(&range.anchor)?, walk(&range.focus)?);
        self.select_range(&moved)
    }

    /// The current selection as a range, or an error when it is unset
    pub(crate) fn selection_range(&self) -> EditorResult<Range> {
        let selection = &self.value.selection;
        if selection.is_unset() {
            return Err(EditorError::InvalidCommand(
                "the selection is unset".to_string(),
            ));
        }
        Ok(selection.to_range())
    }
}

#[cfg(test)]
mod tests {
    use crate::change::Change;
    use crate::config::EditorConfig;
    use crate::schema::Schema;
    use folio_model::{KeyGenerator, Node, Operation, Point, Range, Selection, Value};

    fn value() -> Value {
        Value::new(Node::document(
            "doc",
            vec![
                Node::block("a", "paragraph", vec![Node::text("t0", "one")]),
                Node::block("b", "paragraph", vec![Node::text("t1", "two")]),
            ],
        ))
        .unwrap()
        .with_selection(Selection::new(
            Point::new(vec![0, 0], 1),
            Point::new(vec![1, 0], 2),
        ))
    }

    #[test]
    fn test_select_only_emits_changed_fields() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change
            .select_range(&Range::new(Point::new(vec![0, 0], 1), Point::new(vec![1, 0], 0)))
            .unwrap();
        change.focus().unwrap();
        change.focus().unwrap();

        assert_eq!(change.operations().len(), 2);
        match &change.operations()[0] {
            Operation::SetSelection { properties, new_properties } => {
                assert!(new_properties.anchor.is_none());
                assert_eq!(new_properties.focus, Some(Point::new(vec![1, 0], 0)));
                assert_eq!(properties.focus, Some(Point::new(vec![1, 0], 2)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(change.value().selection.is_focused);
    }

    #[test]
    fn test_collapse_and_move() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.collapse_to_end().unwrap();
        change.move_backward(3).unwrap();
        assert_eq!(
            change.value().selection,
            Selection::collapsed(Point::new(vec![0, 0], 3))
        );

        change.move_to_end_of_document().unwrap();
        assert_eq!(
            change.value().selection,
            Selection::collapsed(Point::new(vec![1, 0], 3))
        );

        change.deselect().unwrap();
        assert!(change.collapse_to_start().is_err());
    }
}
