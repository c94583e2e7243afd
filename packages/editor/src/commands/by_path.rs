//! Commands addressed by path or by key.
//!
//! Each command reads what it needs from the live document (payloads for
//! removals, pre-images for `set_*`) and turns it into one or more
//! operations, so callers never build invertible operations by hand.

use folio_model::{
    char_slice, path, Data, Decoration, Mark, MarkProperties, Node, NodeProperties, Path,
    ValueProperties,
};

use crate::change::{unused_key, Change};
use crate::errors::{EditorError, EditorResult};
use folio_model::{Affinity, Operation};

impl<'a> Change<'a> {
    fn path_of_key(&self, key: &str) -> EditorResult<Path> {
        Ok(self.value.document.assert_path_of_key(key)?)
    }

    /// Insert `node` as child `index` of the element at `parent`. Keys that
    /// collide with the document are regenerated for the whole subtree.
    pub fn insert_node_by_path(&mut self, parent: &[usize], index: usize, node: Node) -> EditorResult<()> {
        let mut taken = self.value.document.keys();
        let collides = node.keys().iter().any(|key| taken.contains(key));
        let node = if collides {
            let keys = &mut *self.keys;
            node.regenerate_keys(&mut || {
                let key = unused_key(keys, |key| taken.contains(key))?;
                taken.insert(key.clone());
                Ok::<_, EditorError>(key)
            })?
        } else {
            node
        };

        let mut path = parent.to_vec();
        path.push(index);
        self.apply_operation(Operation::InsertNode { path, node })
    }

    pub fn insert_node_by_key(&mut self, parent_key: &str, index: usize, node: Node) -> EditorResult<()> {
        let parent = self.path_of_key(parent_key)?;
        self.insert_node_by_path(&parent, index, node)
    }

    pub fn remove_node_by_path(&mut self, path: &[usize]) -> EditorResult<()> {
        let node = self.value.document.assert_node(path)?.clone();
        self.apply_operation(Operation::RemoveNode {
            path: path.to_vec(),
            node,
        })
    }

    pub fn remove_node_by_key(&mut self, key: &str) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.remove_node_by_path(&path)
    }

    /// Move the node at `path` to child `index` of the element at
    /// `new_parent`; both are read against the current document
    pub fn move_node_by_path(&mut self, path: &[usize], new_parent: &[usize], index: usize) -> EditorResult<()> {
        self.value.document.assert_element(new_parent)?;
        let mut new_path = new_parent.to_vec();
        new_path.push(index);
        self.apply_operation(Operation::MoveNode {
            path: path.to_vec(),
            new_path,
        })
    }

    pub fn move_node_by_key(&mut self, key: &str, new_parent_key: &str, index: usize) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        let new_parent = self.path_of_key(new_parent_key)?;
        self.move_node_by_path(&path, &new_parent, index)
    }

    /// Merge the node at `path` into its previous sibling
    pub fn merge_node_by_path(&mut self, path: &[usize]) -> EditorResult<()> {
        let previous_path = match path.last() {
            Some(&index) if index > 0 => path::decrement(path, 1, None),
            _ => {
                return Err(EditorError::InvalidCommand(format!(
                    "node at {:?} has no previous sibling to merge into",
                    path
                )))
            }
        };
        let document = &self.value.document;
        let position = document.assert_node(&previous_path)?.length();
        let properties = document.assert_node(path)?.properties();

        self.apply_operation(Operation::MergeNode {
            path: path.to_vec(),
            position,
            properties,
        })
    }

    pub fn merge_node_by_key(&mut self, key: &str) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.merge_node_by_path(&path)
    }

    /// Split the node at `path` at `position`. The second half gets a fresh
    /// key unless `properties` names one.
    pub fn split_node_by_path(
        &mut self,
        path: &[usize],
        position: usize,
        properties: NodeProperties,
    ) -> EditorResult<()> {
        let mut properties = properties;
        if properties.key.is_none() {
            properties.key = Some(self.generate_key()?);
        }
        self.apply_operation(Operation::SplitNode {
            path: path.to_vec(),
            position,
            properties,
            affinity: Affinity::Forward,
        })
    }

    pub fn split_node_by_key(&mut self, key: &str, position: usize) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.split_node_by_path(&path, position, NodeProperties::default())
    }

    /// Split the text at `text_path` at `offset`, then every ancestor up to
    /// and including the one at `ancestor`, each right after the half that
    /// was just split off
    pub fn split_descendants_by_path(
        &mut self,
        ancestor: &[usize],
        text_path: &[usize],
        offset: usize,
    ) -> EditorResult<()> {
        if !path::is_above(ancestor, text_path) {
            return Err(EditorError::InvalidCommand(format!(
                "{:?} is not an ancestor of {:?}",
                ancestor, text_path
            )));
        }

        self.without_normalizing(|change| {
            let mut target = text_path.to_vec();
            let mut position = offset;
            loop {
                change.split_node_by_path(&target, position, NodeProperties::default())?;
                if target == ancestor {
                    return Ok(());
                }
                position = target.last().map(|index| index + 1).unwrap_or(0);
                target = path::lift(&target);
            }
        })
    }

    pub fn split_descendants_by_key(&mut self, key: &str, text_key: &str, offset: usize) -> EditorResult<()> {
        let ancestor = self.path_of_key(key)?;
        let text_path = self.path_of_key(text_key)?;
        self.split_descendants_by_path(&ancestor, &text_path, offset)
    }

    pub fn insert_text_by_path(&mut self, path: &[usize], offset: usize, text: &str) -> EditorResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.apply_operation(Operation::InsertText {
            path: path.to_vec(),
            offset,
            text: text.to_string(),
            marks: None,
            affinity: Affinity::Forward,
        })
    }

    pub fn insert_text_by_key(&mut self, key: &str, offset: usize, text: &str) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.insert_text_by_path(&path, offset, text)
    }

    /// Remove `length` chars starting at `offset`
    pub fn remove_text_by_path(&mut self, path: &[usize], offset: usize, length: usize) -> EditorResult<()> {
        if length == 0 {
            return Ok(());
        }
        let node = self.value.document.assert_text(path)?;
        let end = offset + length;
        if end > node.len() {
            return Err(folio_model::ModelError::OffsetOutOfBounds {
                path: path.to_vec(),
                offset: end,
                len: node.len(),
            }
            .into());
        }
        let text = char_slice(&node.text, offset, end).to_string();
        self.apply_operation(Operation::RemoveText {
            path: path.to_vec(),
            offset,
            text,
        })
    }

    pub fn remove_text_by_key(&mut self, key: &str, offset: usize, length: usize) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.remove_text_by_path(&path, offset, length)
    }

    pub fn add_mark_by_path(&mut self, path: &[usize], mark: Mark) -> EditorResult<()> {
        let text = self.value.document.assert_text(path)?;
        if text.has_mark(&mark) {
            return Ok(());
        }
        let length = text.len();
        self.apply_operation(Operation::AddMark {
            path: path.to_vec(),
            offset: 0,
            length,
            mark,
        })
    }

    pub fn add_mark_by_key(&mut self, key: &str, mark: Mark) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.add_mark_by_path(&path, mark)
    }

    pub fn remove_mark_by_path(&mut self, path: &[usize], mark: Mark) -> EditorResult<()> {
        let text = self.value.document.assert_text(path)?;
        if !text.has_mark(&mark) {
            return Ok(());
        }
        let length = text.len();
        self.apply_operation(Operation::RemoveMark {
            path: path.to_vec(),
            offset: 0,
            length,
            mark,
        })
    }

    pub fn remove_mark_by_key(&mut self, key: &str, mark: Mark) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.remove_mark_by_path(&path, mark)
    }

    /// Update the fields of `mark` on the text at `path`
    pub fn set_mark_by_path(
        &mut self,
        path: &[usize],
        mark: Mark,
        properties: MarkProperties,
    ) -> EditorResult<()> {
        let length = self.value.document.assert_text(path)?.len();
        self.apply_operation(Operation::SetMark {
            path: path.to_vec(),
            offset: 0,
            length,
            mark,
            properties,
        })
    }

    pub fn set_mark_by_key(
        &mut self,
        key: &str,
        mark: Mark,
        properties: MarkProperties,
    ) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.set_mark_by_path(&path, mark, properties)
    }

    /// Set properties on the node at `path`, capturing the pre-image for undo
    pub fn set_node_by_path(&mut self, path: &[usize], properties: NodeProperties) -> EditorResult<()> {
        let node = self.value.document.assert_node(path)?;
        let previous = node.pick_properties(&properties);
        if previous == properties {
            return Ok(());
        }
        self.apply_operation(Operation::SetNode {
            path: path.to_vec(),
            properties: previous,
            new_properties: properties,
        })
    }

    pub fn set_node_by_key(&mut self, key: &str, properties: NodeProperties) -> EditorResult<()> {
        let path = self.path_of_key(key)?;
        self.set_node_by_path(&path, properties)
    }

    /// Replace the value-level fields present in `properties`
    pub fn set_value(&mut self, properties: ValueProperties) -> EditorResult<()> {
        let previous = self.value.pick(&properties);
        if previous == properties {
            return Ok(());
        }
        self.apply_operation(Operation::SetValue {
            properties: previous,
            new_properties: properties,
        })
    }

    pub fn set_data(&mut self, data: Data) -> EditorResult<()> {
        self.set_value(ValueProperties {
            data: Some(data),
            decorations: None,
        })
    }

    pub fn set_decorations(&mut self, decorations: Vec<Decoration>) -> EditorResult<()> {
        self.set_value(ValueProperties {
            data: None,
            decorations: Some(decorations),
        })
    }

    pub fn add_decoration(&mut self, decoration: Decoration) -> EditorResult<()> {
        let mut decorations = self.value.decorations.clone();
        decorations.push(decoration);
        self.set_decorations(decorations)
    }

    pub fn clear_decorations(&mut self) -> EditorResult<()> {
        self.set_decorations(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use crate::change::Change;
    use crate::config::EditorConfig;
    use crate::schema::Schema;
    use folio_model::{KeyGenerator, Mark, MarkProperties, Node, NodeProperties, Operation, Value};

    fn value() -> Value {
        Value::new(Node::document(
            "doc",
            vec![
                Node::block(
                    "q",
                    "quote",
                    vec![Node::block("p", "paragraph", vec![Node::text("t", "hello")])],
                ),
                Node::block("p2", "paragraph", vec![Node::text("t2", "world")]),
            ],
        ))
        .unwrap()
    }

    #[test]
    fn test_insert_regenerates_colliding_keys() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        let duplicate = Node::block("p2", "paragraph", vec![Node::text("fresh", "again")]);
        change.insert_node_by_path(&[], 2, duplicate).unwrap();

        let inserted = change.value().document.get(&[2]).unwrap();
        assert_ne!(inserted.key(), "p2");
        assert_ne!(inserted.children()[0].key(), "fresh");
        assert_eq!(inserted.text_content(), "again");
    }

    #[test]
    fn test_regenerated_keys_skip_keys_in_use() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let doc = Node::document(
            "0",
            vec![Node::block("1", "paragraph", vec![Node::text("2", "abc")])],
        );
        let mut change = Change::new(Value::new(doc).unwrap(), &schema, &mut keys, &config);

        let duplicate = Node::block("1", "paragraph", vec![Node::text("9", "def")]);
        change.insert_node_by_path(&[], 1, duplicate).unwrap();

        let doc = &change.value().document;
        let inserted = doc.get(&[1]).unwrap();
        assert_eq!(inserted.key(), "3");
        assert_eq!(inserted.children()[0].key(), "4");
        assert_eq!(doc.keys().len(), doc.descendant_paths().len() + 1);
        assert_eq!(doc.path_of_key("0"), Some(vec![]));
        assert_eq!(doc.path_of_key("1"), Some(vec![0]));
    }

    #[test]
    fn test_split_descendants_up_to_ancestor() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.split_descendants_by_key("q", "t", 2).unwrap();

        let doc = &change.value().document;
        assert_eq!(doc.children().len(), 3);
        assert_eq!(doc.get(&[0]).unwrap().text_content(), "he");
        assert_eq!(doc.get(&[1]).unwrap().text_content(), "llo");
        assert_eq!(doc.get(&[1]).unwrap().node_type(), Some("quote"));
        assert_eq!(doc.get(&[1, 0]).unwrap().node_type(), Some("paragraph"));
    }

    #[test]
    fn test_set_node_captures_pre_image() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.set_node_by_key("p2", NodeProperties::node_type("heading")).unwrap();
        change.set_node_by_key("p2", NodeProperties::node_type("heading")).unwrap();

        assert_eq!(change.operations().len(), 1);
        match &change.operations()[0] {
            folio_model::Operation::SetNode { properties, .. } => {
                assert_eq!(properties.node_type.as_deref(), Some("paragraph"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_mark_and_undo() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let before = value();
        let mut change = Change::new(before.clone(), &schema, &mut keys, &config);

        change.add_mark_by_key("t2", Mark::new("bold")).unwrap();
        change
            .set_mark_by_key(
                "t2",
                Mark::new("bold"),
                MarkProperties {
                    mark_type: Some("strong".to_string()),
                    data: None,
                },
            )
            .unwrap();

        let text = change.value().document.assert_text(&[1, 0]).unwrap();
        assert!(text.has_mark(&Mark::new("strong")));
        assert!(!text.has_mark(&Mark::new("bold")));

        let inverses: Vec<Operation> = change
            .operations()
            .iter()
            .rev()
            .map(Operation::invert)
            .collect();
        change.apply_operations(inverses).unwrap();
        assert_eq!(change.value().document, before.document);
    }

    #[test]
    fn test_remove_text_reads_payload() {
        let schema = Schema::new();
        let config = EditorConfig::default();
        let mut keys = KeyGenerator::new();
        let mut change = Change::new(value(), &schema, &mut keys, &config);

        change.remove_text_by_key("t2", 1, 3).unwrap();
        change.add_mark_by_key("t2", Mark::new("bold")).unwrap();

        let text = change.value().document.assert_text(&[1, 0]).unwrap();
        assert_eq!(text.text, "wd");
        assert!(text.has_mark(&Mark::new("bold")));
        assert!(change.remove_text_by_key("t2", 1, 5).is_err());
    }
}
