//! Path-addressed queries and persistent updates over a node tree.
//!
//! Updates never mutate a node in place. They rebuild the nodes on the path
//! from `self` down to the target and reuse every other subtree.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{ModelError, ModelResult};
use crate::node::{byte_index, char_len, char_slice, Mark, Node, NodeProperties, Text};
use crate::path::{self, Path};

impl Node {
    /// Node at `path` relative to `self`
    pub fn get(&self, path: &[usize]) -> Option<&Node> {
        let mut node = self;
        for &index in path {
            node = node.child(index)?;
        }
        Some(node)
    }

    pub fn assert_node(&self, path: &[usize]) -> ModelResult<&Node> {
        self.get(path)
            .ok_or_else(|| ModelError::NodeNotFound(path.to_vec()))
    }

    pub fn assert_text(&self, path: &[usize]) -> ModelResult<&Text> {
        self.assert_node(path)?
            .as_text()
            .ok_or_else(|| ModelError::NotText(path.to_vec()))
    }

    /// Assert that the node at `path` can hold children
    pub fn assert_element(&self, path: &[usize]) -> ModelResult<&Node> {
        let node = self.assert_node(path)?;
        if node.is_text() {
            return Err(ModelError::NotElement(path.to_vec()));
        }
        Ok(node)
    }

    /// Path of the descendant with `key`; the empty path if `self` has it
    pub fn path_of_key(&self, key: &str) -> Option<Path> {
        if self.key() == key {
            return Some(Vec::new());
        }
        for (index, child) in self.children().iter().enumerate() {
            if let Some(mut rest) = child.path_of_key(key) {
                rest.insert(0, index);
                return Some(rest);
            }
        }
        None
    }

    pub fn assert_path_of_key(&self, key: &str) -> ModelResult<Path> {
        self.path_of_key(key)
            .ok_or_else(|| ModelError::KeyNotFound(key.to_string()))
    }

    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.path_of_key(key).and_then(|path| self.get(&path))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.path_of_key(key).is_some()
    }

    /// Keys of this node and every descendant
    pub fn keys(&self) -> HashSet<String> {
        let mut keys = HashSet::new();
        self.collect_keys(&mut keys);
        keys
    }

    fn collect_keys(&self, keys: &mut HashSet<String>) {
        keys.insert(self.key().to_string());
        for child in self.children() {
            child.collect_keys(keys);
        }
    }

    /// Paths of every descendant in document (pre-)order, excluding `self`
    pub fn descendant_paths(&self) -> Vec<Path> {
        let mut paths = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &mut Path, out: &mut Vec<Path>) {
        for (index, child) in self.children().iter().enumerate() {
            prefix.push(index);
            out.push(prefix.clone());
            child.collect_paths(prefix, out);
            prefix.pop();
        }
    }

    /// Every text node with its path, in document order
    pub fn texts(&self) -> Vec<(Path, &Text)> {
        let mut texts = Vec::new();
        self.collect_texts(&mut Vec::new(), &mut texts);
        texts
    }

    fn collect_texts<'a>(&'a self, prefix: &mut Path, out: &mut Vec<(Path, &'a Text)>) {
        match self {
            Node::Text(t) => out.push((prefix.clone(), t)),
            _ => {
                for (index, child) in self.children().iter().enumerate() {
                    prefix.push(index);
                    child.collect_texts(prefix, out);
                    prefix.pop();
                }
            }
        }
    }

    pub fn first_text(&self) -> Option<(Path, &Text)> {
        self.texts().into_iter().next()
    }

    pub fn last_text(&self) -> Option<(Path, &Text)> {
        self.texts().into_iter().last()
    }

    /// Last text that ends before the node at `path` starts
    pub fn previous_text(&self, path: &[usize]) -> Option<(Path, &Text)> {
        self.texts()
            .into_iter()
            .rev()
            .find(|(text_path, _)| path::is_before(text_path, path))
    }

    /// First text that starts after the node at `path` ends
    pub fn next_text(&self, path: &[usize]) -> Option<(Path, &Text)> {
        self.texts()
            .into_iter()
            .find(|(text_path, _)| path::is_after(text_path, path))
    }

    /// Nearest block at or above `path`
    pub fn closest_block(&self, path: &[usize]) -> Option<(Path, &Node)> {
        (0..=path.len()).rev().find_map(|depth| {
            let candidate = &path[..depth];
            match self.get(candidate) {
                Some(node) if node.is_block() => Some((candidate.to_vec(), node)),
                _ => None,
            }
        })
    }

    /// Nearest void element at or above `path`
    pub fn closest_void(&self, path: &[usize]) -> Option<(Path, &Node)> {
        (0..=path.len()).rev().find_map(|depth| {
            let candidate = &path[..depth];
            match self.get(candidate) {
                Some(node) if node.is_void() => Some((candidate.to_vec(), node)),
                _ => None,
            }
        })
    }

    /// Blocks that directly hold inline content, in document order
    pub fn leaf_blocks(&self) -> Vec<(Path, &Node)> {
        let mut blocks: Vec<(Path, &Node)> = Vec::new();
        for (text_path, _) in self.texts() {
            if let Some((block_path, block)) = self.closest_block(&text_path) {
                if blocks.last().map(|(p, _)| p != &block_path).unwrap_or(true) {
                    blocks.push((block_path, block));
                }
            }
        }
        blocks
    }

    /// Text offset of the start of the node at `path`, counted from the
    /// start of `self`.
    pub fn offset_of(&self, path: &[usize]) -> usize {
        self.texts()
            .into_iter()
            .take_while(|(text_path, _)| path::is_before(text_path, path))
            .map(|(_, text)| text.len())
            .sum()
    }

    // ----- persistent updates -----

    /// Rebuild the spine to `path`, replacing the node there with `f(node)`
    pub fn update_at<F>(&self, path: &[usize], f: F) -> ModelResult<Node>
    where
        F: FnOnce(&Node) -> ModelResult<Node>,
    {
        self.update_inner(path, 0, f)
    }

    fn update_inner<F>(&self, path: &[usize], depth: usize, f: F) -> ModelResult<Node>
    where
        F: FnOnce(&Node) -> ModelResult<Node>,
    {
        if depth == path.len() {
            return f(self);
        }
        let index = path[depth];
        let child = self
            .children()
            .get(index)
            .ok_or_else(|| ModelError::NodeNotFound(path.to_vec()))?;
        let updated = child.update_inner(path, depth + 1, f)?;
        let mut nodes = self.children().to_vec();
        nodes[index] = Arc::new(updated);
        Ok(self.with_children(nodes))
    }

    /// Replace the node at `path`
    pub fn replace_node(&self, path: &[usize], node: Node) -> ModelResult<Node> {
        self.update_at(path, |_| Ok(node))
    }

    /// Insert `node` so that it ends up at `path`
    pub fn insert_node(&self, path: &[usize], node: Node) -> ModelResult<Node> {
        let (parent_path, index) = split_last(path)?;
        self.assert_element(&parent_path)?;
        self.update_at(&parent_path, |parent| {
            let mut nodes = parent.children().to_vec();
            if index > nodes.len() {
                return Err(ModelError::NodeNotFound(path.to_vec()));
            }
            nodes.insert(index, Arc::new(node));
            Ok(parent.with_children(nodes))
        })
    }

    /// Remove the node at `path`
    pub fn remove_node(&self, path: &[usize]) -> ModelResult<Node> {
        let (parent_path, index) = split_last(path)?;
        self.assert_node(path)?;
        self.update_at(&parent_path, |parent| {
            let mut nodes = parent.children().to_vec();
            nodes.remove(index);
            Ok(parent.with_children(nodes))
        })
    }

    pub fn insert_text(&self, path: &[usize], offset: usize, text: &str) -> ModelResult<Node> {
        self.update_text(path, |node| {
            let len = node.len();
            if offset > len {
                return Err(ModelError::OffsetOutOfBounds {
                    path: path.to_vec(),
                    offset,
                    len,
                });
            }
            let mut next = node.clone();
            next.text.insert_str(byte_index(&node.text, offset), text);
            Ok(next)
        })
    }

    /// Remove `text` at `offset`, asserting that it is what the node holds
    pub fn remove_text(&self, path: &[usize], offset: usize, text: &str) -> ModelResult<Node> {
        self.update_text(path, |node| {
            let len = node.len();
            let end = offset + char_len(text);
            if end > len {
                return Err(ModelError::OffsetOutOfBounds {
                    path: path.to_vec(),
                    offset: end,
                    len,
                });
            }
            let found = char_slice(&node.text, offset, end);
            if found != text {
                return Err(ModelError::TextMismatch {
                    path: path.to_vec(),
                    offset,
                    expected: text.to_string(),
                    found: found.to_string(),
                });
            }
            let mut next = node.clone();
            next.text = format!(
                "{}{}",
                char_slice(&node.text, 0, offset),
                char_slice(&node.text, end, len)
            );
            Ok(next)
        })
    }

    pub fn add_mark(&self, path: &[usize], mark: &Mark) -> ModelResult<Node> {
        self.update_text(path, |node| {
            if node.has_mark(mark) {
                return Err(ModelError::InvalidOperation(format!(
                    "mark {:?} already present on {:?}",
                    mark.mark_type, path
                )));
            }
            let mut next = node.clone();
            next.marks.insert(mark.clone());
            Ok(next)
        })
    }

    pub fn remove_mark(&self, path: &[usize], mark: &Mark) -> ModelResult<Node> {
        self.update_text(path, |node| {
            if !node.has_mark(mark) {
                return Err(ModelError::InvalidOperation(format!(
                    "mark {:?} not present on {:?}",
                    mark.mark_type, path
                )));
            }
            let mut next = node.clone();
            next.marks.remove(mark);
            Ok(next)
        })
    }

    /// Swap `mark` for `replacement` on the text at `path`
    pub fn replace_mark(&self, path: &[usize], mark: &Mark, replacement: Mark) -> ModelResult<Node> {
        self.update_text(path, |node| {
            if !node.has_mark(mark) {
                return Err(ModelError::InvalidOperation(format!(
                    "mark {:?} not present on {:?}",
                    mark.mark_type, path
                )));
            }
            let mut next = node.clone();
            next.marks.remove(mark);
            next.marks.insert(replacement);
            Ok(next)
        })
    }

    fn update_text<F>(&self, path: &[usize], f: F) -> ModelResult<Node>
    where
        F: FnOnce(&Text) -> ModelResult<Text>,
    {
        self.update_at(path, |node| match node {
            Node::Text(text) => Ok(Node::Text(f(text)?)),
            _ => Err(ModelError::NotText(path.to_vec())),
        })
    }

    /// Merge the node at `path` into its previous sibling
    pub fn merge_node(&self, path: &[usize]) -> ModelResult<Node> {
        let (parent_path, index) = split_last(path)?;
        if index == 0 {
            return Err(ModelError::InvalidOperation(format!(
                "node at {:?} has no previous sibling to merge into",
                path
            )));
        }
        let previous_path = path::decrement(path, 1, None);
        let previous = self.assert_node(&previous_path)?;
        let node = self.assert_node(path)?;

        let merged = match (previous, node) {
            (Node::Text(a), Node::Text(b)) => {
                let mut text = a.clone();
                text.text.push_str(&b.text);
                Node::Text(text)
            }
            (a, b) if a.kind() == b.kind() => {
                let mut nodes = a.children().to_vec();
                nodes.extend(b.children().iter().cloned());
                a.with_children(nodes)
            }
            _ => {
                return Err(ModelError::InvalidOperation(format!(
                    "cannot merge {:?} into {:?}",
                    node.kind(),
                    previous.kind()
                )))
            }
        };

        self.update_at(&parent_path, |parent| {
            let mut nodes = parent.children().to_vec();
            nodes[index - 1] = Arc::new(merged);
            nodes.remove(index);
            Ok(parent.with_children(nodes))
        })
    }

    /// Split the node at `path` at `position`; the second half takes the key
    /// and properties given.
    pub fn split_node(
        &self,
        path: &[usize],
        position: usize,
        properties: &NodeProperties,
    ) -> ModelResult<Node> {
        let (parent_path, index) = split_last(path)?;
        let key = properties.key.clone().ok_or_else(|| {
            ModelError::InvalidOperation("split_node requires a key for the new node".to_string())
        })?;
        let node = self.assert_node(path)?;
        let length = node.length();
        if position > length {
            return Err(ModelError::OffsetOutOfBounds {
                path: path.to_vec(),
                offset: position,
                len: length,
            });
        }

        let (first, second) = match node {
            Node::Text(t) => {
                let mut first = t.clone();
                first.text = char_slice(&t.text, 0, position).to_string();
                let second = Node::Text(Text {
                    key,
                    text: char_slice(&t.text, position, length).to_string(),
                    marks: t.marks.clone(),
                });
                (Node::Text(first), second.with_properties(properties))
            }
            _ => {
                let children = node.children();
                let first = node.with_children(children[..position].to_vec());
                let second = node
                    .with_children(children[position..].to_vec())
                    .with_key(key)
                    .with_properties(properties);
                (first, second)
            }
        };

        self.update_at(&parent_path, |parent| {
            let mut nodes = parent.children().to_vec();
            nodes[index] = Arc::new(first);
            nodes.insert(index + 1, Arc::new(second));
            Ok(parent.with_children(nodes))
        })
    }
}

fn split_last(path: &[usize]) -> ModelResult<(Path, usize)> {
    match path.split_last() {
        Some((index, parent)) => Ok((parent.to_vec(), *index)),
        None => Err(ModelError::InvalidOperation(
            "the document root cannot be inserted, removed, merged or split".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Node {
        Node::document(
            "doc",
            vec![
                Node::block("p1", "paragraph", vec![Node::text("t1", "one")]),
                Node::block(
                    "p2",
                    "paragraph",
                    vec![
                        Node::text("t2", "tw"),
                        Node::inline("i", "link", vec![Node::text("t3", "o")]),
                        Node::text("t4", ""),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_get_and_path_of_key() {
        let doc = doc();
        assert_eq!(doc.get(&[1, 1, 0]).unwrap().key(), "t3");
        assert_eq!(doc.path_of_key("t3"), Some(vec![1, 1, 0]));
        assert_eq!(doc.path_of_key("doc"), Some(vec![]));
        assert!(doc.get(&[2]).is_none());
        assert!(matches!(doc.assert_text(&[1]), Err(ModelError::NotText(_))));
    }

    #[test]
    fn test_texts_in_document_order() {
        let doc = doc();
        let keys: Vec<&str> = doc.texts().iter().map(|(_, t)| t.key.as_str()).collect();
        assert_eq!(keys, vec!["t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn test_previous_and_next_text() {
        let doc = doc();
        assert_eq!(doc.previous_text(&[1, 0]).unwrap().1.key, "t1");
        assert_eq!(doc.previous_text(&[1]).unwrap().1.key, "t1");
        assert_eq!(doc.next_text(&[1, 1]).unwrap().1.key, "t4");
        assert!(doc.previous_text(&[0, 0]).is_none());
    }

    #[test]
    fn test_closest_block() {
        let doc = doc();
        let (path, block) = doc.closest_block(&[1, 1, 0]).unwrap();
        assert_eq!(path, vec![1]);
        assert_eq!(block.key(), "p2");
        assert_eq!(doc.leaf_blocks().len(), 2);
    }

    #[test]
    fn test_offset_of() {
        let doc = doc();
        let (_, block) = doc.closest_block(&[1, 0]).unwrap();
        assert_eq!(block.offset_of(&[1]), 2);
        assert_eq!(block.offset_of(&[2]), 3);
    }

    #[test]
    fn test_insert_and_remove_share_untouched_subtrees() {
        let doc = doc();
        let next = doc
            .insert_node(&[1], Node::block("p3", "paragraph", vec![]))
            .unwrap();

        assert_eq!(next.children().len(), 3);
        assert!(Arc::ptr_eq(&doc.children()[0], &next.children()[0]));
        assert!(Arc::ptr_eq(&doc.children()[1], &next.children()[2]));

        let removed = next.remove_node(&[1]).unwrap();
        assert_eq!(removed, doc);
    }

    #[test]
    fn test_insert_and_remove_text() {
        let doc = doc();
        let next = doc.insert_text(&[0, 0], 1, "X").unwrap();
        assert_eq!(next.get(&[0, 0]).unwrap().text_content(), "oXne");

        let back = next.remove_text(&[0, 0], 1, "X").unwrap();
        assert_eq!(back, doc);

        let err = next.remove_text(&[0, 0], 0, "X").unwrap_err();
        assert!(matches!(err, ModelError::TextMismatch { .. }));
    }

    #[test]
    fn test_split_and_merge_text() {
        let doc = doc();
        let properties = NodeProperties {
            key: Some("t1b".to_string()),
            ..NodeProperties::default()
        };
        let split = doc.split_node(&[0, 0], 1, &properties).unwrap();
        assert_eq!(split.get(&[0, 0]).unwrap().text_content(), "o");
        assert_eq!(split.get(&[0, 1]).unwrap().text_content(), "ne");
        assert_eq!(split.get(&[0, 1]).unwrap().key(), "t1b");

        let merged = split.merge_node(&[0, 1]).unwrap();
        assert_eq!(merged, doc);
    }

    #[test]
    fn test_split_requires_key() {
        let doc = doc();
        let err = doc.split_node(&[0, 0], 1, &NodeProperties::default()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidOperation(_)));
    }

    #[test]
    fn test_merge_rejects_mismatched_kinds() {
        let doc = doc();
        assert!(doc.merge_node(&[1, 1]).is_err());
        assert!(doc.merge_node(&[0]).is_err());
    }
}
