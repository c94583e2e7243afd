//! # Document Nodes
//!
//! Immutable tree nodes. A document is a tree of four node kinds:
//!
//! ```text
//! Document ─┬─ Block ─┬─ Text
//!           │         ├─ Inline ── Text
//!           │         └─ Text
//!           └─ Block ─── Block ── Text
//! ```
//!
//! Children are shared through `Arc`, so an edit rebuilds only the spine from
//! the root to the edited node and every older tree stays valid.
//!
//! Marks belong to a whole text node. Runs with different formatting are
//! separate sibling text nodes.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Free-form annotation map
pub type Data = BTreeMap<String, serde_json::Value>;

/// A canonical, ordered set of marks
pub type MarkSet = BTreeSet<Mark>;

/// Persisted inline formatting (bold, italic, link data, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "MarkJson", from = "MarkJson")]
pub struct Mark {
    pub mark_type: String,
    pub data: Data,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "lowercase")]
enum MarkJson {
    Mark {
        #[serde(rename = "type")]
        mark_type: String,
        #[serde(default)]
        data: Data,
    },
}

impl From<Mark> for MarkJson {
    fn from(mark: Mark) -> Self {
        MarkJson::Mark {
            mark_type: mark.mark_type,
            data: mark.data,
        }
    }
}

impl From<MarkJson> for Mark {
    fn from(json: MarkJson) -> Self {
        let MarkJson::Mark { mark_type, data } = json;
        Mark { mark_type, data }
    }
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            data: Data::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    /// Copy of this mark with `properties` merged over it
    pub fn merge(&self, properties: &MarkProperties) -> Mark {
        Mark {
            mark_type: properties
                .mark_type
                .clone()
                .unwrap_or_else(|| self.mark_type.clone()),
            data: properties.data.clone().unwrap_or_else(|| self.data.clone()),
        }
    }

    /// This mark's current values for the fields present in `properties`
    pub fn pick(&self, properties: &MarkProperties) -> MarkProperties {
        MarkProperties {
            mark_type: properties.mark_type.as_ref().map(|_| self.mark_type.clone()),
            data: properties.data.as_ref().map(|_| self.data.clone()),
        }
    }
}

impl Ord for Mark {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mark_type.cmp(&other.mark_type).then_with(|| {
            let ours = self.data.iter().map(|(k, v)| (k, v.to_string()));
            let theirs = other.data.iter().map(|(k, v)| (k, v.to_string()));
            ours.cmp(theirs)
        })
    }
}

impl PartialOrd for Mark {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Partial update for a mark
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkProperties {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Text leaf
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub key: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub marks: MarkSet,
}

impl Text {
    pub fn len(&self) -> usize {
        char_len(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }
}

/// Document, block or inline node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub key: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub node_type: String,
    #[serde(default)]
    pub data: Data,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_void: bool,
    #[serde(default)]
    pub nodes: Vec<Arc<Node>>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// The kind of a node, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Block,
    Inline,
    Text,
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "lowercase")]
pub enum Node {
    Document(Element),
    Block(Element),
    Inline(Element),
    Text(Text),
}

/// Properties that can be set on a node, or that describe the node created
/// by a split.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_void: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<MarkSet>,
}

impl NodeProperties {
    pub fn node_type(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            ..Self::default()
        }
    }

    pub fn data(data: Data) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none()
            && self.node_type.is_none()
            && self.data.is_none()
            && self.is_void.is_none()
            && self.marks.is_none()
    }
}

impl Node {
    pub fn document(key: impl Into<String>, nodes: Vec<Node>) -> Node {
        Node::Document(Element::new(key, "", nodes))
    }

    pub fn block(key: impl Into<String>, node_type: impl Into<String>, nodes: Vec<Node>) -> Node {
        Node::Block(Element::new(key, node_type, nodes))
    }

    pub fn inline(key: impl Into<String>, node_type: impl Into<String>, nodes: Vec<Node>) -> Node {
        Node::Inline(Element::new(key, node_type, nodes))
    }

    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Node {
        Node::Text(Text {
            key: key.into(),
            text: text.into(),
            marks: MarkSet::new(),
        })
    }

    pub fn text_with_marks(
        key: impl Into<String>,
        text: impl Into<String>,
        marks: impl IntoIterator<Item = Mark>,
    ) -> Node {
        Node::Text(Text {
            key: key.into(),
            text: text.into(),
            marks: marks.into_iter().collect(),
        })
    }

    /// Set `isVoid` on an element; texts are returned unchanged
    pub fn with_void(mut self, is_void: bool) -> Node {
        if let Some(element) = self.as_element_mut() {
            element.is_void = is_void;
        }
        self
    }

    /// Set `data` on an element; texts are returned unchanged
    pub fn with_data(mut self, data: Data) -> Node {
        if let Some(element) = self.as_element_mut() {
            element.data = data;
        }
        self
    }

    pub fn key(&self) -> &str {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => &e.key,
            Node::Text(t) => &t.key,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Document(_) => NodeKind::Document,
            Node::Block(_) => NodeKind::Block,
            Node::Inline(_) => NodeKind::Inline,
            Node::Text(_) => NodeKind::Text,
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Node::Document(_))
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Inline(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Children, empty for text nodes
    pub fn children(&self) -> &[Arc<Node>] {
        match self.as_element() {
            Some(element) => &element.nodes,
            None => &[],
        }
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index).map(|child| child.as_ref())
    }

    pub fn is_void(&self) -> bool {
        self.as_element().map(|e| e.is_void).unwrap_or(false)
    }

    pub fn node_type(&self) -> Option<&str> {
        match self {
            Node::Block(e) | Node::Inline(e) => Some(&e.node_type),
            _ => None,
        }
    }

    pub fn data(&self) -> Option<&Data> {
        self.as_element().map(|e| &e.data)
    }

    /// Concatenated text of every descendant text node
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text.clone(),
            _ => self
                .children()
                .iter()
                .map(|child| child.text_content())
                .collect(),
        }
    }

    /// Length of [`Node::text_content`] in chars
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            _ => self.children().iter().map(|child| child.text_len()).sum(),
        }
    }

    /// Number of units a split or merge position counts: chars for text,
    /// children for elements.
    pub fn length(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            _ => self.children().len(),
        }
    }

    /// A block whose children are inline content rather than blocks
    pub fn is_leaf_block(&self) -> bool {
        self.is_block() && self.children().first().map(|c| !c.is_block()).unwrap_or(true)
    }

    /// Full snapshot of this node's settable properties, including its key
    pub fn properties(&self) -> NodeProperties {
        match self {
            Node::Text(t) => NodeProperties {
                key: Some(t.key.clone()),
                marks: Some(t.marks.clone()),
                ..NodeProperties::default()
            },
            Node::Document(e) => NodeProperties {
                key: Some(e.key.clone()),
                data: Some(e.data.clone()),
                ..NodeProperties::default()
            },
            Node::Block(e) | Node::Inline(e) => NodeProperties {
                key: Some(e.key.clone()),
                node_type: Some(e.node_type.clone()),
                data: Some(e.data.clone()),
                is_void: Some(e.is_void),
                marks: None,
            },
        }
    }

    /// This node's current values for the fields present in `properties`
    pub fn pick_properties(&self, properties: &NodeProperties) -> NodeProperties {
        let current = self.properties();
        NodeProperties {
            key: properties.key.as_ref().and(current.key),
            node_type: properties.node_type.as_ref().and(current.node_type),
            data: properties.data.as_ref().and(current.data),
            is_void: properties.is_void.as_ref().and(current.is_void),
            marks: properties.marks.as_ref().and(current.marks),
        }
    }

    /// Copy of this node with `properties` applied. The key is left alone;
    /// fields that do not apply to this node kind are ignored.
    pub fn with_properties(&self, properties: &NodeProperties) -> Node {
        let mut node = self.clone();
        match &mut node {
            Node::Text(t) => {
                if let Some(marks) = &properties.marks {
                    t.marks = marks.clone();
                }
            }
            Node::Document(e) => {
                if let Some(data) = &properties.data {
                    e.data = data.clone();
                }
            }
            Node::Block(e) | Node::Inline(e) => {
                if let Some(node_type) = &properties.node_type {
                    e.node_type = node_type.clone();
                }
                if let Some(data) = &properties.data {
                    e.data = data.clone();
                }
                if let Some(is_void) = properties.is_void {
                    e.is_void = is_void;
                }
            }
        }
        node
    }

    /// Copy of this node with a different key
    pub fn with_key(&self, key: impl Into<String>) -> Node {
        let mut node = self.clone();
        match &mut node {
            Node::Document(e) | Node::Block(e) | Node::Inline(e) => e.key = key.into(),
            Node::Text(t) => t.key = key.into(),
        }
        node
    }

    /// Copy of this element with new children; texts are returned unchanged
    pub fn with_children(&self, nodes: Vec<Arc<Node>>) -> Node {
        let mut node = self.clone();
        if let Some(element) = node.as_element_mut() {
            element.nodes = nodes;
        }
        node
    }

    /// Deep copy with a key from `next_key` for this node and every
    /// descendant, in document order. The first error aborts the copy.
    pub fn regenerate_keys<F, E>(&self, next_key: &mut F) -> Result<Node, E>
    where
        F: FnMut() -> Result<String, E>,
    {
        let node = self.with_key(next_key()?);
        match node.as_element() {
            Some(element) => {
                let nodes = element
                    .nodes
                    .iter()
                    .map(|child| child.regenerate_keys(next_key).map(Arc::new))
                    .collect::<Result<Vec<_>, E>>()?;
                Ok(node.with_children(nodes))
            }
            None => Ok(node),
        }
    }
}

impl Element {
    pub fn new(key: impl Into<String>, node_type: impl Into<String>, nodes: Vec<Node>) -> Self {
        Self {
            key: key.into(),
            node_type: node_type.into(),
            data: Data::new(),
            is_void: false,
            nodes: nodes.into_iter().map(Arc::new).collect(),
        }
    }
}

/// Length of `s` in chars
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the char at `offset`, or `s.len()` when past the end
pub fn byte_index(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(s.len())
}

/// Substring by char range
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let start = byte_index(s, start);
    let end = byte_index(s, end);
    &s[start..end.max(start)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::key::KeyGenerator;

    #[test]
    fn test_node_serializes_with_object_tag() {
        let node = Node::block("b", "paragraph", vec![Node::text("t", "hi")]);
        let json = serde_json::to_value(&node).unwrap();

        assert_eq!(json["object"], "block");
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["nodes"][0]["object"], "text");
        assert_eq!(json["nodes"][0]["text"], "hi");

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_mark_serializes_with_object_tag() {
        let mark = Mark::new("bold");
        let json = serde_json::to_value(&mark).unwrap();
        assert_eq!(json["object"], "mark");
        assert_eq!(json["type"], "bold");
    }

    #[test]
    fn test_mark_set_is_canonical() {
        let a = Node::text_with_marks("t", "x", vec![Mark::new("italic"), Mark::new("bold")]);
        let b = Node::text_with_marks("t", "x", vec![Mark::new("bold"), Mark::new("italic")]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_text_content_and_length() {
        let node = Node::block(
            "b",
            "paragraph",
            vec![
                Node::text("t1", "héllo "),
                Node::inline("i", "link", vec![Node::text("t2", "wörld")]),
            ],
        );
        assert_eq!(node.text_content(), "héllo wörld");
        assert_eq!(node.text_len(), 11);
        assert_eq!(node.length(), 2);
    }

    #[test]
    fn test_pick_properties_only_returns_requested_fields() {
        let node = Node::block("b", "quote", vec![]);
        let picked = node.pick_properties(&NodeProperties::node_type("paragraph"));
        assert_eq!(picked.node_type.as_deref(), Some("quote"));
        assert!(picked.data.is_none());
        assert!(picked.key.is_none());
    }

    #[test]
    fn test_regenerate_keys() {
        let mut keys = KeyGenerator::starting_at(10);
        let node = Node::block("b", "paragraph", vec![Node::text("t", "x")]);
        let fresh = node
            .regenerate_keys(&mut || Ok::<_, ModelError>(keys.generate()))
            .unwrap();
        assert_eq!(fresh.key(), "10");
        assert_eq!(fresh.child(0).unwrap().key(), "11");
        assert_eq!(fresh.text_content(), "x");
    }

    #[test]
    fn test_char_slice() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_slice("abc", 3, 3), "");
        assert_eq!(byte_index("héllo", 2), 3);
    }
}
