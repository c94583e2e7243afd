//! # Value
//!
//! The externally observed editing state: document, selection, decorations
//! and custom data. Values are immutable; applying an operation produces a
//! new one and leaves the old one intact.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::node::{Data, Node};
use crate::range::{Decoration, Point, Ranged, Selection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Value {
    pub document: Node,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub decorations: Vec<Decoration>,
    #[serde(default)]
    pub data: Data,
}

/// Partial update for the top-level value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorations: Option<Vec<Decoration>>,
}

impl Value {
    /// Wrap a document with an unset selection. Fails if `document` is not a
    /// document node.
    pub fn new(document: Node) -> ModelResult<Self> {
        if !document.is_document() {
            return Err(ModelError::InvalidOperation(format!(
                "a value must wrap a document node, got {:?}",
                document.kind()
            )));
        }
        Ok(Self {
            document,
            selection: Selection::default(),
            decorations: Vec::new(),
            data: Data::new(),
        })
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_decorations(mut self, decorations: Vec<Decoration>) -> Self {
        self.decorations = decorations;
        self
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    /// Merge `properties` over this value
    pub fn merge(&self, properties: &ValueProperties) -> Value {
        let mut value = self.clone();
        if let Some(data) = &properties.data {
            value.data = data.clone();
        }
        if let Some(decorations) = &properties.decorations {
            value.decorations = decorations.clone();
        }
        value
    }

    /// This value's current values for the fields present in `properties`
    pub fn pick(&self, properties: &ValueProperties) -> ValueProperties {
        ValueProperties {
            data: properties.data.as_ref().map(|_| self.data.clone()),
            decorations: properties.decorations.as_ref().map(|_| self.decorations.clone()),
        }
    }

    /// True if the selection is set and both points address text nodes
    pub fn has_valid_selection(&self) -> bool {
        self.selection.is_set()
            && self.selection.anchor.is_valid_in(&self.document)
            && self.selection.focus.is_valid_in(&self.document)
    }

    /// Start of the document, for collapsing an unset selection
    pub fn start_point(&self) -> Point {
        Point::start_of(&self.document)
    }

    pub fn to_json(&self) -> ModelResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(json: serde_json::Value) -> ModelResult<Self> {
        let value: Value = serde_json::from_value(json)?;
        if !value.document.is_document() {
            return Err(ModelError::InvalidOperation(
                "a value must wrap a document node".to_string(),
            ));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Mark;
    use crate::range::Range;

    fn value() -> Value {
        Value::new(Node::document(
            "doc",
            vec![Node::block("p", "paragraph", vec![Node::text("t", "abc")])],
        ))
        .unwrap()
    }

    #[test]
    fn test_value_requires_document() {
        assert!(Value::new(Node::text("t", "x")).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let value = value()
            .with_selection(Selection::collapsed(Point::new(vec![0, 0], 1)))
            .with_decorations(vec![Decoration::new(
                Range::new(Point::new(vec![0, 0], 0), Point::new(vec![0, 0], 2)),
                Mark::new("highlight"),
            )]);

        let json = value.to_json().unwrap();
        assert_eq!(json["document"]["object"], "document");
        assert_eq!(json["selection"]["anchor"]["path"], serde_json::json!([0, 0]));

        let back = Value::from_json(json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_has_valid_selection() {
        let value = value();
        assert!(!value.has_valid_selection());

        let selected = value
            .clone()
            .with_selection(Selection::collapsed(Point::new(vec![0, 0], 3)));
        assert!(selected.has_valid_selection());

        let dangling = value.with_selection(Selection::collapsed(Point::new(vec![0], 0)));
        assert!(!dangling.has_valid_selection());
    }
}
