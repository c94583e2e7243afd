//! Operation inversion.
//!
//! For any operation `op` that applies cleanly to `v`,
//! `apply(apply(v, op), invert(op))` gives back `v`. This is what undo
//! replays. Points the forward operation left alone come back exactly; a
//! point it collapsed onto the edit boundary (the far end of removed text, the
//! start of a merged text) stays on that boundary.

use crate::operation::{Affinity, Operation};
use crate::path;

/// The operation that undoes `operation`
pub fn invert(operation: &Operation) -> Operation {
    match operation {
        Operation::InsertNode { path, node } => Operation::RemoveNode {
            path: path.clone(),
            node: node.clone(),
        },

        Operation::RemoveNode { path, node } => Operation::InsertNode {
            path: path.clone(),
            node: node.clone(),
        },

        Operation::MoveNode { path, new_path } => {
            // Root moves never apply; hand them back untouched.
            if path == new_path || path.is_empty() || new_path.is_empty() {
                return operation.clone();
            }
            // The node now lives at `landed`; pick a destination that lands
            // it back on `path` once it has been removed from `landed`.
            let landed = path::move_target(path, new_path);
            let depth = landed.len() - 1;
            let shifted = landed.len() < path.len()
                && landed[..depth] == path[..depth]
                && landed[depth] <= path[depth];
            let back = if shifted {
                path::increment(path, 1, Some(depth))
            } else {
                path.clone()
            };
            Operation::MoveNode {
                path: landed,
                new_path: back,
            }
        }

        Operation::MergeNode {
            path,
            position,
            properties,
        } => Operation::SplitNode {
            path: path::decrement(path, 1, None),
            position: *position,
            properties: properties.clone(),
            affinity: Affinity::Backward,
        },

        Operation::SplitNode {
            path,
            position,
            properties,
            ..
        } => Operation::MergeNode {
            path: path::increment(path, 1, None),
            position: *position,
            properties: properties.clone(),
        },

        Operation::InsertText {
            path, offset, text, ..
        } => Operation::RemoveText {
            path: path.clone(),
            offset: *offset,
            text: text.clone(),
        },

        Operation::RemoveText { path, offset, text } => Operation::InsertText {
            path: path.clone(),
            offset: *offset,
            text: text.clone(),
            marks: None,
            affinity: Affinity::Backward,
        },

        Operation::AddMark {
            path,
            offset,
            length,
            mark,
        } => Operation::RemoveMark {
            path: path.clone(),
            offset: *offset,
            length: *length,
            mark: mark.clone(),
        },

        Operation::RemoveMark {
            path,
            offset,
            length,
            mark,
        } => Operation::AddMark {
            path: path.clone(),
            offset: *offset,
            length: *length,
            mark: mark.clone(),
        },

        Operation::SetMark {
            path,
            offset,
            length,
            mark,
            properties,
        } => Operation::SetMark {
            path: path.clone(),
            offset: *offset,
            length: *length,
            mark: mark.merge(properties),
            properties: mark.pick(properties),
        },

        Operation::SetNode {
            path,
            properties,
            new_properties,
        } => Operation::SetNode {
            path: path.clone(),
            properties: new_properties.clone(),
            new_properties: properties.clone(),
        },

        Operation::SetSelection {
            properties,
            new_properties,
        } => Operation::SetSelection {
            properties: new_properties.clone(),
            new_properties: properties.clone(),
        },

        Operation::SetValue {
            properties,
            new_properties,
        } => Operation::SetValue {
            properties: new_properties.clone(),
            new_properties: properties.clone(),
        },
    }
}

impl Operation {
    pub fn invert(&self) -> Operation {
        invert(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Mark, MarkProperties, Node, NodeProperties};
    use crate::value::Value;

    fn value() -> Value {
        Value::new(Node::document(
            "doc",
            vec![
                Node::block("a", "paragraph", vec![Node::text("a1", "one")]),
                Node::block(
                    "b",
                    "quote",
                    vec![
                        Node::block("b1", "paragraph", vec![Node::text("b1t", "two")]),
                        Node::block("b2", "paragraph", vec![Node::text("b2t", "three")]),
                    ],
                ),
                Node::block("c", "paragraph", vec![Node::text("c1", "four")]),
            ],
        ))
        .unwrap()
    }

    fn assert_inverts(op: Operation) {
        let before = value();
        let after = op.apply(&before).unwrap();
        let restored = invert(&op).apply(&after).unwrap();
        assert_eq!(restored.document, before.document, "inverting {:?}", op);
    }

    #[test]
    fn test_move_inverse_across_depths() {
        // Deeper to shallower, landing before the old parent
        assert_inverts(Operation::MoveNode {
            path: vec![1, 0],
            new_path: vec![0],
        });
        // Into the very slot of the old parent
        assert_inverts(Operation::MoveNode {
            path: vec![1, 1],
            new_path: vec![1],
        });
        // Shallower to deeper, past the parent's older sibling
        assert_inverts(Operation::MoveNode {
            path: vec![0],
            new_path: vec![1, 1],
        });
        // Plain sibling moves in both directions
        assert_inverts(Operation::MoveNode {
            path: vec![0],
            new_path: vec![2],
        });
        assert_inverts(Operation::MoveNode {
            path: vec![2],
            new_path: vec![0],
        });
    }

    #[test]
    fn test_root_moves_invert_to_themselves() {
        let to_root = Operation::MoveNode {
            path: vec![0],
            new_path: vec![],
        };
        assert_eq!(invert(&to_root), to_root);
        assert!(to_root.apply(&value()).is_err());

        let from_root = Operation::from_json(serde_json::json!({
            "type": "move_node",
            "path": [],
            "newPath": [1]
        }))
        .unwrap();
        assert_eq!(invert(&from_root), from_root);
    }

    #[test]
    fn test_split_and_merge_inverse() {
        assert_inverts(Operation::SplitNode {
            path: vec![1, 1, 0],
            position: 2,
            properties: NodeProperties {
                key: Some("new".to_string()),
                ..NodeProperties::default()
            },
            affinity: Affinity::Forward,
        });

        let merged_properties = value().document.assert_node(&[2]).unwrap().properties();
        assert_inverts(Operation::MergeNode {
            path: vec![2],
            position: 2,
            properties: merged_properties,
        });
    }

    #[test]
    fn test_set_mark_inverse() {
        let bold = Mark::new("bold");
        let doc = Node::document(
            "doc",
            vec![Node::block(
                "p",
                "paragraph",
                vec![Node::text_with_marks("t", "hi", vec![bold.clone()])],
            )],
        );
        let before = Value::new(doc).unwrap();
        let op = Operation::SetMark {
            path: vec![0, 0],
            offset: 0,
            length: 2,
            mark: bold.clone(),
            properties: MarkProperties {
                mark_type: Some("strong".to_string()),
                data: None,
            },
        };

        let inverse = invert(&op);
        match &inverse {
            Operation::SetMark {
                mark, properties, ..
            } => {
                assert_eq!(mark.mark_type, "strong");
                assert_eq!(properties.mark_type.as_deref(), Some("bold"));
            }
            other => panic!("unexpected inverse {:?}", other),
        }

        let after = op.apply(&before).unwrap();
        assert_eq!(inverse.apply(&after).unwrap().document, before.document);
    }

    #[test]
    fn test_set_node_swaps_properties() {
        let op = Operation::SetNode {
            path: vec![0],
            properties: NodeProperties::node_type("paragraph"),
            new_properties: NodeProperties::node_type("heading"),
        };
        assert_inverts(op.clone());
        assert_eq!(invert(&invert(&op)), op);
    }
}
