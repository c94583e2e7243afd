//! The core schema rules every editor runs before any plugin rule.
//!
//! Together they keep the document shaped the way commands and renderers
//! expect: documents hold blocks, blocks hold either blocks or inline
//! content, inlines sit between text nodes, and text runs are as few as the
//! marks allow.

use folio_model::Node;

use crate::change::Change;
use crate::errors::{EditorError, EditorResult};
use crate::schema::{InlinePadding, Rule, Violation};

/// Documents may only contain blocks
pub struct DocumentChildrenRule;

impl Rule for DocumentChildrenRule {
    fn name(&self) -> &'static str {
        "document-children"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_document()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        invalid_children(node, Node::is_block)
    }

    fn normalize(&self, change: &mut Change<'_>, _node: &Node, violation: Violation) -> EditorResult<()> {
        remove_invalid_children(self.name(), change, violation)
    }
}

/// Blocks contain only blocks, or only inlines and texts. The first child
/// decides which.
pub struct BlockChildrenRule;

impl Rule for BlockChildrenRule {
    fn name(&self) -> &'static str {
        "block-children"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_block() && !node.children().is_empty()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        let holds_blocks = node.children().first().map(|c| c.is_block()).unwrap_or(false);
        invalid_children(node, |child| child.is_block() == holds_blocks)
    }

    fn normalize(&self, change: &mut Change<'_>, _node: &Node, violation: Violation) -> EditorResult<()> {
        remove_invalid_children(self.name(), change, violation)
    }
}

/// Inlines contain only inlines and texts
pub struct InlineChildrenRule;

impl Rule for InlineChildrenRule {
    fn name(&self) -> &'static str {
        "inline-children"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_inline()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        invalid_children(node, |child| !child.is_block())
    }

    fn normalize(&self, change: &mut Change<'_>, _node: &Node, violation: Violation) -> EditorResult<()> {
        remove_invalid_children(self.name(), change, violation)
    }
}

/// Blocks and inlines always hold at least one text
pub struct TextPresenceRule;

impl Rule for TextPresenceRule {
    fn name(&self) -> &'static str {
        "text-presence"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_block() || node.is_inline()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        node.children().is_empty().then_some(Violation::MissingText)
    }

    fn normalize(&self, change: &mut Change<'_>, node: &Node, violation: Violation) -> EditorResult<()> {
        if violation != Violation::MissingText {
            return Err(unexpected(self.name(), &violation));
        }
        let key = change.generate_key()?;
        change.insert_node_by_key(node.key(), 0, Node::text(key, ""))
    }
}

/// Non-void inlines with no text are removed
pub struct EmptyInlineRule;

impl Rule for EmptyInlineRule {
    fn name(&self) -> &'static str {
        "empty-inline"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_inline() && !node.is_void()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        (node.text_len() == 0).then_some(Violation::EmptyInline)
    }

    fn normalize(&self, change: &mut Change<'_>, node: &Node, violation: Violation) -> EditorResult<()> {
        if violation != Violation::EmptyInline {
            return Err(unexpected(self.name(), &violation));
        }
        change.remove_node_by_key(node.key())
    }
}

/// Every inline child has a text on each side, so there is always somewhere
/// to put a cursor next to it
pub struct InlinePaddingRule;

impl Rule for InlinePaddingRule {
    fn name(&self) -> &'static str {
        "inline-padding"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_block() || node.is_inline()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        let children = node.children();
        let paddings: Vec<InlinePadding> = children
            .iter()
            .enumerate()
            .filter(|(_, child)| child.is_inline())
            .filter_map(|(index, child)| {
                let before = index == 0 || !children[index - 1].is_text();
                let after = index + 1 == children.len() || !children[index + 1].is_text();
                (before || after).then(|| InlinePadding {
                    key: child.key().to_string(),
                    before,
                    after,
                })
            })
            .collect();

        (!paddings.is_empty()).then_some(Violation::PadInlines(paddings))
    }

    fn normalize(&self, change: &mut Change<'_>, node: &Node, violation: Violation) -> EditorResult<()> {
        let Violation::PadInlines(paddings) = violation else {
            return Err(unexpected(self.name(), &violation));
        };

        change.without_normalizing(|change| {
            for padding in &paddings {
                // Re-read neighbours: padding an earlier inline may already
                // have given this one its text.
                let document = &change.value().document;
                let inline_path = document.assert_path_of_key(&padding.key)?;
                let Some((&index, parent_path)) = inline_path.split_last() else {
                    continue;
                };
                let siblings = document.assert_node(parent_path)?.children();
                let needs_after = index + 1 == siblings.len() || !siblings[index + 1].is_text();
                let needs_before = index == 0 || !siblings[index - 1].is_text();

                if needs_after {
                    let key = change.generate_key()?;
                    change.insert_node_by_key(node.key(), index + 1, Node::text(key, ""))?;
                }
                if needs_before {
                    let key = change.generate_key()?;
                    change.insert_node_by_key(node.key(), index, Node::text(key, ""))?;
                }
            }
            Ok(())
        })
    }
}

/// Adjacent texts with identical marks are merged
pub struct MergeAdjacentTextsRule;

impl Rule for MergeAdjacentTextsRule {
    fn name(&self) -> &'static str {
        "merge-adjacent-texts"
    }

    fn matches(&self, node: &Node) -> bool {
        node.is_block() || node.is_inline()
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        let keys: Vec<String> = node
            .children()
            .windows(2)
            .filter_map(|pair| match (pair[0].as_text(), pair[1].as_text()) {
                (Some(previous), Some(text)) if previous.marks == text.marks => {
                    Some(text.key.clone())
                }
                _ => None,
            })
            .collect();

        (!keys.is_empty()).then_some(Violation::MergeTexts(keys))
    }

    fn normalize(&self, change: &mut Change<'_>, _node: &Node, violation: Violation) -> EditorResult<()> {
        let Violation::MergeTexts(keys) = violation else {
            return Err(unexpected(self.name(), &violation));
        };

        change.without_normalizing(|change| {
            for key in keys.iter().rev() {
                change.merge_node_by_key(key)?;
            }
            Ok(())
        })
    }
}

/// Empty texts are removed unless they pad an inline
pub struct ExtraEmptyTextsRule;

impl Rule for ExtraEmptyTextsRule {
    fn name(&self) -> &'static str {
        "extra-empty-texts"
    }

    fn matches(&self, node: &Node) -> bool {
        (node.is_block() || node.is_inline()) && node.children().len() > 1
    }

    fn validate(&self, node: &Node) -> Option<Violation> {
        let children = node.children();
        let keys: Vec<String> = children
            .iter()
            .enumerate()
            .filter(|(index, child)| {
                let Some(text) = child.as_text() else {
                    return false;
                };
                if !text.is_empty() {
                    return false;
                }
                let previous = index.checked_sub(1).and_then(|i| children.get(i));
                let next = children.get(index + 1);
                let is_inline = |n: Option<&std::sync::Arc<Node>>| {
                    n.map(|n| n.is_inline()).unwrap_or(false)
                };

                let pads_first = previous.is_none() && is_inline(next);
                let pads_last = next.is_none() && is_inline(previous);
                let pads_between = is_inline(previous) && is_inline(next);
                !(pads_first || pads_last || pads_between)
            })
            .map(|(_, child)| child.key().to_string())
            .collect();

        (!keys.is_empty()).then_some(Violation::ExtraEmptyTexts(keys))
    }

    fn normalize(&self, change: &mut Change<'_>, _node: &Node, violation: Violation) -> EditorResult<()> {
        let Violation::ExtraEmptyTexts(keys) = violation else {
            return Err(unexpected(self.name(), &violation));
        };

        change.without_normalizing(|change| {
            for key in &keys {
                change.remove_node_by_key(key)?;
            }
            Ok(())
        })
    }
}

fn invalid_children(node: &Node, allowed: impl Fn(&Node) -> bool) -> Option<Violation> {
    let keys: Vec<String> = node
        .children()
        .iter()
        .map(|child| child.as_ref())
        .filter(|&child| !allowed(child))
        .map(|child| child.key().to_string())
        .collect();

    (!keys.is_empty()).then_some(Violation::InvalidChildren(keys))
}

fn remove_invalid_children(
    rule: &str,
    change: &mut Change<'_>,
    violation: Violation,
) -> EditorResult<()> {
    let Violation::InvalidChildren(keys) = violation else {
        return Err(unexpected(rule, &violation));
    };

    change.without_normalizing(|change| {
        for key in &keys {
            change.remove_node_by_key(key)?;
        }
        Ok(())
    })
}

fn unexpected(rule: &str, violation: &Violation) -> EditorError {
    EditorError::InvalidCommand(format!("rule {} cannot repair {:?}", rule, violation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_model::Mark;

    #[test]
    fn test_block_children_follow_first_child() {
        let block = Node::block(
            "b",
            "quote",
            vec![
                Node::block("p", "paragraph", vec![Node::text("t1", "a")]),
                Node::text("stray", "b"),
            ],
        );
        assert_eq!(
            BlockChildrenRule.validate(&block),
            Some(Violation::InvalidChildren(vec!["stray".to_string()]))
        );
    }

    #[test]
    fn test_inline_padding_reports_missing_sides() {
        let block = Node::block(
            "p",
            "paragraph",
            vec![
                Node::inline("l", "link", vec![Node::text("t1", "a")]),
                Node::text("t2", "b"),
            ],
        );
        assert_eq!(
            InlinePaddingRule.validate(&block),
            Some(Violation::PadInlines(vec![InlinePadding {
                key: "l".to_string(),
                before: true,
                after: false,
            }]))
        );
    }

    #[test]
    fn test_merge_only_texts_with_same_marks() {
        let block = Node::block(
            "p",
            "paragraph",
            vec![
                Node::text("t1", "a"),
                Node::text("t2", "b"),
                Node::text_with_marks("t3", "c", vec![Mark::new("bold")]),
            ],
        );
        assert_eq!(
            MergeAdjacentTextsRule.validate(&block),
            Some(Violation::MergeTexts(vec!["t2".to_string()]))
        );
    }

    #[test]
    fn test_empty_texts_padding_inlines_are_kept() {
        let block = Node::block(
            "p",
            "paragraph",
            vec![
                Node::text("t1", ""),
                Node::inline("l", "link", vec![Node::text("t2", "a")]),
                Node::text("t3", ""),
                Node::text_with_marks("t4", "", vec![Mark::new("bold")]),
            ],
        );
        assert_eq!(
            ExtraEmptyTextsRule.validate(&block),
            Some(Violation::ExtraEmptyTexts(vec!["t4".to_string()]))
        );
    }

    #[test]
    fn test_void_inlines_may_be_empty() {
        let inline = Node::inline("m", "mention", vec![Node::text("t", "")]).with_void(true);
        assert!(!EmptyInlineRule.matches(&inline));
        assert_eq!(
            EmptyInlineRule.validate(&Node::inline("l", "link", vec![Node::text("t", "")])),
            Some(Violation::EmptyInline)
        );
    }
}
