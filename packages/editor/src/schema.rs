//! # Schema
//!
//! A schema is an ordered list of rules. Each rule says which nodes it
//! applies to, reports what is wrong with a node, and knows how to repair it
//! by issuing commands on the in-flight [`Change`].
//!
//! The core rules (see [`crate::core_rules`]) always come first; plugin rules
//! are appended with [`Schema::add_rule`].

use folio_model::Node;

use crate::change::Change;
use crate::core_rules::{
    BlockChildrenRule, DocumentChildrenRule, EmptyInlineRule, ExtraEmptyTextsRule,
    InlineChildrenRule, InlinePaddingRule, MergeAdjacentTextsRule, TextPresenceRule,
};
use crate::errors::EditorResult;

/// What a rule found wrong with a node
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// Children (by key) that may not appear in this parent
    InvalidChildren(Vec<String>),

    /// An element with no children at all
    MissingText,

    /// A non-void inline whose text is empty
    EmptyInline,

    /// Inline children that need an empty text inserted beside them
    PadInlines(Vec<InlinePadding>),

    /// Texts (by key) that should merge into their previous sibling text
    MergeTexts(Vec<String>),

    /// Empty texts (by key) that pad nothing
    ExtraEmptyTexts(Vec<String>),

    /// Free-form violation for plugin rules
    Custom(String),
}

/// Missing neighbours of one inline child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlinePadding {
    pub key: String,
    pub before: bool,
    pub after: bool,
}

/// Trait for implementing schema rules
pub trait Rule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Whether this rule applies to `node`
    fn matches(&self, node: &Node) -> bool;

    /// Describe what is wrong with `node`, or `None` if it is valid
    fn validate(&self, node: &Node) -> Option<Violation>;

    /// Repair `node` by issuing commands on `change`
    fn normalize(&self, change: &mut Change<'_>, node: &Node, violation: Violation)
        -> EditorResult<()>;
}

/// Registry of schema rules
pub struct Schema {
    rules: Vec<Box<dyn Rule>>,
}

impl Schema {
    /// Create a schema with the core rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DocumentChildrenRule),
                Box::new(BlockChildrenRule),
                Box::new(InlineChildrenRule),
                Box::new(TextPresenceRule),
                Box::new(EmptyInlineRule),
                Box::new(InlinePaddingRule),
                Box::new(MergeAdjacentTextsRule),
                Box::new(ExtraEmptyTextsRule),
            ],
        }
    }

    /// Create a schema with no rules at all
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a plugin rule after the ones already registered
    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.add_rule(rule);
        self
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule that matches `node` and reports a violation
    pub fn validate_node(&self, node: &Node) -> Option<(&dyn Rule, Violation)> {
        self.rules.iter().find_map(|rule| {
            if !rule.matches(node) {
                return None;
            }
            rule.validate(node).map(|violation| (rule.as_ref(), violation))
        })
    }

    /// True when no rule reports a violation anywhere in `document`
    pub fn is_valid(&self, document: &Node) -> bool {
        self.validate_node(document).is_none()
            && document
                .descendant_paths()
                .iter()
                .filter_map(|path| document.get(path))
                .all(|node| self.validate_node(node).is_none())
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|rule| rule.name()).collect();
        f.debug_struct("Schema").field("rules", &names).finish()
    }
}
