//! Points, ranges, the selection and decorations.
//!
//! A point is a text path plus a char offset. Selections and decorations are
//! both ranges (anchor + focus) with a little extra state, so the shared
//! behaviour lives on the [`Ranged`] trait.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::node::{Mark, Node};
use crate::path::{self, Path};

/// A position inside a text node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub path: Option<Path>,
    #[serde(default)]
    pub offset: usize,
}

impl Point {
    pub fn new(path: Path, offset: usize) -> Self {
        Self {
            path: Some(path),
            offset,
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_unset(&self) -> bool {
        self.path.is_none()
    }

    /// Order two points in the document. Unset points and points whose paths
    /// are related by ancestry are unordered.
    pub fn compare(&self, other: &Point) -> Option<Ordering> {
        let (a, b) = (self.path.as_ref()?, other.path.as_ref()?);
        match path::compare(a, b)? {
            Ordering::Equal => Some(self.offset.cmp(&other.offset)),
            ordering => Some(ordering),
        }
    }

    /// True if this point addresses an existing text node within its length
    pub fn is_valid_in(&self, document: &Node) -> bool {
        match &self.path {
            Some(path) => document
                .assert_text(path)
                .map(|text| self.offset <= text.len())
                .unwrap_or(false),
            None => false,
        }
    }

    /// Resolve this point against `document`.
    ///
    /// Points on element paths are moved into the text containing their
    /// offset; dangling points fall back to the start of the first text.
    pub fn normalize(&self, document: &Node) -> Point {
        let Some(path) = &self.path else {
            return Point::unset();
        };

        match document.get(path) {
            Some(Node::Text(text)) => Point::new(path.clone(), self.offset.min(text.len())),
            Some(element) => {
                let mut remaining = self.offset;
                let texts = element.texts();
                for (index, (text_path, text)) in texts.iter().enumerate() {
                    if remaining <= text.len() || index + 1 == texts.len() {
                        let mut full = path.clone();
                        full.extend_from_slice(text_path);
                        return Point::new(full, remaining.min(text.len()));
                    }
                    remaining -= text.len();
                }
                Self::start_of(document)
            }
            None => Self::start_of(document),
        }
    }

    /// Start of the first text in `document`, or unset if it has none
    pub fn start_of(document: &Node) -> Point {
        match document.first_text() {
            Some((path, _)) => Point::new(path, 0),
            None => Point::unset(),
        }
    }

    /// End of the last text in `document`, or unset if it has none
    pub fn end_of(document: &Node) -> Point {
        match document.last_text() {
            Some((path, text)) => Point::new(path, text.len()),
            None => Point::unset(),
        }
    }
}

/// Shared behaviour of anchor/focus pairs
pub trait Ranged {
    fn anchor(&self) -> &Point;
    fn focus(&self) -> &Point;

    fn is_unset(&self) -> bool {
        self.anchor().is_unset() || self.focus().is_unset()
    }

    fn is_set(&self) -> bool {
        !self.is_unset()
    }

    fn is_collapsed(&self) -> bool {
        self.anchor() == self.focus()
    }

    fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// True when the anchor comes after the focus in document order
    fn is_backward(&self) -> bool {
        self.anchor().compare(self.focus()) == Some(Ordering::Greater)
    }

    fn start(&self) -> &Point {
        if self.is_backward() {
            self.focus()
        } else {
            self.anchor()
        }
    }

    fn end(&self) -> &Point {
        if self.is_backward() {
            self.anchor()
        } else {
            self.focus()
        }
    }

    fn to_range(&self) -> Range {
        Range {
            anchor: self.anchor().clone(),
            focus: self.focus().clone(),
        }
    }
}

/// A plain anchor/focus pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }
}

/// The user's selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
    #[serde(default)]
    pub is_focused: bool,
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            is_focused: false,
        }
    }

    pub fn collapsed(point: Point) -> Self {
        Self::new(point.clone(), point)
    }

    /// Merge `properties` over this selection
    pub fn merge(&self, properties: &SelectionProperties) -> Selection {
        Selection {
            anchor: properties.anchor.clone().unwrap_or_else(|| self.anchor.clone()),
            focus: properties.focus.clone().unwrap_or_else(|| self.focus.clone()),
            is_focused: properties.is_focused.unwrap_or(self.is_focused),
        }
    }

    /// This selection's current values for the fields present in `properties`
    pub fn pick(&self, properties: &SelectionProperties) -> SelectionProperties {
        SelectionProperties {
            anchor: properties.anchor.as_ref().map(|_| self.anchor.clone()),
            focus: properties.focus.as_ref().map(|_| self.focus.clone()),
            is_focused: properties.is_focused.map(|_| self.is_focused),
        }
    }

    /// Resolve both points against `document`. A selection with one dangling
    /// point is unset rather than left half-valid.
    pub fn normalize(&self, document: &Node) -> Selection {
        if self.is_unset() {
            return Selection {
                anchor: Point::unset(),
                focus: Point::unset(),
                is_focused: self.is_focused,
            };
        }
        let anchor = self.anchor.normalize(document);
        let focus = self.focus.normalize(document);
        if anchor.is_unset() || focus.is_unset() {
            return Selection {
                anchor: Point::unset(),
                focus: Point::unset(),
                is_focused: self.is_focused,
            };
        }
        Selection {
            anchor,
            focus,
            is_focused: self.is_focused,
        }
    }
}

/// Partial update for the selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_focused: Option<bool>,
}

impl SelectionProperties {
    pub fn range(range: &impl Ranged) -> Self {
        Self {
            anchor: Some(range.anchor().clone()),
            focus: Some(range.focus().clone()),
            is_focused: None,
        }
    }

    /// Fold a later update into this one
    pub fn extend(&self, later: &SelectionProperties) -> SelectionProperties {
        SelectionProperties {
            anchor: later.anchor.clone().or_else(|| self.anchor.clone()),
            focus: later.focus.clone().or_else(|| self.focus.clone()),
            is_focused: later.is_focused.or(self.is_focused),
        }
    }
}

/// A non-persisted highlight over a range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decoration {
    pub anchor: Point,
    pub focus: Point,
    pub mark: Mark,
    /// Atomic decorations vanish when an edit lands inside them
    #[serde(default)]
    pub atomic: bool,
}

impl Decoration {
    pub fn new(range: Range, mark: Mark) -> Self {
        Self {
            anchor: range.anchor,
            focus: range.focus,
            mark,
            atomic: false,
        }
    }

    pub fn atomic(mut self) -> Self {
        self.atomic = true;
        self
    }
}

macro_rules! impl_ranged {
    ($($ty:ty),*) => {
        $(
            impl Ranged for $ty {
                fn anchor(&self) -> &Point { &self.anchor }
                fn focus(&self) -> &Point { &self.focus }
            }
        )*
    };
}

impl_ranged!(Range, Selection, Decoration);
