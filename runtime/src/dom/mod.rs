//! Read-only document access for the extraction pipeline.
//!
//! Every stage talks to the page through [`DocumentTree`], a narrow capability
//! trait: selector queries, computed style, geometry, parent/sibling navigation
//! and subtree copies. Nothing in the trait can mutate the document.
//!
//! [`HtmlDocument`] is the in-memory implementation. Its layout either comes
//! from a live browser capture or is synthesized from inline styles.

pub mod fragment;
pub mod html;
pub mod layout;

pub use fragment::{Fragment, FragmentNode};
pub use html::{HtmlDocument, NodeId};
pub use layout::ElementLayout;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Failures reading a single element or the frame context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The element was removed from the document after it was discovered.
    #[error("element is no longer attached to the document")]
    Detached,
    /// The top-level browsing context belongs to another origin.
    #[error("top-level frame is not accessible from this origin")]
    CrossOriginFrame,
    /// Layout records do not line up with the parsed elements.
    #[error("layout has {found} element records but the document has {expected} elements")]
    LayoutLength { expected: usize, found: usize },
}

/// Computed style properties the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleProperty {
    Position,
    ZIndex,
    Opacity,
    Display,
    Visibility,
    PointerEvents,
    Cursor,
}

impl StyleProperty {
    pub const ALL: [StyleProperty; 7] = [
        StyleProperty::Position,
        StyleProperty::ZIndex,
        StyleProperty::Opacity,
        StyleProperty::Display,
        StyleProperty::Visibility,
        StyleProperty::PointerEvents,
        StyleProperty::Cursor,
    ];

    /// The CSS property name.
    pub fn css_name(self) -> &'static str {
        match self {
            StyleProperty::Position => "position",
            StyleProperty::ZIndex => "z-index",
            StyleProperty::Opacity => "opacity",
            StyleProperty::Display => "display",
            StyleProperty::Visibility => "visibility",
            StyleProperty::PointerEvents => "pointer-events",
            StyleProperty::Cursor => "cursor",
        }
    }

    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|prop| prop.css_name().eq_ignore_ascii_case(name))
    }

    /// Computed value when nothing sets or inherits the property.
    pub fn initial_value(self) -> &'static str {
        match self {
            StyleProperty::Position => "static",
            StyleProperty::ZIndex => "auto",
            StyleProperty::Opacity => "1",
            StyleProperty::Display => "inline",
            StyleProperty::Visibility => "visible",
            StyleProperty::PointerEvents => "auto",
            StyleProperty::Cursor => "auto",
        }
    }

    /// Whether the property inherits from the parent element.
    pub fn is_inherited(self) -> bool {
        matches!(
            self,
            StyleProperty::Visibility | StyleProperty::PointerEvents | StyleProperty::Cursor
        )
    }
}

/// Resolved style values as strings, keyed by a closed property set.
///
/// Values are kept exactly as the style engine reports them; no unit parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComputedStyle(BTreeMap<StyleProperty, String>);

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded value, if the engine reported one.
    pub fn get(&self, prop: StyleProperty) -> Option<&str> {
        self.0.get(&prop).map(String::as_str)
    }

    /// The recorded value, falling back to the property's initial value.
    pub fn value(&self, prop: StyleProperty) -> &str {
        self.get(prop).unwrap_or_else(|| prop.initial_value())
    }

    pub fn set(&mut self, prop: StyleProperty, value: impl Into<String>) {
        self.0.insert(prop, value.into());
    }

    /// `display: none` or `visibility: hidden`.
    pub fn is_hidden(&self) -> bool {
        self.value(StyleProperty::Display) == "none"
            || self.value(StyleProperty::Visibility) == "hidden"
    }
}

impl FromIterator<(StyleProperty, String)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (StyleProperty, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Round a pixel value to a whole number, halves toward positive infinity.
/// Never yields negative zero, so `-0.3` prints as `0`.
pub fn round_px(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Viewport-relative bounding box, as `getBoundingClientRect()` reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Inner dimensions of the window the document is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Half-open intersection test: the far edges must be past 0 and the
    /// near edges must start before the viewport extent.
    pub fn intersects(&self, rect: &Rect) -> bool {
        rect.bottom() > 0.0
            && rect.right() > 0.0
            && rect.top < self.height
            && rect.left < self.width
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// Where the document sits relative to the top-level browsing context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameContext {
    #[default]
    TopLevel,
    Framed,
    /// Framed by another origin; identity checks against the top frame fail.
    CrossOrigin,
}

/// Read-only view of a rendered document.
///
/// Handles are plain copyable values. A handle may outlive the element it
/// refers to (a page script can remove it); lookups on such handles report
/// [`DomError::Detached`] or return empty values instead of panicking.
pub trait DocumentTree {
    type Node: Copy + Eq + Hash + Debug;

    /// Elements matching `selector` in document order. With a scope, only
    /// descendants of the scope element are considered.
    fn query_all(&self, scope: Option<Self::Node>, selector: &Selector) -> Vec<Self::Node>;

    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> &str;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<&str>;

    fn computed_style(&self, node: Self::Node) -> Result<ComputedStyle, DomError>;

    fn bounding_rect(&self, node: Self::Node) -> Result<Rect, DomError>;

    fn scroll_height(&self, node: Self::Node) -> Result<f64, DomError>;

    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    fn previous_element_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_element_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn child_element_count(&self, node: Self::Node) -> usize;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: Self::Node) -> String;

    /// Raw contents of the element's own text-node children.
    fn direct_text(&self, node: Self::Node) -> Vec<String>;

    /// Deep copy of the element's subtree, detached from the document.
    fn clone_subtree(&self, node: Self::Node) -> Option<Fragment>;

    fn is_connected(&self, node: Self::Node) -> bool;

    /// URL of the document.
    fn location(&self) -> &str;

    fn viewport(&self) -> Viewport;

    /// Whether this document is the top-level browsing context.
    fn is_top_level(&self) -> Result<bool, DomError>;
}
