//! Evidence packet types handed to the downstream classifier.
//!
//! Field names serialize in camelCase to match what the inference side
//! consumes.

use crate::dom::{ComputedStyle, StyleProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes copied into a packet, in the order they are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeName {
    Href,
    Src,
    Alt,
    Title,
    AriaLabel,
    Download,
    Target,
}

impl AttributeName {
    pub const WHITELIST: [AttributeName; 7] = [
        AttributeName::Href,
        AttributeName::Src,
        AttributeName::Alt,
        AttributeName::Title,
        AttributeName::AriaLabel,
        AttributeName::Download,
        AttributeName::Target,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeName::Href => "href",
            AttributeName::Src => "src",
            AttributeName::Alt => "alt",
            AttributeName::Title => "title",
            AttributeName::AriaLabel => "aria-label",
            AttributeName::Download => "download",
            AttributeName::Target => "target",
        }
    }
}

/// Whitelisted attributes present on the element. Absent attributes have no
/// entry; an empty value means the attribute is present but empty.
pub type AttributeMap = BTreeMap<AttributeName, String>;

/// Computed style subset relevant to deceptive UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleData {
    #[serde(rename = "pos")]
    pub position: String,
    pub z_index: String,
    pub opacity: String,
    pub display: String,
    #[serde(rename = "ptrEvents")]
    pub pointer_events: String,
    pub cursor: String,
}

impl StyleData {
    pub fn from_computed(style: &ComputedStyle) -> Self {
        Self {
            position: style.value(StyleProperty::Position).to_string(),
            z_index: style.value(StyleProperty::ZIndex).to_string(),
            opacity: style.value(StyleProperty::Opacity).to_string(),
            display: style.value(StyleProperty::Display).to_string(),
            pointer_events: style.value(StyleProperty::PointerEvents).to_string(),
            cursor: style.value(StyleProperty::Cursor).to_string(),
        }
    }
}

/// Geometry derived from the bounding rectangle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionData {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    /// Element area as a fraction of the viewport area; 0 for an empty viewport.
    pub viewport_coverage_ratio: f64,
    pub is_in_viewport: bool,
}

/// Style snapshot of one ancestor. Depth 1 is the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AncestorStyleEntry {
    pub depth: usize,
    pub tag_name: String,
    #[serde(flatten)]
    pub style: StyleData,
}

/// Bounded observations about one candidate element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidencePacket {
    /// Sequential id, unique within one extraction pass.
    pub id: usize,
    pub tag_name: String,
    /// Truncated markup with ignored-tag subtrees removed. The cut is not
    /// structure-aware, so trailing markup may be malformed.
    pub html_snippet: String,
    pub attributes: AttributeMap,
    pub style: StyleData,
    pub position: PositionData,
    pub style_ancestry: Vec<AncestorStyleEntry>,
    pub surrounding_text: Vec<String>,
    #[serde(rename = "isInIFrame")]
    pub is_in_iframe: bool,
}

/// Output of one extraction pass over a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub url: String,
    /// ISO-8601, UTC.
    pub timestamp: String,
    /// Candidates that survived filtering, before the `maxElems` cap.
    pub candidate_count: usize,
    /// Candidates kept after the cap. Packets may be fewer when candidates
    /// left the document before extraction.
    pub capped_count: usize,
    pub packets: Vec<EvidencePacket>,
}
