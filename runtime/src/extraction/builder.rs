//! Build one evidence packet per candidate.
//!
//! Every sub-extraction degrades to an empty or default value instead of
//! failing, so one odd element never aborts the pass. The only candidate that
//! yields no packet is one that has left the document since discovery.

use super::packet::{
    AncestorStyleEntry, AttributeMap, AttributeName, EvidencePacket, ExtractionResult,
    PositionData, StyleData,
};
use super::text::{extract_surrounding_text, truncate_chars};
use crate::config::ExtractionConfig;
use crate::discovery::Discovery;
use crate::dom::{ComputedStyle, DocumentTree, Rect, Viewport};
use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};

/// Build packets for every discovered candidate. Packet ids are candidate
/// indices, so a skipped candidate leaves a gap rather than shifting ids.
pub fn extract_evidence<T: DocumentTree>(
    tree: &T,
    discovery: &Discovery<T::Node>,
    config: &ExtractionConfig,
) -> ExtractionResult {
    let packets: Vec<EvidencePacket> = discovery
        .candidates
        .iter()
        .enumerate()
        .filter_map(|(index, &node)| build_packet(tree, node, index, config))
        .collect();

    info!(
        url = tree.location(),
        candidates = discovery.filtered_count,
        packets = packets.len(),
        "evidence extraction complete"
    );

    ExtractionResult {
        url: tree.location().to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        candidate_count: discovery.filtered_count,
        capped_count: discovery.candidates.len(),
        packets,
    }
}

/// Build the packet for one candidate, or `None` if it is no longer in the
/// document.
pub fn build_packet<T: DocumentTree>(
    tree: &T,
    node: T::Node,
    index: usize,
    config: &ExtractionConfig,
) -> Option<EvidencePacket> {
    if !tree.is_connected(node) {
        warn!(candidate = index, "candidate left the document before extraction, skipping");
        return None;
    }

    Some(EvidencePacket {
        id: index,
        tag_name: tree.tag_name(node).to_string(),
        html_snippet: extract_snippet(tree, node, config),
        attributes: extract_attributes(tree, node),
        style: extract_style(tree, node),
        position: extract_position(tree, node),
        style_ancestry: extract_style_ancestry(tree, node, config),
        surrounding_text: extract_surrounding_text(tree, node, config),
        is_in_iframe: is_in_iframe(tree),
    })
}

/// Serialized markup of a detached copy with ignored-tag subtrees removed,
/// cut to `maxSnippetLength` characters.
pub fn extract_snippet<T: DocumentTree>(
    tree: &T,
    node: T::Node,
    config: &ExtractionConfig,
) -> String {
    let Some(mut copy) = tree.clone_subtree(node) else {
        return String::new();
    };
    copy.remove_descendants(&config.ignored_tags);
    let html = copy.outer_html();
    truncate_chars(&html, config.max_snippet_length).to_string()
}

pub fn extract_attributes<T: DocumentTree>(tree: &T, node: T::Node) -> AttributeMap {
    AttributeName::WHITELIST
        .into_iter()
        .filter_map(|name| {
            tree.attribute(node, name.as_str())
                .map(|value| (name, value.to_string()))
        })
        .collect()
}

pub fn extract_style<T: DocumentTree>(tree: &T, node: T::Node) -> StyleData {
    let style = tree.computed_style(node).unwrap_or_else(|err| {
        debug!(?node, %err, "computed style unavailable, using initial values");
        ComputedStyle::default()
    });
    StyleData::from_computed(&style)
}

pub fn extract_position<T: DocumentTree>(tree: &T, node: T::Node) -> PositionData {
    let rect = tree.bounding_rect(node).unwrap_or_else(|err| {
        debug!(?node, %err, "bounding rect unavailable, using empty box");
        Rect::default()
    });
    let viewport = tree.viewport();

    PositionData {
        top: rect.top,
        left: rect.left,
        width: rect.width,
        height: rect.height,
        viewport_coverage_ratio: coverage_ratio(&rect, &viewport),
        is_in_viewport: viewport.intersects(&rect),
    }
}

/// Element area over viewport area, 0 when the viewport has no area.
pub fn coverage_ratio(rect: &Rect, viewport: &Viewport) -> f64 {
    let viewport_area = viewport.area();
    if viewport_area > 0.0 {
        rect.area() / viewport_area
    } else {
        0.0
    }
}

/// Style snapshots of ancestors, parent first, stopping at the depth cap or
/// at a boundary tag (which is not recorded).
pub fn extract_style_ancestry<T: DocumentTree>(
    tree: &T,
    node: T::Node,
    config: &ExtractionConfig,
) -> Vec<AncestorStyleEntry> {
    std::iter::successors(tree.parent_element(node), |&n| tree.parent_element(n))
        .take(config.max_style_ancestor_depth)
        .take_while(|&ancestor| !config.boundary_tags.contains(tree.tag_name(ancestor)))
        .enumerate()
        .map(|(i, ancestor)| AncestorStyleEntry {
            depth: i + 1,
            tag_name: tree.tag_name(ancestor).to_string(),
            style: extract_style(tree, ancestor),
        })
        .collect()
}

/// Whether the document is framed. A failed identity check (cross-origin
/// parent) counts as framed.
pub fn is_in_iframe<T: DocumentTree>(tree: &T) -> bool {
    match tree.is_top_level() {
        Ok(top_level) => !top_level,
        Err(err) => {
            debug!(%err, "frame identity check failed, treating document as framed");
            true
        }
    }
}
