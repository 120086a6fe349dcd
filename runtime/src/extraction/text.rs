//! Nearby text context for a candidate.

use crate::config::ExtractionConfig;
use crate::dom::DocumentTree;
use std::collections::HashSet;

/// Cut `text` to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Collect text labels around a candidate.
///
/// Sibling elements contribute their whole trimmed text content (nearest
/// first, previous side then next side, up to `siblingRadius` each). Each
/// ancestor up to `ancestorDepth` contributes its own direct text nodes,
/// joined. Fragments are cut to `maxSurroundingTextLength`, exact duplicates
/// are dropped (first occurrence kept), and at most
/// `maxSurroundingTextFragments` are returned.
pub fn extract_surrounding_text<T: DocumentTree>(
    tree: &T,
    node: T::Node,
    config: &ExtractionConfig,
) -> Vec<String> {
    let mut texts = Vec::new();

    collect_sibling_text(
        tree,
        node,
        |n| tree.previous_element_sibling(n),
        config.sibling_radius,
        &mut texts,
    );
    collect_sibling_text(
        tree,
        node,
        |n| tree.next_element_sibling(n),
        config.sibling_radius,
        &mut texts,
    );

    let ancestors = std::iter::successors(tree.parent_element(node), |&n| tree.parent_element(n));
    for ancestor in ancestors.take(config.ancestor_depth) {
        let text = own_text(tree, ancestor);
        if !text.is_empty() {
            texts.push(text);
        }
    }

    let mut seen = HashSet::new();
    texts
        .iter()
        .map(|t| truncate_chars(t, config.max_surrounding_text_length))
        .filter(|t| seen.insert(*t))
        .take(config.max_surrounding_text_fragments)
        .map(str::to_string)
        .collect()
}

fn collect_sibling_text<T, F>(tree: &T, node: T::Node, step: F, radius: usize, out: &mut Vec<String>)
where
    T: DocumentTree,
    F: Fn(T::Node) -> Option<T::Node>,
{
    for sibling in std::iter::successors(step(node), |&n| step(n)).take(radius) {
        let text = tree.text_content(sibling);
        let text = text.trim();
        if !text.is_empty() {
            out.push(text.to_string());
        }
    }
}

/// The element's own text nodes, each trimmed, joined by single spaces.
fn own_text<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    tree.direct_text(node)
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
