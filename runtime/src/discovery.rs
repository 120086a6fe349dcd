//! Candidate discovery: find interactive and ad-container elements worth
//! extracting evidence for.
//!
//! Interactive matches come first, then ad containers, each in document
//! order. Duplicates keep their first position. Filtering drops elements under
//! an ignored tag, hidden elements and elements below the size minimums, and
//! the survivors are capped to `maxElems` without reordering.

use crate::config::{CompiledConfig, ConfigError, ExtractionConfig};
use crate::dom::DocumentTree;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// Result of candidate discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery<N> {
    /// Surviving candidates in discovery order, at most `maxElems`.
    pub candidates: Vec<N>,
    /// How many elements survived filtering before the cap.
    pub filtered_count: usize,
}

/// Discover candidates under `scope` (the whole document when `None`).
///
/// Selectors are compiled before the document is touched; a malformed
/// selector aborts discovery with a [`ConfigError`].
pub fn discover_candidates<T: DocumentTree>(
    tree: &T,
    scope: Option<T::Node>,
    config: &ExtractionConfig,
) -> Result<Discovery<T::Node>, ConfigError> {
    let compiled = config.compile()?;
    Ok(discover_with(tree, scope, &compiled))
}

/// Discovery with an already validated configuration.
pub fn discover_with<T: DocumentTree>(
    tree: &T,
    scope: Option<T::Node>,
    compiled: &CompiledConfig<'_>,
) -> Discovery<T::Node> {
    let config = compiled.config;

    let interactive = tree.query_all(scope, &compiled.interactive);
    let ad_containers = tree.query_all(scope, &compiled.ad_containers);
    let matched = interactive.len() + ad_containers.len();

    let mut seen = HashSet::new();
    let mut candidates: Vec<T::Node> = interactive
        .into_iter()
        .chain(ad_containers)
        .filter(|node| seen.insert(*node))
        .filter(|&node| is_eligible(tree, node, config))
        .collect();

    let filtered_count = candidates.len();
    candidates.truncate(config.max_elems);

    debug!(
        matched,
        unique = seen.len(),
        filtered = filtered_count,
        kept = candidates.len(),
        "candidate discovery complete"
    );

    Discovery {
        candidates,
        filtered_count,
    }
}

/// Whether an element passes the ancestor, visibility and size filters.
///
/// The ancestor check only walks parent links, so it runs before any style
/// or geometry lookup.
fn is_eligible<T: DocumentTree>(tree: &T, node: T::Node, config: &ExtractionConfig) -> bool {
    if has_ignored_ancestor(tree, node, &config.ignored_tags) {
        return false;
    }

    match tree.computed_style(node) {
        Ok(style) if style.is_hidden() => return false,
        Ok(_) => {}
        Err(_) => return false,
    }

    match tree.bounding_rect(node) {
        Ok(rect) => rect.width >= config.min_elem_width && rect.height >= config.min_elem_height,
        Err(_) => false,
    }
}

fn has_ignored_ancestor<T: DocumentTree>(tree: &T, node: T::Node, ignored: &BTreeSet<String>) -> bool {
    std::iter::successors(tree.parent_element(node), |&n| tree.parent_element(n))
        .any(|ancestor| ignored.contains(tree.tag_name(ancestor)))
}
