//! In-memory document parsed from HTML markup.
//!
//! Markup is parsed once with `scraper`; the element tree is then mirrored
//! into a flat pre-order arena so navigation, text and subtree copies do not
//! need to borrow the parser's tree. Selector matching walks the parsed tree
//! in the same pre-order, so arena indices and match positions line up.

use super::fragment::{Fragment, FragmentNode};
use super::layout::{self, ElementLayout};
use super::{ComputedStyle, DocumentTree, DomError, FrameContext, Rect, Viewport};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Handle to an element of an [`HtmlDocument`]: its pre-order position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Child {
    Element(usize),
    Text(String),
    Comment(String),
    /// `<template>` content, kept as serialized markup.
    Raw(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<Child>,
    /// Index of the last element in this element's subtree.
    pub(crate) subtree_end: usize,
}

impl ElementData {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn child_elements(&self) -> impl Iterator<Item = usize> + '_ {
        self.children.iter().filter_map(|child| match child {
            Child::Element(index) => Some(*index),
            _ => None,
        })
    }
}

/// A parsed document with per-element layout.
#[derive(Debug)]
pub struct HtmlDocument {
    html: Html,
    elements: Vec<ElementData>,
    layout: Vec<ElementLayout>,
    url: String,
    viewport: Viewport,
    frame: FrameContext,
    /// Roots of subtrees removed since parsing.
    removed: HashSet<usize>,
}

impl HtmlDocument {
    /// Parse markup and synthesize layout from inline `style` attributes.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        let elements = mirror_elements(&html);
        let layout = layout::synthesize(&elements);
        Self::assemble(html, elements, layout)
    }

    /// Parse markup and attach layout records captured from a browser, one
    /// per element in document order.
    pub fn with_layout(markup: &str, layout: Vec<ElementLayout>) -> Result<Self, DomError> {
        let html = Html::parse_document(markup);
        let elements = mirror_elements(&html);
        if elements.len() != layout.len() {
            return Err(DomError::LayoutLength {
                expected: elements.len(),
                found: layout.len(),
            });
        }
        Ok(Self::assemble(html, elements, layout))
    }

    fn assemble(html: Html, elements: Vec<ElementData>, layout: Vec<ElementLayout>) -> Self {
        Self {
            html,
            elements,
            layout,
            url: "about:blank".to_string(),
            viewport: Viewport::default(),
            frame: FrameContext::TopLevel,
            removed: HashSet::new(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn with_frame_context(mut self, frame: FrameContext) -> Self {
        self.frame = frame;
        self
    }

    /// Number of elements parsed from the markup.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// All element handles in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.elements.len()).map(NodeId)
    }

    #[cfg(test)]
    pub(crate) fn layout(&self, node: NodeId) -> Option<&ElementLayout> {
        self.layout.get(node.0)
    }

    /// Remove an element and its subtree from the document, the way a page
    /// script calling `element.remove()` would. Existing handles stay valid
    /// but report the element as detached.
    pub fn remove(&mut self, node: NodeId) {
        if node.0 < self.elements.len() {
            self.removed.insert(node.0);
        }
    }

    fn element(&self, node: NodeId) -> &ElementData {
        &self.elements[node.0]
    }

    fn connected_layout(&self, node: NodeId) -> Result<&ElementLayout, DomError> {
        if !self.is_connected(node) {
            return Err(DomError::Detached);
        }
        self.layout.get(node.0).ok_or(DomError::Detached)
    }

    fn sibling_elements(&self, node: NodeId) -> Vec<usize> {
        match self.parent_element(node) {
            Some(parent) => self.element(parent).child_elements().collect(),
            None => Vec::new(),
        }
    }

    fn collect_text(&self, index: usize, out: &mut String) {
        for child in &self.elements[index].children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(el) => self.collect_text(*el, out),
                Child::Comment(_) | Child::Raw(_) => {}
            }
        }
    }

    fn copy_subtree(&self, index: usize) -> Fragment {
        let el = &self.elements[index];
        let children = el
            .children
            .iter()
            .map(|child| match child {
                Child::Element(child) => FragmentNode::Element(self.copy_subtree(*child)),
                Child::Text(text) => FragmentNode::Text(text.clone()),
                Child::Comment(comment) => FragmentNode::Comment(comment.clone()),
                Child::Raw(markup) => FragmentNode::Raw(markup.clone()),
            })
            .collect();
        Fragment {
            tag: el.tag.clone(),
            attrs: el.attrs.clone(),
            children,
        }
    }
}

impl DocumentTree for HtmlDocument {
    type Node = NodeId;

    fn query_all(&self, scope: Option<NodeId>, selector: &Selector) -> Vec<NodeId> {
        let range = match scope {
            Some(scope) if !self.is_connected(scope) => return Vec::new(),
            Some(scope) => (scope.0 + 1)..=self.element(scope).subtree_end,
            None => 0..=self.elements.len().saturating_sub(1),
        };

        let mut order = Vec::with_capacity(self.elements.len());
        arena_order(self.html.root_element(), &mut order);
        order
            .into_iter()
            .enumerate()
            .filter(|(index, _)| range.contains(index))
            .filter(|(_, el)| selector.matches(el))
            .map(|(index, _)| NodeId(index))
            .filter(|node| self.is_connected(*node))
            .collect()
    }

    fn tag_name(&self, node: NodeId) -> &str {
        &self.element(node).tag
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).attr(name)
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle, DomError> {
        self.connected_layout(node).map(|l| l.style.clone())
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect, DomError> {
        self.connected_layout(node).map(|l| l.rect)
    }

    fn scroll_height(&self, node: NodeId) -> Result<f64, DomError> {
        self.connected_layout(node).map(|l| l.scroll_height)
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        if self.removed.contains(&node.0) {
            return None;
        }
        self.element(node).parent.map(NodeId)
    }

    fn previous_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.sibling_elements(node);
        let pos = siblings.iter().position(|&i| i == node.0)?;
        pos.checked_sub(1).map(|prev| NodeId(siblings[prev]))
    }

    fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.sibling_elements(node);
        let pos = siblings.iter().position(|&i| i == node.0)?;
        siblings.get(pos + 1).map(|&next| NodeId(next))
    }

    fn child_element_count(&self, node: NodeId) -> usize {
        self.element(node).child_elements().count()
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node.0, &mut out);
        out
    }

    fn direct_text(&self, node: NodeId) -> Vec<String> {
        self.element(node)
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Text(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn clone_subtree(&self, node: NodeId) -> Option<Fragment> {
        if !self.is_connected(node) {
            return None;
        }
        Some(self.copy_subtree(node.0))
    }

    fn is_connected(&self, node: NodeId) -> bool {
        if node.0 >= self.elements.len() {
            return false;
        }
        let mut current = Some(node.0);
        while let Some(index) = current {
            if self.removed.contains(&index) {
                return false;
            }
            current = self.elements[index].parent;
        }
        true
    }

    fn location(&self) -> &str {
        &self.url
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn is_top_level(&self) -> Result<bool, DomError> {
        match self.frame {
            FrameContext::TopLevel => Ok(true),
            FrameContext::Framed => Ok(false),
            FrameContext::CrossOrigin => Err(DomError::CrossOriginFrame),
        }
    }
}

/// Template content is inert: browsers keep it out of the element tree, so
/// neither the arena nor selector matching descends into it.
fn is_template(el: ElementRef<'_>) -> bool {
    el.value().name().eq_ignore_ascii_case("template")
}

/// Elements in arena order.
fn arena_order<'a>(el: ElementRef<'a>, out: &mut Vec<ElementRef<'a>>) {
    out.push(el);
    if is_template(el) {
        return;
    }
    for child in el.children().filter_map(ElementRef::wrap) {
        arena_order(child, out);
    }
}

/// Mirror the parsed element tree into a pre-order arena rooted at `<html>`.
fn mirror_elements(html: &Html) -> Vec<ElementData> {
    let mut elements = Vec::new();
    mirror_element(html.root_element(), None, &mut elements);
    elements
}

fn mirror_element(el: ElementRef<'_>, parent: Option<usize>, out: &mut Vec<ElementData>) -> usize {
    let index = out.len();
    out.push(ElementData {
        tag: el.value().name().to_ascii_lowercase(),
        attrs: el
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        parent,
        children: Vec::new(),
        subtree_end: index,
    });

    let mut children = Vec::new();
    if is_template(el) {
        let markup = el.inner_html();
        if !markup.is_empty() {
            children.push(Child::Raw(markup));
        }
        out[index].children = children;
        return index;
    }
    for child in el.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    children.push(Child::Element(mirror_element(child_el, Some(index), out)));
                }
            }
            Node::Text(text) => children.push(Child::Text((**text).to_owned())),
            Node::Comment(comment) => children.push(Child::Comment((**comment).to_owned())),
            _ => {}
        }
    }

    let subtree_end = out.len() - 1;
    let data = &mut out[index];
    data.children = children;
    data.subtree_end = subtree_end;
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StyleProperty;

    const PAGE: &str = r#"
        <html>
        <body>
            <div id="wrap">Intro text
                <span>first</span>
                <a href="/x" style="width:20px;height:20px">Go <b>now</b></a>
                <span>second</span>
            </div>
            <button>Other</button>
        </body>
        </html>
    "#;

    fn find(doc: &HtmlDocument, css: &str) -> NodeId {
        let sel = Selector::parse(css).unwrap();
        doc.query_all(None, &sel)[0]
    }

    #[test]
    fn test_arena_root_is_html_element() {
        let doc = HtmlDocument::parse(PAGE);
        let root = doc.nodes().next().unwrap();
        assert_eq!(doc.tag_name(root), "html");
        assert_eq!(doc.parent_element(root), None);
        assert!(doc.element_count() >= 7);
    }

    #[test]
    fn test_query_all_in_document_order_and_scope() {
        let doc = HtmlDocument::parse(PAGE);
        let all = Selector::parse("span, a, button").unwrap();
        let tags: Vec<&str> = doc
            .query_all(None, &all)
            .into_iter()
            .map(|n| doc.tag_name(n))
            .collect();
        assert_eq!(tags, vec!["span", "a", "span", "button"]);

        let wrap = find(&doc, "#wrap");
        let scoped = doc.query_all(Some(wrap), &all);
        assert_eq!(scoped.len(), 3);

        // The scope element itself never matches.
        let div = Selector::parse("div").unwrap();
        assert!(doc.query_all(Some(wrap), &div).is_empty());
    }

    #[test]
    fn test_sibling_navigation_skips_text_nodes() {
        let doc = HtmlDocument::parse(PAGE);
        let link = find(&doc, "a");
        let prev = doc.previous_element_sibling(link).unwrap();
        let next = doc.next_element_sibling(link).unwrap();
        assert_eq!(doc.text_content(prev), "first");
        assert_eq!(doc.text_content(next), "second");
        assert_eq!(doc.previous_element_sibling(prev), None);
    }

    #[test]
    fn test_text_content_and_direct_text() {
        let doc = HtmlDocument::parse(PAGE);
        let link = find(&doc, "a");
        assert_eq!(doc.text_content(link), "Go now");

        let wrap = find(&doc, "#wrap");
        let direct: Vec<String> = doc
            .direct_text(wrap)
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        assert_eq!(direct, vec!["Intro text"]);
    }

    #[test]
    fn test_removed_subtree_is_detached() {
        let mut doc = HtmlDocument::parse(PAGE);
        let wrap = find(&doc, "#wrap");
        let link = find(&doc, "a");
        doc.remove(wrap);

        assert!(!doc.is_connected(wrap));
        assert!(!doc.is_connected(link));
        assert_eq!(doc.computed_style(link), Err(DomError::Detached));
        assert_eq!(doc.bounding_rect(link), Err(DomError::Detached));
        assert!(doc.clone_subtree(link).is_none());
        assert_eq!(doc.parent_element(wrap), None);

        let links = Selector::parse("a").unwrap();
        assert!(doc.query_all(None, &links).is_empty());
    }

    #[test]
    fn test_clone_subtree_is_independent_copy() {
        let doc = HtmlDocument::parse(PAGE);
        let link = find(&doc, "a");
        let mut copy = doc.clone_subtree(link).unwrap();
        copy.children.clear();
        assert_eq!(doc.text_content(link), "Go now");
        assert!(copy.outer_html().starts_with("<a href=\"/x\""));
    }

    #[test]
    fn test_attributes_keep_source_order() {
        let doc = HtmlDocument::parse(
            r#"<a style="width:20px" href="/x" class="btn" data-slot="top">Get</a>"#,
        );
        let link = find(&doc, "a");
        let names: Vec<&str> = doc
            .element(link)
            .attrs
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["style", "href", "class", "data-slot"]);
        assert_eq!(
            doc.clone_subtree(link).unwrap().outer_html(),
            r#"<a style="width:20px" href="/x" class="btn" data-slot="top">Get</a>"#
        );
    }

    #[test]
    fn test_template_content_stays_out_of_element_tree() {
        let doc = HtmlDocument::parse(
            r#"<div id="host"><template><a href="/t">Inert</a></template><a href="/live">Live</a></div>"#,
        );
        let links = Selector::parse("a").unwrap();
        let found = doc.query_all(None, &links);
        assert_eq!(found.len(), 1);
        assert_eq!(doc.attribute(found[0], "href"), Some("/live"));

        let template = find(&doc, "template");
        assert_eq!(doc.child_element_count(template), 0);
        assert_eq!(doc.text_content(template), "");
        assert_eq!(doc.next_element_sibling(template), Some(found[0]));

        let host = find(&doc, "#host");
        assert_eq!(
            doc.clone_subtree(host).unwrap().outer_html(),
            r#"<div id="host"><template><a href="/t">Inert</a></template><a href="/live">Live</a></div>"#
        );
    }

    #[test]
    fn test_with_layout_rejects_length_mismatch() {
        let err = HtmlDocument::with_layout("<p>hi</p>", vec![ElementLayout::default()])
            .err()
            .unwrap();
        assert!(matches!(err, DomError::LayoutLength { found: 1, .. }));
    }

    #[test]
    fn test_frame_context() {
        let doc = HtmlDocument::parse("<p></p>");
        assert_eq!(doc.is_top_level(), Ok(true));
        let doc = doc.with_frame_context(FrameContext::CrossOrigin);
        assert_eq!(doc.is_top_level(), Err(DomError::CrossOriginFrame));
    }

    #[test]
    fn test_inline_style_reaches_computed_style() {
        let doc = HtmlDocument::parse(PAGE);
        let link = find(&doc, "a");
        let rect = doc.bounding_rect(link).unwrap();
        assert_eq!((rect.width, rect.height), (20.0, 20.0));
        let style = doc.computed_style(link).unwrap();
        assert_eq!(style.value(StyleProperty::Position), "static");
    }
}
