//! Detached element subtrees and their HTML serialization.
//!
//! A fragment is an owned copy: callers prune it freely while the document,
//! and any element a page script already removed, stay untouched. Serializing
//! the copy here avoids cloning the whole parsed tree per snippet.

use std::collections::BTreeSet;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
    "param", "source", "track", "wbr",
];

/// Elements whose text children are serialized verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script",
    "style",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
    "noscript",
];

/// A node inside a detached copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element(Fragment),
    Text(String),
    Comment(String),
    /// Markup written out verbatim (`<template>` content).
    Raw(String),
}

/// An owned deep copy of one element and its descendants.
///
/// Edits to a fragment never reach the document it was copied from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<FragmentNode>,
}

impl Fragment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Remove every descendant subtree rooted at one of `tags`.
    ///
    /// The root element itself is kept even when its own tag is listed.
    pub fn remove_descendants(&mut self, tags: &BTreeSet<String>) {
        self.children.retain_mut(|child| match child {
            FragmentNode::Element(el) => {
                if tags.contains(&el.tag) {
                    false
                } else {
                    el.remove_descendants(tags);
                    true
                }
            }
            _ => true,
        });
    }

    #[cfg(test)]
    fn contains_tag(&self, tags: &BTreeSet<String>) -> bool {
        self.children.iter().any(|child| match child {
            FragmentNode::Element(el) => tags.contains(&el.tag) || el.contains_tag(tags),
            _ => false,
        })
    }

    /// Serialize the element the way `outerHTML` does.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }

        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            match child {
                FragmentNode::Element(el) => el.write_html(out),
                FragmentNode::Text(text) if raw => out.push_str(text),
                FragmentNode::Text(text) => escape_text(text, out),
                FragmentNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                }
                FragmentNode::Raw(markup) => out.push_str(markup),
            }
        }

        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
