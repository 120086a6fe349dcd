//! Per-element layout records and the synthetic layout used without a browser.
//!
//! Synthetic layout reads inline `style` declarations only. It resolves the
//! style subset the pipeline cares about (with inheritance for `visibility`,
//! `pointer-events` and `cursor`) and positions boxes from explicit pixel
//! `top`/`left`/`width`/`height`. Elements without an explicit size get a
//! zero-sized box, and anything under a `display: none` ancestor is not laid
//! out at all.

use super::html::ElementData;
use super::{ComputedStyle, Rect, StyleProperty};
use serde::{Deserialize, Serialize};

/// Resolved style and geometry of one element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementLayout {
    pub style: ComputedStyle,
    pub rect: Rect,
    #[serde(default)]
    pub scroll_height: f64,
}

/// Split an inline `style` attribute into lowercase property names and
/// trimmed values. `!important` markers are dropped.
pub fn parse_inline_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value
                .strip_suffix("!important")
                .map(str::trim_end)
                .unwrap_or(value);
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

/// Parse a pixel length: `12px`, `12.5px` or a bare number.
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// UA default `display` for a tag.
fn default_display(tag: &str) -> &'static str {
    match tag {
        "head" | "script" | "style" | "meta" | "link" | "title" | "template" | "noscript"
        | "base" => "none",
        "html" | "body" | "div" | "p" | "section" | "article" | "header" | "footer" | "nav"
        | "main" | "aside" | "form" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
        | "figure" | "blockquote" | "pre" | "hr" | "dl" | "dd" | "dt" | "fieldset" => "block",
        "li" => "list-item",
        "button" | "input" | "select" | "textarea" => "inline-block",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        _ => "inline",
    }
}

fn declared<'a>(decls: &'a [(String, String)], name: &str) -> Option<&'a str> {
    // Later declarations win.
    decls
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Build layout records for a pre-order element arena.
pub(crate) fn synthesize(elements: &[ElementData]) -> Vec<ElementLayout> {
    let mut layouts: Vec<ElementLayout> = Vec::with_capacity(elements.len());
    let mut suppressed: Vec<bool> = Vec::with_capacity(elements.len());

    for el in elements {
        let parent = el.parent.map(|p| (&layouts[p], suppressed[p]));
        let decls = el.attr("style").map(parse_inline_style).unwrap_or_default();

        let mut style = ComputedStyle::new();
        for prop in StyleProperty::ALL {
            let inherited = match parent {
                Some((p, _)) if prop.is_inherited() => p.style.value(prop).to_string(),
                _ => prop.initial_value().to_string(),
            };
            style.set(prop, inherited);
        }
        style.set(StyleProperty::Display, default_display(&el.tag));
        if el.attr("hidden").is_some() {
            style.set(StyleProperty::Display, "none");
        }
        for (name, value) in &decls {
            let Some(prop) = StyleProperty::from_css_name(name) else {
                continue;
            };
            let resolved = match value.as_str() {
                "inherit" => parent
                    .map(|(p, _)| p.style.value(prop).to_string())
                    .unwrap_or_else(|| prop.initial_value().to_string()),
                "initial" | "unset" => prop.initial_value().to_string(),
                other => other.to_string(),
            };
            style.set(prop, resolved);
        }

        let hidden_here = style.value(StyleProperty::Display) == "none";
        let is_suppressed = hidden_here || parent.is_some_and(|(_, s)| s);

        let rect = if is_suppressed {
            Rect::default()
        } else {
            let length = |name: &str| {
                declared(&decls, name)
                    .and_then(parse_px)
                    .or_else(|| el.attr(name).and_then(parse_px))
            };
            let offset = |name: &str| declared(&decls, name).and_then(parse_px).unwrap_or(0.0);

            let (origin_top, origin_left) = match parent {
                Some((p, _)) => (p.rect.top, p.rect.left),
                None => (0.0, 0.0),
            };
            let (top, left) = match style.value(StyleProperty::Position) {
                "fixed" => (offset("top"), offset("left")),
                "static" => (origin_top, origin_left),
                _ => (origin_top + offset("top"), origin_left + offset("left")),
            };
            Rect::new(
                top,
                left,
                length("width").unwrap_or(0.0).max(0.0),
                length("height").unwrap_or(0.0).max(0.0),
            )
        };

        suppressed.push(is_suppressed);
        layouts.push(ElementLayout {
            style,
            rect,
            scroll_height: rect.height,
        });
    }

    // Children sit after their parent in pre-order, so a reverse sweep sees
    // every descendant's final extent before the parent's.
    for index in (0..elements.len()).rev() {
        let Some(parent) = elements[index].parent else {
            continue;
        };
        let child = &layouts[index];
        let extent = child.rect.top + child.scroll_height - layouts[parent].rect.top;
        if extent > layouts[parent].scroll_height {
            layouts[parent].scroll_height = extent;
        }
    }

    layouts
}
