//! Ad-slot presence check.
//!
//! Ad networks fill their slots asynchronously, so a slot that is empty at
//! load may be populated seconds later. [`check_ad_slots`] answers "what do
//! the slots look like right now" and keeps nothing between calls; timing
//! the rechecks is up to the caller (see [`crate::live::recheck`]).

use crate::config::{ConfigError, ExtractionConfig};
use crate::dom::{DocumentTree, Rect, StyleProperty};
use crate::extraction::text::truncate_chars;
use chrono::{SecondsFormat, Utc};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Class attributes are cut to this many characters when used as an identifier.
const CLASS_IDENTIFIER_LENGTH: usize = 40;

static IFRAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("iframe").expect("valid iframe selector"));

/// State of one rendered ad container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSlot {
    pub tag_name: String,
    /// Element id, or the start of the class attribute when there is no id.
    pub identifier: String,
    pub rect: Rect,
    pub child_count: usize,
    pub iframe_count: usize,
    /// Has child elements and content taller than one pixel.
    pub populated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSlotReport {
    pub label: String,
    /// ISO-8601, UTC.
    pub checked_at: String,
    pub slots: Vec<AdSlot>,
}

impl AdSlotReport {
    pub fn populated_count(&self) -> usize {
        self.slots.iter().filter(|s| s.populated).count()
    }
}

/// Check every ad container matched by the configured selector.
pub fn check_ad_slots<T: DocumentTree>(
    tree: &T,
    config: &ExtractionConfig,
    label: &str,
) -> Result<AdSlotReport, ConfigError> {
    let selector = config.ad_container_selector()?;
    Ok(check_ad_slots_with(tree, &selector, label))
}

/// Check with an already compiled ad-container selector.
pub fn check_ad_slots_with<T: DocumentTree>(
    tree: &T,
    selector: &Selector,
    label: &str,
) -> AdSlotReport {
    let slots: Vec<AdSlot> = tree
        .query_all(None, selector)
        .into_iter()
        .filter_map(|node| inspect_slot(tree, node))
        .collect();

    debug!(
        label,
        slots = slots.len(),
        populated = slots.iter().filter(|s| s.populated).count(),
        "ad-slot check complete"
    );

    AdSlotReport {
        label: label.to_string(),
        checked_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        slots,
    }
}

/// Snapshot one container, or `None` when it is not rendered.
fn inspect_slot<T: DocumentTree>(tree: &T, node: T::Node) -> Option<AdSlot> {
    let rect = tree.bounding_rect(node).ok()?;
    let style = tree.computed_style(node).ok()?;
    if (rect.width == 0.0 && rect.height == 0.0) || style.value(StyleProperty::Display) == "none" {
        return None;
    }

    let child_count = tree.child_element_count(node);
    let scroll_height = tree.scroll_height(node).unwrap_or(0.0);

    Some(AdSlot {
        tag_name: tree.tag_name(node).to_string(),
        identifier: slot_identifier(tree, node),
        rect,
        child_count,
        iframe_count: tree.query_all(Some(node), &IFRAME_SELECTOR).len(),
        populated: child_count > 0 && scroll_height > 1.0,
    })
}

fn slot_identifier<T: DocumentTree>(tree: &T, node: T::Node) -> String {
    match tree.attribute(node, "id").filter(|id| !id.is_empty()) {
        Some(id) => id.to_string(),
        None => {
            let class = tree.attribute(node, "class").unwrap_or("");
            truncate_chars(class, CLASS_IDENTIFIER_LENGTH).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;

    const SLOTS: &str = r#"
        <div id="div-gpt-ad-top" style="width:728px;height:90px">
          <iframe style="width:728px;height:90px"></iframe>
        </div>
        <ins class="adsbygoogle adsbygoogle-noablate" style="display:block;width:300px;height:250px"></ins>
        <div class="ad-slot" style="width:0;height:0"></div>
        <div class="ad-container" style="display:none;width:300px;height:250px"><p>x</p></div>
    "#;

    #[test]
    fn test_reports_rendered_slots_only() {
        let doc = HtmlDocument::parse(SLOTS);
        let report = check_ad_slots(&doc, &ExtractionConfig::default(), "t=0s").unwrap();

        assert_eq!(report.label, "t=0s");
        assert_eq!(report.slots.len(), 2);

        let gpt = &report.slots[0];
        assert_eq!(gpt.tag_name, "div");
        assert_eq!(gpt.identifier, "div-gpt-ad-top");
        assert_eq!(gpt.child_count, 1);
        assert_eq!(gpt.iframe_count, 1);
        assert!(gpt.populated);

        let adsense = &report.slots[1];
        assert_eq!(adsense.tag_name, "ins");
        assert_eq!(adsense.identifier, "adsbygoogle adsbygoogle-noablate");
        assert_eq!(adsense.rect, Rect::new(0.0, 0.0, 300.0, 250.0));
        assert_eq!(adsense.child_count, 0);
        assert!(!adsense.populated);

        assert_eq!(report.populated_count(), 1);
    }

    #[test]
    fn test_children_without_height_are_not_populated() {
        let doc = HtmlDocument::parse(
            r#"<div class="ad-slot" style="width:300px;height:1px"><span></span></div>"#,
        );
        let report = check_ad_slots(&doc, &ExtractionConfig::default(), "t=3s").unwrap();
        assert_eq!(report.slots.len(), 1);
        assert_eq!(report.slots[0].child_count, 1);
        assert!(!report.slots[0].populated);
    }

    #[test]
    fn test_class_identifier_is_cut() {
        let class = format!("ad-slot {}", "x".repeat(60));
        let doc = HtmlDocument::parse(&format!(
            r#"<div id="" class="{class}" style="width:10px;height:10px"></div>"#
        ));
        let report = check_ad_slots(&doc, &ExtractionConfig::default(), "t=0s").unwrap();
        assert_eq!(report.slots[0].identifier, &class[..40]);
    }

    #[test]
    fn test_repeated_checks_are_independent() {
        let doc = HtmlDocument::parse(SLOTS);
        let config = ExtractionConfig::default();
        let first = check_ad_slots(&doc, &config, "t=0s").unwrap();
        let second = check_ad_slots(&doc, &config, "t=6s").unwrap();
        assert_eq!(first.slots, second.slots);
        assert_eq!(second.label, "t=6s");
    }

    #[test]
    fn test_invalid_ad_selector() {
        let doc = HtmlDocument::parse(SLOTS);
        let config = ExtractionConfig::default().with_ad_container_selectors("div[");
        assert!(check_ad_slots(&doc, &config, "t=0s").is_err());
    }

    #[test]
    fn test_report_wire_shape() {
        let doc = HtmlDocument::parse(SLOTS);
        let report = check_ad_slots(&doc, &ExtractionConfig::default(), "t=0s").unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("checkedAt").is_some());
        assert_eq!(json["slots"][0]["iframeCount"], 1);
        assert_eq!(json["slots"][0]["rect"]["width"], 728.0);
    }
}
