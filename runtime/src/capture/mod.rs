//! Page capture: snapshot a live page into an [`HtmlDocument`].
//!
//! The capture script serializes the document markup together with one
//! layout record per element (computed style subset, bounding rect, scroll
//! height) in pre-order. Re-parsing the markup yields the same element order,
//! so records attach by position; the tag of every record is checked against
//! the re-parsed element to catch markup that does not round-trip.

use crate::dom::{
    ComputedStyle, DocumentTree, DomError, ElementLayout, FrameContext, HtmlDocument, Rect,
    Viewport,
};
use crate::renderer::RenderContext;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Script evaluated in the page. Its completion value is the capture as a
/// JSON string.
pub const CAPTURE_SCRIPT: &str = include_str!("capture_page.js");

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("capture script failed: {0}")]
    Script(String),
    #[error("malformed capture payload")]
    Payload(#[from] serde_json::Error),
    #[error(transparent)]
    Layout(#[from] DomError),
    #[error("layout record {index} is for <{expected}> but the markup has <{found}> there")]
    TagMismatch {
        index: usize,
        expected: String,
        found: String,
    },
}

/// Layout of one element as the browser reported it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedElement {
    pub tag: String,
    pub style: ComputedStyle,
    pub rect: Rect,
    #[serde(default)]
    pub scroll_height: f64,
}

/// Serialized state of a rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageCapture {
    pub url: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub frame: FrameContext,
    pub html: String,
    pub elements: Vec<CapturedElement>,
}

impl PageCapture {
    pub fn from_json_str(json: &str) -> Result<Self, CaptureError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Accepts the script result either as the JSON string it returns or as
    /// an already decoded object (some drivers decode string results).
    pub fn from_value(value: serde_json::Value) -> Result<Self, CaptureError> {
        match value {
            serde_json::Value::String(json) => Self::from_json_str(&json),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    /// Re-parse the markup and attach the captured layout.
    pub fn into_document(self) -> Result<HtmlDocument, CaptureError> {
        let tags: Vec<String> = self.elements.iter().map(|e| e.tag.clone()).collect();
        let layout = self
            .elements
            .into_iter()
            .map(|e| ElementLayout {
                style: e.style,
                rect: e.rect,
                scroll_height: e.scroll_height,
            })
            .collect();

        let doc = HtmlDocument::with_layout(&self.html, layout)?
            .with_url(self.url)
            .with_viewport(self.viewport)
            .with_frame_context(self.frame);

        for (node, expected) in doc.nodes().zip(tags) {
            let found = doc.tag_name(node);
            if !found.eq_ignore_ascii_case(&expected) {
                return Err(CaptureError::TagMismatch {
                    index: node.index(),
                    expected,
                    found: found.to_string(),
                });
            }
        }

        debug!(elements = doc.element_count(), "capture attached to document");
        Ok(doc)
    }
}

/// Run the capture script in a live page.
pub async fn capture_page(context: &dyn RenderContext) -> Result<PageCapture, CaptureError> {
    let value = context
        .execute_js(CAPTURE_SCRIPT)
        .await
        .map_err(|e| CaptureError::Script(format!("{e:#}")))?;
    let capture = PageCapture::from_value(value)?;
    info!(
        url = %capture.url,
        elements = capture.elements.len(),
        "captured page"
    );
    Ok(capture)
}

/// Capture a live page and build a document from it.
pub async fn capture_document(context: &dyn RenderContext) -> Result<HtmlDocument, CaptureError> {
    capture_page(context).await?.into_document()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::StyleProperty;
    use async_trait::async_trait;
    use serde_json::json;

    fn element(tag: &str, display: &str, rect: [f64; 4]) -> serde_json::Value {
        json!({
            "tag": tag,
            "style": {"position": "static", "display": display, "visibility": "visible"},
            "rect": {"top": rect[0], "left": rect[1], "width": rect[2], "height": rect[3]},
            "scrollHeight": rect[3],
        })
    }

    fn sample_capture() -> serde_json::Value {
        json!({
            "url": "https://example.com/download",
            "viewport": {"width": 1024.0, "height": 768.0},
            "frame": "cross-origin",
            "html": "<head></head><body><a href=\"/x\">Get</a></body>",
            "elements": [
                element("html", "block", [0.0, 0.0, 1024.0, 768.0]),
                element("head", "none", [0.0, 0.0, 0.0, 0.0]),
                element("body", "block", [0.0, 0.0, 1024.0, 768.0]),
                element("a", "inline", [8.0, 8.0, 24.0, 18.0]),
            ],
        })
    }

    struct StaticPage(serde_json::Value);

    #[async_trait]
    impl RenderContext for StaticPage {
        async fn execute_js(&self, script: &str) -> anyhow::Result<serde_json::Value> {
            assert_eq!(script, CAPTURE_SCRIPT);
            Ok(self.0.clone())
        }
    }

    struct BrokenPage;

    #[async_trait]
    impl RenderContext for BrokenPage {
        async fn execute_js(&self, _script: &str) -> anyhow::Result<serde_json::Value> {
            anyhow::bail!("target closed")
        }
    }

    #[test]
    fn test_capture_becomes_document() {
        let capture = PageCapture::from_value(sample_capture()).unwrap();
        let doc = capture.into_document().unwrap();

        assert_eq!(doc.location(), "https://example.com/download");
        assert_eq!(doc.viewport(), Viewport::new(1024.0, 768.0));
        assert_eq!(doc.is_top_level(), Err(DomError::CrossOriginFrame));

        let link = doc.nodes().find(|&n| doc.tag_name(n) == "a").unwrap();
        assert_eq!(doc.bounding_rect(link).unwrap(), Rect::new(8.0, 8.0, 24.0, 18.0));
        let style = doc.computed_style(link).unwrap();
        assert_eq!(style.value(StyleProperty::Display), "inline");
        // Properties the capture left out fall back to initial values.
        assert_eq!(style.value(StyleProperty::Opacity), "1");
    }

    #[test]
    fn test_string_payload_is_decoded() {
        let as_string = serde_json::Value::String(sample_capture().to_string());
        let capture = PageCapture::from_value(as_string).unwrap();
        assert_eq!(capture.elements.len(), 4);
        assert_eq!(capture.frame, FrameContext::CrossOrigin);
    }

    #[test]
    fn test_record_count_mismatch() {
        let mut value = sample_capture();
        value["elements"].as_array_mut().unwrap().pop();
        let err = PageCapture::from_value(value)
            .unwrap()
            .into_document()
            .unwrap_err();
        assert!(matches!(
            err,
            CaptureError::Layout(DomError::LayoutLength {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_tag_mismatch() {
        let mut value = sample_capture();
        value["elements"][3]["tag"] = json!("button");
        let err = PageCapture::from_value(value)
            .unwrap()
            .into_document()
            .unwrap_err();
        match err {
            CaptureError::TagMismatch {
                index,
                expected,
                found,
            } => {
                assert_eq!(index, 3);
                assert_eq!(expected, "button");
                assert_eq!(found, "a");
            }
            other => panic!("expected TagMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_payload() {
        assert!(matches!(
            PageCapture::from_json_str("{\"url\": 3}"),
            Err(CaptureError::Payload(_))
        ));
    }

    #[tokio::test]
    async fn test_capture_through_render_context() {
        let doc = capture_document(&StaticPage(sample_capture())).await.unwrap();
        assert_eq!(doc.element_count(), 4);

        let err = capture_page(&BrokenPage).await.unwrap_err();
        match err {
            CaptureError::Script(message) => assert!(message.contains("target closed")),
            other => panic!("expected Script, got {other:?}"),
        }
    }

    #[test]
    fn test_script_returns_capture_shape() {
        assert!(CAPTURE_SCRIPT.contains("getBoundingClientRect"));
        assert!(CAPTURE_SCRIPT.contains("scrollHeight"));
        assert!(CAPTURE_SCRIPT.contains("cross-origin"));
    }
}
