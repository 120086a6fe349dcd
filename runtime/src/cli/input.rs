//! Loading documents and configuration for CLI commands.

use crate::capture::PageCapture;
use crate::config::ExtractionConfig;
use crate::dom::{FrameContext, HtmlDocument, Viewport};
use anyhow::{bail, Context, Result};
use clap::Args;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Width and height given as `WxH`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// Parse `1280x720` (also `1280X720`).
pub fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| format!("invalid dimension {v:?} in {s:?}"))
    };
    Ok(Dimensions {
        width: parse(w)?,
        height: parse(h)?,
    })
}

/// Per-call configuration overrides, applied on top of the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Cap on candidates per pass
    #[arg(long, global = true)]
    pub max_elems: Option<usize>,
    /// Interactive element selector list
    #[arg(long, global = true)]
    pub interactive_selectors: Option<String>,
    /// Ad-container selector list
    #[arg(long, global = true)]
    pub ad_selectors: Option<String>,
    /// Minimum candidate size as WxH
    #[arg(long, global = true, value_parser = parse_dimensions)]
    pub min_size: Option<Dimensions>,
}

/// How to interpret an input file.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Input is a page capture JSON file instead of raw HTML
    #[arg(long)]
    pub capture: bool,
    /// Document URL to report (defaults to the input's file URL)
    #[arg(long)]
    pub url: Option<String>,
    /// Viewport for synthetic layout as WxH
    #[arg(long, value_parser = parse_dimensions)]
    pub viewport: Option<Dimensions>,
    /// Treat the document as loaded inside a frame
    #[arg(long)]
    pub framed: bool,
}

/// Build the effective configuration: defaults, then the config file, then
/// command-line overrides.
pub fn load_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<ExtractionConfig> {
    let mut config = match path {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::shared_default().clone(),
    };

    if let Some(max) = overrides.max_elems {
        config = config.with_max_elems(max);
    }
    if let Some(selectors) = &overrides.interactive_selectors {
        config = config.with_interactive_selectors(selectors.clone());
    }
    if let Some(selectors) = &overrides.ad_selectors {
        config = config.with_ad_container_selectors(selectors.clone());
    }
    if let Some(min) = overrides.min_size {
        config.min_elem_width = min.width;
        config.min_elem_height = min.height;
    }

    config.compile().context("invalid configuration")?;
    Ok(config)
}

/// Read an input file, or stdin for `-`.
fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("reading stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))
}

fn default_url(input: &Path) -> String {
    std::fs::canonicalize(input)
        .ok()
        .and_then(|abs| url::Url::from_file_path(abs).ok())
        .map(String::from)
        .unwrap_or_else(|| "about:blank".to_string())
}

/// Load a document from raw HTML (synthetic layout) or a page capture.
pub fn load_document(input: &Path, source: &SourceArgs) -> Result<HtmlDocument> {
    let text = read_input(input)?;

    let url = match &source.url {
        Some(raw) => Some(
            url::Url::parse(raw)
                .with_context(|| format!("invalid --url {raw:?}"))?
                .to_string(),
        ),
        None => None,
    };

    if source.capture {
        if source.viewport.is_some() || source.framed {
            warn!("--viewport and --framed apply to HTML input only; using the captured values");
        }
        let capture = PageCapture::from_json_str(&text)
            .with_context(|| format!("parsing capture {}", input.display()))?;
        let mut doc = capture.into_document().context("rebuilding captured page")?;
        if let Some(url) = url {
            doc = doc.with_url(url);
        }
        debug!(elements = doc.element_count(), "loaded capture");
        return Ok(doc);
    }

    if text.trim().is_empty() {
        bail!("{} is empty", input.display());
    }

    let viewport = source
        .viewport
        .map(|d| Viewport::new(d.width, d.height))
        .unwrap_or_default();
    let frame = if source.framed {
        FrameContext::Framed
    } else {
        FrameContext::TopLevel
    };

    let doc = HtmlDocument::parse(&text)
        .with_url(url.unwrap_or_else(|| default_url(input)))
        .with_viewport(viewport)
        .with_frame_context(frame);
    debug!(elements = doc.element_count(), "parsed HTML input");
    Ok(doc)
}
