//! Extraction configuration.
//!
//! One immutable [`ExtractionConfig`] value drives a pass. The default is
//! built once per process ([`ExtractionConfig::shared_default`]); callers that
//! need different selectors or caps build their own value, usually with
//! struct update syntax, and pass it explicitly.

use regex::{Regex, RegexBuilder};
use scraper::Selector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Interactive element selectors. `role` overrides the implicit role, so
/// `[role='button']` catches styled divs and spans.
const DEFAULT_INTERACTIVE_SELECTORS: &[&str] = &[
    "a[href]",
    "button",
    "iframe",
    "input[type='submit']",
    "input[type='button']",
    "[role='button']",
    "[onclick]",
];

/// Ad-slot markup conventions (AdSense, Google Publisher Tag, Ezoic and
/// generic data attributes/classes). Slots match whether or not they have
/// been filled yet.
const DEFAULT_AD_CONTAINER_SELECTORS: &[&str] = &[
    "ins.adsbygoogle",
    "[id^='div-gpt-ad']",
    "[id^='google_ads_iframe']",
    "[id^='ezoic-pub-ad']",
    "[class*='ezoic-ad']",
    "[data-ad-slot]",
    "[data-ad-client]",
    "[data-ad-unit]",
    ".ad-slot",
    ".ad-container",
    ".advertisement",
];

const DEFAULT_IGNORED_TAGS: &[&str] = &["script", "style", "noscript", "svg", "link", "meta"];

const DEFAULT_BOUNDARY_TAGS: &[&str] = &["body", "html"];

const DEFAULT_STRONG_AD_PATTERNS: &[&str] = &[r"\badvertisement\b", r"\bsponsored\b"];

const DEFAULT_BROAD_AD_PATTERNS: &[&str] = &[
    r"\bads?\b",
    "adverti",
    "sponsor",
    "download",
    "install",
    "continue",
];

/// Configuration problems. These abort a pass before any element is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {field} selector {selector:?}: {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },
    #[error("invalid {field} lexicon pattern {pattern:?}")]
    InvalidPattern {
        field: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Vocabularies for the ad-text signals, as case-insensitive regex patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdLexicon {
    /// Unambiguous ad markers.
    pub strong: Vec<String>,
    /// Ad-adjacent and call-to-action terms.
    pub broad: Vec<String>,
}

impl Default for AdLexicon {
    fn default() -> Self {
        Self {
            strong: owned(DEFAULT_STRONG_AD_PATTERNS),
            broad: owned(DEFAULT_BROAD_AD_PATTERNS),
        }
    }
}

impl AdLexicon {
    pub fn compile(&self) -> Result<CompiledLexicon, ConfigError> {
        Ok(CompiledLexicon {
            strong: compile_patterns("strong", &self.strong)?,
            broad: compile_patterns("broad", &self.broad)?,
        })
    }
}

/// Compiled form of an [`AdLexicon`]. An empty vocabulary never matches.
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    strong: Option<Regex>,
    broad: Option<Regex>,
}

impl CompiledLexicon {
    pub fn is_strong_match(&self, text: &str) -> bool {
        self.strong.as_ref().is_some_and(|re| re.is_match(text))
    }

    pub fn is_broad_match(&self, text: &str) -> bool {
        self.broad.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn compile_patterns(field: &'static str, patterns: &[String]) -> Result<Option<Regex>, ConfigError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    // Validate one by one so the error names the offending pattern.
    for pattern in patterns {
        Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            field,
            pattern: pattern.clone(),
            source,
        })?;
    }
    let joined = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&joined)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|source| ConfigError::InvalidPattern {
            field,
            pattern: joined,
            source,
        })
}

/// Tunable parameters of an extraction pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionConfig {
    /// Cap on candidates and packets per pass.
    pub max_elems: usize,
    /// Cap on the markup snippet, in characters.
    pub max_snippet_length: usize,
    /// Cap on each surrounding-text fragment, in characters.
    pub max_surrounding_text_length: usize,
    pub max_surrounding_text_fragments: usize,
    /// Depth cap of the style-ancestry walk.
    pub max_style_ancestor_depth: usize,
    /// Depth cap of the ancestor text walk.
    pub ancestor_depth: usize,
    /// Element siblings inspected on each side for surrounding text.
    pub sibling_radius: usize,
    pub min_elem_width: f64,
    pub min_elem_height: f64,
    /// Stripped from snippets; an ancestor with one of these tags disqualifies
    /// a candidate.
    pub ignored_tags: BTreeSet<String>,
    /// Tags that end the style-ancestry walk (not recorded themselves).
    pub boundary_tags: BTreeSet<String>,
    pub interactive_selectors: String,
    pub ad_container_selectors: String,
    pub lexicon: AdLexicon,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_elems: 30,
            max_snippet_length: 512,
            max_surrounding_text_length: 200,
            max_surrounding_text_fragments: 5,
            // Deep nesting (>25 levels) around download buttons is common.
            max_style_ancestor_depth: 30,
            // Text labels tend to live close to the element.
            ancestor_depth: 3,
            sibling_radius: 2,
            min_elem_width: 10.0,
            min_elem_height: 10.0,
            ignored_tags: owned(DEFAULT_IGNORED_TAGS).into_iter().collect(),
            boundary_tags: owned(DEFAULT_BOUNDARY_TAGS).into_iter().collect(),
            interactive_selectors: DEFAULT_INTERACTIVE_SELECTORS.join(", "),
            ad_container_selectors: DEFAULT_AD_CONTAINER_SELECTORS.join(", "),
            lexicon: AdLexicon::default(),
        }
    }
}

impl ExtractionConfig {
    /// The process-wide default, constructed on first use.
    pub fn shared_default() -> &'static ExtractionConfig {
        static DEFAULT: OnceLock<ExtractionConfig> = OnceLock::new();
        DEFAULT.get_or_init(ExtractionConfig::default)
    }

    /// Load a JSON config file. Fields missing from the file keep their
    /// default values.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_interactive_selectors(mut self, selectors: impl Into<String>) -> Self {
        self.interactive_selectors = selectors.into();
        self
    }

    pub fn with_ad_container_selectors(mut self, selectors: impl Into<String>) -> Self {
        self.ad_container_selectors = selectors.into();
        self
    }

    pub fn with_max_elems(mut self, max_elems: usize) -> Self {
        self.max_elems = max_elems;
        self
    }

    pub fn interactive_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector("interactive", &self.interactive_selectors)
    }

    pub fn ad_container_selector(&self) -> Result<Selector, ConfigError> {
        parse_selector("ad-container", &self.ad_container_selectors)
    }

    /// Validate and compile everything a pass needs up front.
    pub fn compile(&self) -> Result<CompiledConfig<'_>, ConfigError> {
        Ok(CompiledConfig {
            config: self,
            interactive: self.interactive_selector()?,
            ad_containers: self.ad_container_selector()?,
            lexicon: self.lexicon.compile()?,
        })
    }
}

/// A validated configuration with its selectors and lexicon compiled.
#[derive(Debug, Clone)]
pub struct CompiledConfig<'a> {
    pub config: &'a ExtractionConfig,
    pub interactive: Selector,
    pub ad_containers: Selector,
    pub lexicon: CompiledLexicon,
}

fn parse_selector(field: &'static str, selectors: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selectors).map_err(|err| ConfigError::InvalidSelector {
        field,
        selector: selectors.to_string(),
        reason: err.to_string(),
    })
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_compiles() {
        let config = ExtractionConfig::default();
        assert!(config.compile().is_ok());
        assert_eq!(config.max_elems, 30);
        assert!(config.ignored_tags.contains("noscript"));
        assert!(config.interactive_selectors.starts_with("a[href], button"));
    }

    #[test]
    fn test_shared_default_is_single_instance() {
        let a = ExtractionConfig::shared_default();
        let b = ExtractionConfig::shared_default();
        assert!(std::ptr::eq(a, b));
        assert_eq!(*a, ExtractionConfig::default());
    }

    #[test]
    fn test_invalid_selector_fails_fast() {
        let config = ExtractionConfig::default().with_interactive_selectors("a[href=");
        let err = config.compile().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSelector {
                field: "interactive",
                ..
            }
        ));

        let config = ExtractionConfig::default().with_ad_container_selectors("");
        assert!(matches!(
            config.compile().unwrap_err(),
            ConfigError::InvalidSelector {
                field: "ad-container",
                ..
            }
        ));
    }

    #[test]
    fn test_per_call_override_leaves_default_untouched() {
        let custom = ExtractionConfig::shared_default()
            .clone()
            .with_ad_container_selectors(".promo");
        assert_eq!(custom.ad_container_selectors, ".promo");
        assert_ne!(
            ExtractionConfig::shared_default().ad_container_selectors,
            ".promo"
        );
    }

    #[test]
    fn test_lexicon_matching() {
        let lexicon = AdLexicon::default().compile().unwrap();
        assert!(lexicon.is_strong_match("SPONSORED content"));
        assert!(!lexicon.is_strong_match("sponsorship deals"));
        assert!(lexicon.is_broad_match("sponsorship deals"));
        assert!(lexicon.is_broad_match("Click to Continue"));
        assert!(lexicon.is_broad_match("ads by partner"));
        assert!(!lexicon.is_broad_match("readers and adders"));
    }

    #[test]
    fn test_empty_lexicon_never_matches() {
        let lexicon = AdLexicon {
            strong: Vec::new(),
            broad: Vec::new(),
        }
        .compile()
        .unwrap();
        assert!(!lexicon.is_strong_match("advertisement"));
        assert!(!lexicon.is_broad_match("download"));
    }

    #[test]
    fn test_invalid_lexicon_pattern() {
        let lexicon = AdLexicon {
            strong: vec!["(unclosed".to_string()],
            broad: Vec::new(),
        };
        match lexicon.compile() {
            Err(ConfigError::InvalidPattern { field, pattern, .. }) => {
                assert_eq!(field, "strong");
                assert_eq!(pattern, "(unclosed");
            }
            other => panic!("expected InvalidPattern, got {other:?}"),
        }
    }

    #[test]
    fn test_partial_json_file_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"maxElems": 5, "interactiveSelectors": "a.cta", "lexicon": {{"strong": ["promoted"]}}}}"#
        )
        .unwrap();

        let config = ExtractionConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.max_elems, 5);
        assert_eq!(config.interactive_selectors, "a.cta");
        assert_eq!(config.lexicon.strong, vec!["promoted".to_string()]);
        // Untouched fields keep their defaults.
        assert_eq!(config.max_snippet_length, 512);
        assert_eq!(config.lexicon.broad, AdLexicon::default().broad);
    }

    #[test]
    fn test_missing_config_file() {
        let err = ExtractionConfig::from_json_file(Path::new("/nonexistent/uisentinel.json"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
