//! Heuristic signal scorer.
//!
//! A cheap first-pass triage over finished packets, run before the
//! classifier sees them. It only reads packet fields, never the document.

use crate::config::CompiledLexicon;
use crate::dom::round_px;
use crate::extraction::EvidencePacket;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coverage above this percentage of the viewport counts as `large-vp`.
pub const LARGE_VIEWPORT_PERCENT: f64 = 2.5;

/// A named heuristic observation about one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Signal {
    /// `position` is `fixed` or `sticky`.
    FixedPos,
    /// Covers more than 2.5% of the viewport.
    LargeVp,
    StrongAdText,
    /// Broad ad vocabulary matched and the strong one did not.
    AdText,
    IsIframe,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Signal::FixedPos => "fixed-pos",
            Signal::LargeVp => "large-vp",
            Signal::StrongAdText => "strong-ad-text",
            Signal::AdText => "ad-text",
            Signal::IsIframe => "is-iframe",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    High,
    Medium,
    Low,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Bucket::High => "high",
            Bucket::Medium => "medium",
            Bucket::Low => "low",
        })
    }
}

/// Signals and bucket for one packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triage {
    pub id: usize,
    pub signals: Vec<Signal>,
    pub bucket: Bucket,
}

/// Signals present on a packet, in a fixed order.
pub fn detect_signals(packet: &EvidencePacket, lexicon: &CompiledLexicon) -> Vec<Signal> {
    let fixed = matches!(packet.style.position.as_str(), "fixed" | "sticky");
    let large = packet.position.viewport_coverage_ratio * 100.0 > LARGE_VIEWPORT_PERCENT;
    let strong = packet
        .surrounding_text
        .iter()
        .any(|t| lexicon.is_strong_match(t));
    let broad = !strong
        && packet
            .surrounding_text
            .iter()
            .any(|t| lexicon.is_broad_match(t));
    let iframe = packet.tag_name == "iframe";

    [
        (fixed, Signal::FixedPos),
        (large, Signal::LargeVp),
        (strong, Signal::StrongAdText),
        (broad, Signal::AdText),
        (iframe, Signal::IsIframe),
    ]
    .into_iter()
    .filter_map(|(present, signal)| present.then_some(signal))
    .collect()
}

/// Two or more signals, or strong ad text alone, is `high`; one signal is
/// `medium`; none is `low`.
pub fn bucket_for(signals: &[Signal]) -> Bucket {
    if signals.len() >= 2 || signals.contains(&Signal::StrongAdText) {
        Bucket::High
    } else if signals.len() == 1 {
        Bucket::Medium
    } else {
        Bucket::Low
    }
}

pub fn score_packet(packet: &EvidencePacket, lexicon: &CompiledLexicon) -> Triage {
    let signals = detect_signals(packet, lexicon);
    Triage {
        id: packet.id,
        bucket: bucket_for(&signals),
        signals,
    }
}

pub fn triage(packets: &[EvidencePacket], lexicon: &CompiledLexicon) -> Vec<Triage> {
    packets.iter().map(|p| score_packet(p, lexicon)).collect()
}

/// One-line description of a scored packet, e.g.
/// `#3 <a> [fixed-pos, large-vp] vp=3.10% @(0,0) 300x250`.
pub fn describe(packet: &EvidencePacket, triage: &Triage) -> String {
    let signals = triage
        .signals
        .iter()
        .copied()
        .map(Signal::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let pos = &packet.position;
    format!(
        "#{} <{}> [{}] vp={:.2}% @({},{}) {}x{}",
        packet.id,
        packet.tag_name,
        signals,
        pos.viewport_coverage_ratio * 100.0,
        round_px(pos.top),
        round_px(pos.left),
        round_px(pos.width),
        round_px(pos.height),
    )
}

/// Packet descriptions grouped by bucket, in packet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

impl BucketSummary {
    pub fn from_triage(packets: &[EvidencePacket], triage: &[Triage]) -> Self {
        let mut summary = Self::default();
        for (packet, t) in packets.iter().zip(triage) {
            let line = describe(packet, t);
            match t.bucket {
                Bucket::High => summary.high.push(line),
                Bucket::Medium => summary.medium.push(line),
                Bucket::Low => summary.low.push(line),
            }
        }
        summary
    }

    pub fn bucket(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::High => &self.high,
            Bucket::Medium => &self.medium,
            Bucket::Low => &self.low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdLexicon;
    use crate::extraction::{PositionData, StyleData};

    fn lexicon() -> CompiledLexicon {
        AdLexicon::default().compile().unwrap()
    }

    fn packet(tag: &str, pos: &str, coverage: f64, text: &[&str]) -> EvidencePacket {
        EvidencePacket {
            id: 0,
            tag_name: tag.to_string(),
            style: StyleData {
                position: pos.to_string(),
                ..StyleData::default()
            },
            position: PositionData {
                viewport_coverage_ratio: coverage,
                ..PositionData::default()
            },
            surrounding_text: text.iter().map(|t| t.to_string()).collect(),
            ..EvidencePacket::default()
        }
    }

    #[test]
    fn test_fixed_and_large_is_high() {
        let t = score_packet(&packet("div", "fixed", 0.03, &[]), &lexicon());
        assert_eq!(t.signals, vec![Signal::FixedPos, Signal::LargeVp]);
        assert_eq!(t.bucket, Bucket::High);
    }

    #[test]
    fn test_iframe_only_is_medium() {
        let t = score_packet(&packet("iframe", "static", 0.0, &[]), &lexicon());
        assert_eq!(t.signals, vec![Signal::IsIframe]);
        assert_eq!(t.bucket, Bucket::Medium);
    }

    #[test]
    fn test_nothing_is_low() {
        let t = score_packet(&packet("a", "static", 0.01, &["Home"]), &lexicon());
        assert!(t.signals.is_empty());
        assert_eq!(t.bucket, Bucket::Low);
    }

    #[test]
    fn test_strong_ad_text_alone_is_high() {
        let t = score_packet(
            &packet("a", "static", 0.0, &["Advertisement", "Download now"]),
            &lexicon(),
        );
        assert_eq!(t.signals, vec![Signal::StrongAdText]);
        assert_eq!(t.bucket, Bucket::High);
    }

    #[test]
    fn test_broad_ad_text_excluded_by_strong() {
        let t = score_packet(&packet("a", "static", 0.0, &["Download now"]), &lexicon());
        assert_eq!(t.signals, vec![Signal::AdText]);
        assert_eq!(t.bucket, Bucket::Medium);
    }

    #[test]
    fn test_sticky_counts_as_fixed() {
        let signals = detect_signals(&packet("a", "sticky", 0.0, &[]), &lexicon());
        assert_eq!(signals, vec![Signal::FixedPos]);
    }

    #[test]
    fn test_large_vp_threshold_is_exclusive() {
        let signals = detect_signals(&packet("a", "static", 0.025, &[]), &lexicon());
        assert!(signals.is_empty());
        let signals = detect_signals(&packet("a", "static", 0.0251, &[]), &lexicon());
        assert_eq!(signals, vec![Signal::LargeVp]);
    }

    #[test]
    fn test_signal_wire_names() {
        let json = serde_json::to_value(Triage {
            id: 4,
            signals: vec![Signal::FixedPos, Signal::StrongAdText],
            bucket: Bucket::High,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 4, "signals": ["fixed-pos", "strong-ad-text"], "bucket": "high"})
        );
        assert_eq!(Signal::IsIframe.to_string(), "is-iframe");
    }

    #[test]
    fn test_describe_and_summary() {
        let mut p = packet("a", "fixed", 0.031, &[]);
        p.id = 3;
        p.position.width = 300.0;
        p.position.height = 250.4;
        let t = score_packet(&p, &lexicon());
        assert_eq!(
            describe(&p, &t),
            "#3 <a> [fixed-pos, large-vp] vp=3.10% @(0,0) 300x250"
        );

        let low = packet("button", "static", 0.0, &[]);
        let packets = vec![p, low];
        let scored = triage(&packets, &lexicon());
        let summary = BucketSummary::from_triage(&packets, &scored);
        assert_eq!(summary.high.len(), 1);
        assert!(summary.medium.is_empty());
        assert_eq!(summary.bucket(Bucket::Low), ["#0 <button> [] vp=0.00% @(0,0) 0x0"]);
    }

    #[test]
    fn test_describe_small_negative_offsets_print_zero() {
        let mut p = packet("iframe", "static", 0.0, &[]);
        p.position.top = -0.4;
        p.position.left = -0.5;
        p.position.width = 728.5;
        p.position.height = 90.0;
        let t = score_packet(&p, &lexicon());
        assert_eq!(
            describe(&p, &t),
            "#0 <iframe> [is-iframe] vp=0.00% @(0,0) 729x90"
        );
    }
}
