//! Evidence packet construction.
//!
//! Turns discovered candidates into bounded, serializable [`EvidencePacket`]s:
//! markup snippet, whitelisted attributes, computed style subset, geometry,
//! ancestor style trace and nearby text.

pub mod builder;
pub mod packet;
pub mod text;

pub use builder::{build_packet, extract_evidence};
pub use packet::{
    AncestorStyleEntry, AttributeMap, AttributeName, EvidencePacket, ExtractionResult,
    PositionData, StyleData,
};
