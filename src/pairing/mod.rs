//! Key/value pairing for one page.
//!
//! Each key block walks a fixed ladder: direct relationship, indirect
//! relationship, spatial proximity. The first rung that yields candidates
//! wins; several candidates are disambiguated by [`select_candidate`].
//! Inline `key: value` lines and selection marks are paired separately, then
//! everything is ranked, deduplicated and put back into reading order.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::block::{Block, BlockType, SelectionStatus};
use crate::config::ResolverConfig;
use crate::geometry::{self, BoundingBox, Position};
use crate::index::{Document, PageIndex};
use crate::patterns::{OffsetSignature, PatternTable};
use crate::relationships::{RelationshipMaps, classify_page};
use crate::text::{CaseStyle, Separator, assemble_child_text};

mod candidates;
mod checkbox;
mod finalize;
mod identifier;
mod inline;
mod scoring;
#[cfg(test)]
pub(crate) mod tests;

pub use finalize::{dedup_pairs, finalize_pairs, order_for_presentation, rank_pairs};
pub use scoring::{Selection, score_candidate, select_candidate};

use candidates::*;
use checkbox::*;
use identifier::*;
use inline::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    DirectRelationship,
    IndirectRelationship,
    SpatialProximity,
    InlineSeparator,
    Checkbox,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectRelationship => "direct-relationship",
            Self::IndirectRelationship => "indirect-relationship",
            Self::SpatialProximity => "spatial-proximity",
            Self::InlineSeparator => "inline-separator",
            Self::Checkbox => "checkbox",
        }
    }
}

/// Resolved view of a KEY_VALUE_SET block.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    pub id: String,
    pub text: String,
    /// Normalized to [0, 1].
    pub confidence: f64,
    pub bounding_box: Option<BoundingBox>,
}

impl FieldCandidate {
    /// Text comes from the block's children; a block without usable children
    /// falls back to its own `Text`.
    pub fn from_block(document: &Document, block: &Block, band_tolerance: f64) -> Self {
        let mut text = assemble_child_text(document, block, band_tolerance);
        if text.is_empty() {
            text = block.text().trim().to_string();
        }

        Self {
            id: block.id.clone(),
            text,
            confidence: block.normalized_confidence(),
            bounding_box: block.bounding_box,
        }
    }

    pub fn anchor(&self) -> Option<Position> {
        self.bounding_box.map(|bbox| bbox.anchor())
    }

    /// Values made only of selection marks get the wider vertical tolerance.
    pub fn is_checkbox_like(&self) -> bool {
        let text = self.text.trim();
        !text.is_empty() && text.replace("[X]", "").replace("[ ]", "").trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pair {
    pub key: String,
    pub value: String,
    /// Always within [0, 1].
    pub confidence: f64,
    /// Component-wise minimum of the contributing anchors; a sort key only.
    pub position: Position,
    pub provenance: Provenance,
    pub identifier_label: Option<String>,
    #[serde(skip)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStage {
    Direct,
    Indirect,
    Spatial,
}

impl ResolutionStage {
    pub fn provenance(self) -> Provenance {
        match self {
            Self::Direct => Provenance::DirectRelationship,
            Self::Indirect => Provenance::IndirectRelationship,
            Self::Spatial => Provenance::SpatialProximity,
        }
    }
}

/// Trace of how one key was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyResolution {
    pub key_id: String,
    pub stage: Option<ResolutionStage>,
    pub candidate_count: usize,
    pub scored: bool,
    pub selected_value_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageResolution {
    pub page: u32,
    pub pairs: Vec<Pair>,
    pub unpaired_keys: Vec<String>,
    pub resolutions: Vec<KeyResolution>,
    #[serde(skip)]
    pub patterns: PatternTable,
}

pub fn resolve_page(document: &Document, page: &PageIndex, config: &ResolverConfig) -> PageResolution {
    let maps = classify_page(document, page, config.max_chase_depth);
    let fields = PageFields::collect(document, page, config.line_band_tolerance);
    let patterns = PatternTable::build(&fields.keys, &fields.values);
    let identifiers = IdentifierIndex::build(document, page, &fields.keys);

    let mut pairs = Vec::<Pair>::new();
    let mut unpaired_keys = Vec::<String>::new();
    let mut resolutions = Vec::<KeyResolution>::with_capacity(fields.keys.len());

    for key in &fields.keys {
        let gathered = gather_candidates(document, key, &maps, &fields, config);
        let Some((stage, candidates)) = gathered else {
            debug!(page = page.page, key_id = %key.id, "no value candidate for key");
            unpaired_keys.push(key.id.clone());
            resolutions.push(KeyResolution {
                key_id: key.id.clone(),
                stage: None,
                candidate_count: 0,
                scored: false,
                selected_value_id: None,
            });
            continue;
        };

        let selection = select_candidate(key, &candidates, &patterns, &config.weights);
        let value = &candidates[selection.index];
        debug!(
            page = page.page,
            key_id = %key.id,
            value_id = %value.id,
            stage = ?stage,
            candidates = candidates.len(),
            scored = selection.scored,
            "paired key"
        );

        let identifier_label = identifiers.nearest(key, value, &config.identifier_window);
        pairs.push(build_pair(key, value, stage.provenance(), identifier_label));
        resolutions.push(KeyResolution {
            key_id: key.id.clone(),
            stage: Some(stage),
            candidate_count: candidates.len(),
            scored: selection.scored,
            selected_value_id: Some(value.id.clone()),
        });
    }

    pairs.extend(inline_pairs(document, page));
    pairs.extend(checkbox_pairs(document, page, config));

    let pairs = finalize_pairs(pairs);
    debug!(
        page = page.page,
        pairs = pairs.len(),
        keys = fields.keys.len(),
        unpaired_keys = unpaired_keys.len(),
        "resolved page"
    );

    PageResolution {
        page: page.page,
        pairs,
        unpaired_keys,
        resolutions,
        patterns,
    }
}

fn build_pair(
    key: &FieldCandidate,
    value: &FieldCandidate,
    provenance: Provenance,
    identifier_label: Option<String>,
) -> Pair {
    let position = match (key.anchor(), value.anchor()) {
        (Some(key_anchor), Some(value_anchor)) => key_anchor.component_min(value_anchor),
        (Some(anchor), None) | (None, Some(anchor)) => anchor,
        (None, None) => Position::default(),
    };
    let distance = match (key.bounding_box, value.bounding_box) {
        (Some(key_box), Some(value_box)) => Some(geometry::distance(&key_box, &value_box)),
        _ => None,
    };

    Pair {
        key: key.text.clone(),
        value: value.text.clone(),
        confidence: key.confidence.min(value.confidence),
        position,
        provenance,
        identifier_label,
        distance,
    }
}
