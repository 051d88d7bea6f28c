//! Per-page integrity checks and confidence statistics.
//!
//! Every check is independent and non-fatal. Findings accumulate into a
//! fresh defect list per page that is returned next to the statistics.

use serde::Serialize;
use tracing::debug;

use crate::block::Block;
use crate::config::QualityConfig;
use crate::geometry::BoundingBox;
use crate::index::{Document, PageIndex};
use crate::layout_stats::Distribution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    MissingId,
    DuplicateId,
    DanglingReference,
    OutOfRangeGeometry,
}

impl DefectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::DuplicateId => "duplicate_id",
            Self::DanglingReference => "dangling_reference",
            Self::OutOfRangeGeometry => "out_of_range_geometry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defect {
    pub page: u32,
    pub kind: DefectKind,
    pub block_id: String,
    pub detail: String,
}

impl Defect {
    pub fn description(&self) -> String {
        format!(
            "page {}: {} on block {}: {}",
            self.page,
            self.kind.as_str(),
            self.block_id,
            self.detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowConfidenceBlock {
    pub block_id: String,
    pub block_type: String,
    pub text: String,
    /// 0–100 scale.
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageQuality {
    pub page: u32,
    /// Over blocks that carried a confidence, on the 0–100 scale.
    pub confidence: Option<Distribution>,
    pub low_confidence: Vec<LowConfidenceBlock>,
    pub defects: Vec<Defect>,
}

impl PageQuality {
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn defect_count(&self, kind: DefectKind) -> usize {
        self.defects
            .iter()
            .filter(|defect| defect.kind == kind)
            .count()
    }
}

pub fn assess_page(document: &Document, page: &PageIndex, config: &QualityConfig) -> PageQuality {
    let mut defects = Vec::<Defect>::new();
    let mut confidences = Vec::<f64>::new();
    let mut low_confidence = Vec::<LowConfidenceBlock>::new();

    for &index in &page.blocks {
        let block = document.block(index);

        check_unique_id(document, index, block, &mut defects);
        check_references(document, block, &mut defects);
        if let Some(bbox) = &block.bounding_box {
            check_bounds(block, bbox, &mut defects);
        }

        if block.confidence.is_some() {
            let percent = block.normalized_confidence() * 100.0;
            confidences.push(percent);
            if percent < config.low_confidence_threshold {
                low_confidence.push(LowConfidenceBlock {
                    block_id: block.id.clone(),
                    block_type: block.block_type.as_str().to_string(),
                    text: block.text().to_string(),
                    confidence: percent,
                });
            }
        }
    }

    debug!(
        page = page.page,
        defects = defects.len(),
        low_confidence = low_confidence.len(),
        "assessed page quality"
    );

    PageQuality {
        page: page.page,
        confidence: Distribution::of(&confidences),
        low_confidence,
        defects,
    }
}

/// Blocks without an id, and later blocks reusing an id already owned by an
/// earlier block.
fn check_unique_id(document: &Document, index: usize, block: &Block, defects: &mut Vec<Defect>) {
    if block.id.is_empty() {
        defects.push(Defect {
            page: block.page,
            kind: DefectKind::MissingId,
            block_id: String::new(),
            detail: format!("{} block has no id", block.block_type.as_str()),
        });
        return;
    }

    match document.index_of(&block.id) {
        Some(owner) if owner != index => {
            let first_page = document.block(owner).page;
            defects.push(Defect {
                page: block.page,
                kind: DefectKind::DuplicateId,
                block_id: block.id.clone(),
                detail: format!("id already used by a block on page {first_page}"),
            });
        }
        _ => {}
    }
}

fn check_references(document: &Document, block: &Block, defects: &mut Vec<Defect>) {
    for relationship in &block.relationships {
        for target in &relationship.ids {
            if !document.contains(target) {
                defects.push(Defect {
                    page: block.page,
                    kind: DefectKind::DanglingReference,
                    block_id: block.id.clone(),
                    detail: format!(
                        "{} relationship targets missing block {target}",
                        relationship.kind.as_str()
                    ),
                });
            }
        }
    }
}

fn check_bounds(block: &Block, bbox: &BoundingBox, defects: &mut Vec<Defect>) {
    let fields = [
        ("Top", bbox.top),
        ("Left", bbox.left),
        ("Width", bbox.width),
        ("Height", bbox.height),
    ];

    for (name, value) in fields {
        if !(0.0..=1.0).contains(&value) {
            defects.push(Defect {
                page: block.page,
                kind: DefectKind::OutOfRangeGeometry,
                block_id: block.id.clone(),
                detail: format!("{name} = {value} is outside [0, 1]"),
            });
        }
    }
}
