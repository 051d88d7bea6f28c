//! Whole-document analysis: pairs, free text, quality and layout statistics
//! for every page, plus a status a caller can branch on.

use serde::Serialize;
use tracing::{info, warn};

use crate::block::BlockType;
use crate::config::AnalysisConfig;
use crate::index::{Document, PageIndex};
use crate::layout_stats::{DocumentStatistics, document_statistics};
use crate::pairing::{KeyResolution, Pair, resolve_page};
use crate::quality::{PageQuality, assess_page};
use crate::text::order_by_reading_position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Complete,
    /// The input held no blocks at all.
    NoBlocks,
    /// Blocks were present but no page produced a pair.
    NoPairs,
}

impl AnalysisStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "complete",
            Self::NoBlocks => "no_blocks",
            Self::NoPairs => "no_pairs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    /// Normalized to [0, 1].
    pub confidence: f64,
    pub top: f64,
    pub left: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageAnalysis {
    pub page: u32,
    pub pairs: Vec<Pair>,
    pub unpaired_keys: Vec<String>,
    pub resolutions: Vec<KeyResolution>,
    pub text_lines: Vec<TextLine>,
    pub quality: PageQuality,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub status: AnalysisStatus,
    pub statistics: DocumentStatistics,
    pub pages: Vec<PageAnalysis>,
}

impl DocumentAnalysis {
    pub fn is_insufficient(&self) -> bool {
        self.status != AnalysisStatus::Complete
    }

    /// What the caller should tell the user when the result is insufficient.
    pub fn message(&self) -> Option<&'static str> {
        match self.status {
            AnalysisStatus::Complete => None,
            AnalysisStatus::NoBlocks => Some(
                "the input contains no blocks; check that it is a document analysis response with a Blocks list",
            ),
            AnalysisStatus::NoPairs => Some(
                "no key-value pairs were found; the document may have no form fields, or the analysis was run without form extraction",
            ),
        }
    }

    pub fn pair_count(&self) -> usize {
        self.pages.iter().map(|page| page.pairs.len()).sum()
    }

    pub fn defect_count(&self) -> usize {
        self.pages.iter().map(|page| page.quality.defects.len()).sum()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (u32, &Pair)> {
        self.pages
            .iter()
            .flat_map(|page| page.pairs.iter().map(move |pair| (page.page, pair)))
    }
}

pub fn analyze_document(document: &Document, config: &AnalysisConfig) -> DocumentAnalysis {
    let statistics = document_statistics(document);

    let pages = document
        .pages()
        .map(|page| analyze_page(document, page, config))
        .collect::<Vec<_>>();

    let status = if document.is_empty() {
        AnalysisStatus::NoBlocks
    } else if pages.iter().all(|page| page.pairs.is_empty()) {
        AnalysisStatus::NoPairs
    } else {
        AnalysisStatus::Complete
    };

    let analysis = DocumentAnalysis {
        status,
        statistics,
        pages,
    };

    if let Some(message) = analysis.message() {
        warn!(status = status.as_str(), "{message}");
    }

    analysis
}

pub fn analyze_page(document: &Document, page: &PageIndex, config: &AnalysisConfig) -> PageAnalysis {
    let resolution = resolve_page(document, page, &config.resolver);
    let quality = assess_page(document, page, &config.quality);
    let text_lines = collect_text_lines(document, page, config);

    info!(
        page = page.page,
        pairs = resolution.pairs.len(),
        unpaired_keys = resolution.unpaired_keys.len(),
        text_lines = text_lines.len(),
        defects = quality.defects.len(),
        "analyzed page"
    );

    PageAnalysis {
        page: page.page,
        pairs: resolution.pairs,
        unpaired_keys: resolution.unpaired_keys,
        resolutions: resolution.resolutions,
        text_lines,
        quality,
    }
}

/// LINE blocks long enough to be worth keeping, in reading order.
pub fn collect_text_lines(
    document: &Document,
    page: &PageIndex,
    config: &AnalysisConfig,
) -> Vec<TextLine> {
    let min_chars = config.resolver.min_text_line_chars;

    let lines = page
        .of_type(BlockType::Line)
        .iter()
        .map(|&index| document.block(index))
        .filter_map(|block| {
            let text = block.text().trim();
            if text.chars().count() < min_chars {
                return None;
            }

            let anchor = block
                .bounding_box
                .map(|bbox| bbox.anchor())
                .unwrap_or_default();
            Some((
                anchor.top,
                anchor.left,
                TextLine {
                    text: text.to_string(),
                    confidence: block.normalized_confidence(),
                    top: anchor.top,
                    left: anchor.left,
                },
            ))
        })
        .collect::<Vec<_>>();

    order_by_reading_position(lines, config.resolver.line_band_tolerance)
}
