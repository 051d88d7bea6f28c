use std::collections::BTreeMap;

use serde::Serialize;

use crate::index::{Document, PageIndex};

/// Summary of a sample. The standard deviation is the sample one (n - 1)
/// and is zero for fewer than two values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

impl Distribution {
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let middle = count / 2;
        let median = if count % 2 == 0 {
            (sorted[middle - 1] + sorted[middle]) / 2.0
        } else {
            sorted[middle]
        };

        let std_dev = if count < 2 {
            0.0
        } else {
            let squares = values
                .iter()
                .map(|value| (value - mean).powi(2))
                .sum::<f64>();
            (squares / (count - 1) as f64).sqrt()
        };

        Some(Self {
            count,
            mean,
            median,
            min: sorted[0],
            max: sorted[count - 1],
            std_dev,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub min_top: f64,
    pub max_top: f64,
    pub min_left: f64,
    pub max_left: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageStatistics {
    pub page: u32,
    pub block_count: usize,
    pub positioned_count: usize,
    pub block_types: BTreeMap<String, usize>,
    /// Share of the page's blocks per type, 0–100.
    pub block_type_percentages: BTreeMap<String, f64>,
    /// Relationship records per type, not their target ids.
    pub relationship_types: BTreeMap<String, usize>,
    pub extent: Option<Extent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentStatistics {
    pub total_pages: usize,
    pub total_blocks: usize,
    pub declared_pages: Option<u32>,
    pub skipped_blocks: usize,
    pub blocks_per_page: Option<Distribution>,
    pub block_types: BTreeMap<String, usize>,
    pub relationship_types: BTreeMap<String, usize>,
    pub pages: Vec<PageStatistics>,
}

pub fn page_statistics(document: &Document, page: &PageIndex) -> PageStatistics {
    let block_count = page.blocks.len();

    let block_types = page
        .by_type
        .iter()
        .map(|(block_type, indices)| (block_type.as_str().to_string(), indices.len()))
        .collect::<BTreeMap<String, usize>>();

    let block_type_percentages = block_types
        .iter()
        .map(|(name, &count)| (name.clone(), percentage(count, block_count)))
        .collect::<BTreeMap<String, f64>>();

    let mut relationship_types = BTreeMap::<String, usize>::new();
    for &index in &page.with_relationships {
        for relationship in &document.block(index).relationships {
            *relationship_types
                .entry(relationship.kind.as_str().to_string())
                .or_default() += 1;
        }
    }

    PageStatistics {
        page: page.page,
        block_count,
        positioned_count: page.positioned.len(),
        block_types,
        block_type_percentages,
        relationship_types,
        extent: extent_of(document, page),
    }
}

pub fn document_statistics(document: &Document) -> DocumentStatistics {
    let pages = document
        .pages()
        .map(|page| page_statistics(document, page))
        .collect::<Vec<_>>();

    let per_page = pages
        .iter()
        .map(|page| page.block_count as f64)
        .collect::<Vec<f64>>();

    let mut block_types = BTreeMap::<String, usize>::new();
    let mut relationship_types = BTreeMap::<String, usize>::new();
    for page in &pages {
        merge_counts(&mut block_types, &page.block_types);
        merge_counts(&mut relationship_types, &page.relationship_types);
    }

    DocumentStatistics {
        total_pages: pages.len(),
        total_blocks: document.block_count(),
        declared_pages: document.declared_page_count(),
        skipped_blocks: document.skipped_block_count(),
        blocks_per_page: Distribution::of(&per_page),
        block_types,
        relationship_types,
        pages,
    }
}

fn extent_of(document: &Document, page: &PageIndex) -> Option<Extent> {
    page.positioned
        .iter()
        .filter_map(|&index| document.block(index).bounding_box)
        .fold(None, |extent: Option<Extent>, bbox| {
            Some(match extent {
                None => Extent {
                    min_top: bbox.top,
                    max_top: bbox.top,
                    min_left: bbox.left,
                    max_left: bbox.left,
                },
                Some(extent) => Extent {
                    min_top: extent.min_top.min(bbox.top),
                    max_top: extent.max_top.max(bbox.top),
                    min_left: extent.min_left.min(bbox.left),
                    max_left: extent.max_left.max(bbox.left),
                },
            })
        })
}

fn merge_counts(into: &mut BTreeMap<String, usize>, from: &BTreeMap<String, usize>) {
    for (name, count) in from {
        *into.entry(name.clone()).or_default() += count;
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
