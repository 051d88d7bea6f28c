use anyhow::{Context, Result};
use kvresolve::index::Document;
use kvresolve::layout_stats::document_statistics;
use tracing::{info, warn};

use crate::cli::StatsArgs;

pub fn run(args: StatsArgs) -> Result<()> {
    let document = Document::from_path(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    info!(input = %args.input.display(), "stats requested");

    let stats = document_statistics(&document);

    if stats.total_blocks == 0 {
        warn!(path = %args.input.display(), "document contains no blocks");
        return Ok(());
    }

    if stats.skipped_blocks > 0 {
        warn!(skipped = stats.skipped_blocks, "some blocks could not be read");
    }

    info!(
        pages = stats.total_pages,
        declared_pages = stats.declared_pages.unwrap_or_default(),
        blocks = stats.total_blocks,
        "document totals"
    );

    if let Some(per_page) = &stats.blocks_per_page {
        info!(
            mean = per_page.mean,
            median = per_page.median,
            min = per_page.min,
            max = per_page.max,
            std_dev = per_page.std_dev,
            "blocks per page"
        );
    }

    for (block_type, count) in &stats.block_types {
        info!(block_type = %block_type, count, "block type");
    }

    for (relationship_type, count) in &stats.relationship_types {
        info!(relationship_type = %relationship_type, count, "relationship type");
    }

    for page in &stats.pages {
        info!(
            page = page.page,
            blocks = page.block_count,
            positioned = page.positioned_count,
            min_top = page.extent.map(|extent| extent.min_top).unwrap_or_default(),
            max_top = page.extent.map(|extent| extent.max_top).unwrap_or_default(),
            min_left = page.extent.map(|extent| extent.min_left).unwrap_or_default(),
            max_left = page.extent.map(|extent| extent.max_left).unwrap_or_default(),
            "page layout"
        );
    }

    Ok(())
}
