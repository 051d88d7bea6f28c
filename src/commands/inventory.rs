use std::path::Path;

use anyhow::{Context, Result, bail};
use kvresolve::index::Document;
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{AnalysisFileEntry, AnalysisInventoryManifest};
use crate::util::{discover_analysis_files, now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        info!(
            file_count = manifest.file_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.source_dir.join("analysis_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(file_count = manifest.file_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path) -> Result<AnalysisInventoryManifest> {
    let paths = discover_analysis_files(source_dir)?;

    if paths.is_empty() {
        bail!("no *_analysis.json files found in {}", source_dir.display());
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let sha256 = sha256_file(&path)?;
        let document = Document::from_path(&path)
            .with_context(|| format!("failed to load {}", path.display()))?;

        files.push(AnalysisFileEntry {
            filename,
            sha256,
            response_count: document.response_count(),
            page_count: document.page_count(),
            block_count: document.block_count(),
            skipped_block_count: document.skipped_block_count(),
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));

    Ok(AnalysisInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        file_count: files.len(),
        files,
    })
}
