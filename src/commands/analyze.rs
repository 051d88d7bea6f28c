use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use kvresolve::analysis::{DocumentAnalysis, analyze_document};
use kvresolve::config::AnalysisConfig;
use kvresolve::index::Document;
use tracing::{info, warn};

use crate::cli::AnalyzeArgs;
use crate::model::{AnalysisReport, AnalyzeRunManifest, AnalyzedDocument};
use crate::util::{
    discover_analysis_files, document_stem, now_utc_string, sha256_file, write_json_pretty,
    write_text,
};

const CSV_HEADER: [&str; 8] = [
    "page",
    "key",
    "value",
    "identifier_label",
    "provenance",
    "confidence_pct",
    "top",
    "left",
];

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(&args)?;
    let inputs = discover_inputs(&args.input)?;

    info!(
        input = %args.input.display(),
        documents = inputs.len(),
        dry_run = args.dry_run,
        "analysis started"
    );

    let mut documents = Vec::<AnalyzedDocument>::with_capacity(inputs.len());
    for path in &inputs {
        match analyze_file(path, &args, &config) {
            Ok(document) => documents.push(document),
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{err:#}"), "document analysis failed");
                documents.push(AnalyzedDocument {
                    source_path: path.display().to_string(),
                    report_path: None,
                    csv_path: None,
                    status: None,
                    pair_count: 0,
                    defect_count: 0,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }

    let failed_count = documents
        .iter()
        .filter(|document| document.error.is_some())
        .count();
    let pair_count = documents
        .iter()
        .map(|document| document.pair_count)
        .sum::<usize>();

    if !args.dry_run {
        let manifest = AnalyzeRunManifest {
            manifest_version: 1,
            generated_at: now_utc_string(),
            input: args.input.display().to_string(),
            output_dir: args.output_dir.display().to_string(),
            document_count: documents.len(),
            failed_count,
            documents,
        };
        let manifest_path = args.output_dir.join("run_manifest.json");
        write_json_pretty(&manifest_path, &manifest)?;
        info!(path = %manifest_path.display(), "wrote run manifest");
    }

    info!(
        documents = inputs.len(),
        failed = failed_count,
        pairs = pair_count,
        "analysis completed"
    );

    if failed_count > 0 {
        bail!("{failed_count} of {} documents failed to analyze", inputs.len());
    }

    Ok(())
}

fn load_config(args: &AnalyzeArgs) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(threshold) = args.low_confidence_threshold {
        if !(0.0..=100.0).contains(&threshold) {
            bail!("--low-confidence-threshold must be within 0..=100, got {threshold}");
        }
        config.quality.low_confidence_threshold = threshold;
    }

    Ok(config)
}

fn discover_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        bail!("input does not exist: {}", input.display());
    }

    let files = discover_analysis_files(input)?;
    if files.is_empty() {
        bail!("no *_analysis.json files found in {}", input.display());
    }

    Ok(files)
}

fn analyze_file(path: &Path, args: &AnalyzeArgs, config: &AnalysisConfig) -> Result<AnalyzedDocument> {
    let document =
        Document::from_path(path).with_context(|| format!("failed to load {}", path.display()))?;
    let analysis = analyze_document(&document, config);

    let pair_count = analysis.pair_count();
    let defect_count = analysis.defect_count();

    if let Some(message) = analysis.message() {
        warn!(path = %path.display(), status = analysis.status.as_str(), "{message}");
    }

    info!(
        path = %path.display(),
        pages = document.page_count(),
        blocks = document.block_count(),
        pairs = pair_count,
        defects = defect_count,
        "analyzed document"
    );

    if args.dry_run {
        return Ok(AnalyzedDocument {
            source_path: path.display().to_string(),
            report_path: None,
            csv_path: None,
            status: Some(analysis.status),
            pair_count,
            defect_count,
            error: None,
        });
    }

    let stem = document_stem(path);

    let csv_path = if args.no_csv {
        None
    } else {
        let csv_path = args.output_dir.join(format!("{stem}_pairs.csv"));
        write_text(&csv_path, &pairs_to_csv(&analysis))?;
        info!(path = %csv_path.display(), "wrote pairs csv");
        Some(csv_path)
    };

    let report_path = args.output_dir.join(format!("{stem}_report.json"));
    let status = analysis.status;
    let report = AnalysisReport {
        report_version: 1,
        generated_at: now_utc_string(),
        source_path: path.display().to_string(),
        source_sha256: sha256_file(path)?,
        status,
        message: analysis.message().map(ToOwned::to_owned),
        config: config.clone(),
        pair_count,
        defect_count,
        statistics: analysis.statistics,
        pages: analysis.pages,
    };
    write_json_pretty(&report_path, &report)?;
    info!(path = %report_path.display(), "wrote analysis report");

    Ok(AnalyzedDocument {
        source_path: path.display().to_string(),
        report_path: Some(report_path.display().to_string()),
        csv_path: csv_path.map(|path| path.display().to_string()),
        status: Some(status),
        pair_count,
        defect_count,
        error: None,
    })
}

fn pairs_to_csv(analysis: &DocumentAnalysis) -> String {
    let mut rows = vec![
        CSV_HEADER
            .iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<String>>(),
    ];

    for (page, pair) in analysis.pairs() {
        rows.push(vec![
            page.to_string(),
            pair.key.clone(),
            pair.value.clone(),
            pair.identifier_label.clone().unwrap_or_default(),
            pair.provenance.as_str().to_string(),
            format!("{:.1}", pair.confidence * 100.0),
            format!("{:.4}", pair.position.top),
            format!("{:.4}", pair.position.left),
        ]);
    }

    let mut csv = table_to_csv(&rows);
    csv.push('\n');
    csv
}

fn table_to_csv(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|cell| escape_csv_cell(cell))
                .collect::<Vec<String>>()
                .join(",")
        })
        .collect::<Vec<String>>()
        .join("\n")
}

fn escape_csv_cell(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn csv_quotes_cells_with_separators() {
        let document = Document::from_value(json!({ "Blocks": [
            { "Id": "l1", "BlockType": "LINE", "Page": 1, "Text": "Address: 1 Main St, \"Unit\" 4",
              "Confidence": 87.5, "Geometry": { "BoundingBox": { "Top": 0.25, "Left": 0.125 } } }
        ] }))
        .expect("document");
        let analysis = analyze_document(&document, &AnalysisConfig::default());

        let csv = pairs_to_csv(&analysis);
        let lines = csv.lines().collect::<Vec<&str>>();

        assert_eq!(
            lines[0],
            "page,key,value,identifier_label,provenance,confidence_pct,top,left"
        );
        assert_eq!(
            lines[1],
            "1,Address,\"1 Main St, \"\"Unit\"\" 4\",,inline-separator,87.5,0.2500,0.1250"
        );
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn empty_analysis_still_has_a_header() {
        let document = Document::from_value(json!([])).expect("document");
        let analysis = analyze_document(&document, &AnalysisConfig::default());

        assert_eq!(
            pairs_to_csv(&analysis),
            "page,key,value,identifier_label,provenance,confidence_pct,top,left\n"
        );
    }
}
