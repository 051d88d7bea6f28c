use kvresolve::analysis::{AnalysisStatus, PageAnalysis};
use kvresolve::config::AnalysisConfig;
use kvresolve::layout_stats::DocumentStatistics;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFileEntry {
    pub filename: String,
    pub sha256: String,
    pub response_count: usize,
    pub page_count: usize,
    pub block_count: usize,
    pub skipped_block_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub file_count: usize,
    pub files: Vec<AnalysisFileEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub report_version: u32,
    pub generated_at: String,
    pub source_path: String,
    pub source_sha256: String,
    pub status: AnalysisStatus,
    pub message: Option<String>,
    pub config: AnalysisConfig,
    pub pair_count: usize,
    pub defect_count: usize,
    pub statistics: DocumentStatistics,
    pub pages: Vec<PageAnalysis>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedDocument {
    pub source_path: String,
    pub report_path: Option<String>,
    pub csv_path: Option<String>,
    pub status: Option<AnalysisStatus>,
    pub pair_count: usize,
    pub defect_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRunManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub input: String,
    pub output_dir: String,
    pub document_count: usize,
    pub failed_count: usize,
    pub documents: Vec<AnalyzedDocument>,
}
