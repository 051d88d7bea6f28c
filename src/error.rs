use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn raw analysis output into a [`crate::index::Document`], or
/// a settings file into a [`crate::config::AnalysisConfig`].
///
/// Only structurally fatal conditions live here. Missing fields fall back to
/// defaults and never surface as errors.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected document shape: expected a response object or a list of them, got {0}")]
    UnexpectedShape(&'static str),
}
