//! Key-value reconstruction over document-analysis block trees.
//!
//! A [`Document`] is loaded once from the raw JSON response, then each page is
//! resolved into ordered key-value [`Pair`]s, free text lines, a quality
//! report and layout statistics by [`analyze_document`].

pub mod analysis;
pub mod block;
pub mod config;
pub mod error;
pub mod geometry;
pub mod index;
pub mod layout_stats;
pub mod pairing;
pub mod patterns;
pub mod quality;
pub mod relationships;
pub mod text;

pub use analysis::{AnalysisStatus, DocumentAnalysis, PageAnalysis, TextLine, analyze_document};
pub use config::AnalysisConfig;
pub use error::LoadError;
pub use index::Document;
pub use pairing::{Pair, Provenance};
