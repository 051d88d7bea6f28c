use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Tunables for the whole analysis. Every level defaults, so a partial JSON
/// file only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub resolver: ResolverConfig,
    pub quality: QualityConfig,
}

impl AnalysisConfig {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &[u8]) -> Result<Self, LoadError> {
        serde_json::from_slice(raw).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub spatial: SpatialTolerance,
    pub weights: ScoringWeights,
    pub identifier_window: SearchWindow,
    /// Largest anchor distance between a checkbox and the line labelling it.
    pub checkbox_key_radius: f64,
    /// Vertical slack for grouping words into one reading-order band.
    pub line_band_tolerance: f64,
    pub max_chase_depth: usize,
    pub min_text_line_chars: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            spatial: SpatialTolerance::default(),
            weights: ScoringWeights::default(),
            identifier_window: SearchWindow {
                vertical: 0.08,
                horizontal: 0.15,
            },
            checkbox_key_radius: 0.10,
            line_band_tolerance: 0.01,
            max_chase_depth: crate::relationships::DEFAULT_CHASE_DEPTH,
            min_text_line_chars: 3,
        }
    }
}

/// Proximity limits as fractions of page height (vertical) and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialTolerance {
    pub vertical: f64,
    pub horizontal: f64,
    pub checkbox_vertical: f64,
}

impl Default for SpatialTolerance {
    fn default() -> Self {
        Self {
            vertical: 0.05,
            horizontal: 0.12,
            checkbox_vertical: 0.08,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub pattern_frequency: f64,
    pub confidence: f64,
    pub separator_agreement: f64,
    pub capitalization_agreement: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            pattern_frequency: 0.4,
            confidence: 0.3,
            separator_agreement: 0.15,
            capitalization_agreement: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWindow {
    pub vertical: f64,
    pub horizontal: f64,
}

impl SearchWindow {
    pub fn contains(&self, vertical_offset: f64, horizontal_offset: f64) -> bool {
        vertical_offset.abs() < self.vertical && horizontal_offset.abs() < self.horizontal
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Threshold on the 0-100 scale.
    pub low_confidence_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 90.0,
        }
    }
}
