use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::geometry::BoundingBox;
use crate::pairing::FieldCandidate;
use crate::text::{CaseStyle, Separator, word_count};

/// Offset from a key anchor to a value anchor, in hundredths of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OffsetSignature {
    pub dx: i32,
    pub dy: i32,
}

impl OffsetSignature {
    pub fn between(key: &BoundingBox, value: &BoundingBox) -> Self {
        Self {
            dx: to_hundredths(value.left - key.left),
            dy: to_hundredths(value.top - key.top),
        }
    }
}

impl fmt::Display for OffsetSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.2},{:.2}",
            f64::from(self.dx) / 100.0,
            f64::from(self.dy) / 100.0
        )
    }
}

impl Serialize for OffsetSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn to_hundredths(delta: f64) -> i32 {
    (delta * 100.0).round() as i32
}

/// Frequency evidence gathered from every key/value combination on a page.
/// Rebuilt for each page and only ever read by the scorer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatternTable {
    pub signatures: HashMap<OffsetSignature, usize>,
    pub signature_total: usize,
    pub colon_separator: usize,
    pub equals_separator: usize,
    pub both_uppercase: usize,
    pub both_title_case: usize,
    pub single_word_key_multi_word_value: usize,
    pub combinations: usize,
}

impl PatternTable {
    pub fn build(keys: &[FieldCandidate], values: &[FieldCandidate]) -> Self {
        let mut table = Self::default();

        for key in keys {
            for value in values {
                table.record(key, value);
            }
        }

        table
    }

    fn record(&mut self, key: &FieldCandidate, value: &FieldCandidate) {
        self.combinations += 1;

        if let (Some(key_box), Some(value_box)) = (key.bounding_box, value.bounding_box) {
            *self
                .signatures
                .entry(OffsetSignature::between(&key_box, &value_box))
                .or_default() += 1;
            self.signature_total += 1;
        }

        if key.text.contains(':') {
            self.colon_separator += 1;
        }
        if key.text.contains('=') {
            self.equals_separator += 1;
        }

        match (CaseStyle::of(&key.text), CaseStyle::of(&value.text)) {
            (CaseStyle::Upper, CaseStyle::Upper) => self.both_uppercase += 1,
            (CaseStyle::Title, CaseStyle::Title) => self.both_title_case += 1,
            _ => {}
        }

        if word_count(&key.text) == 1 && word_count(&value.text) > 1 {
            self.single_word_key_multi_word_value += 1;
        }
    }

    /// Share of all observed offsets that match `signature`, in [0, 1].
    pub fn signature_share(&self, signature: &OffsetSignature) -> f64 {
        if self.signature_total == 0 {
            return 0.0;
        }

        let count = self.signatures.get(signature).copied().unwrap_or(0);
        count as f64 / self.signature_total as f64
    }

    /// Most frequent separator on the page; ties go to the colon.
    pub fn dominant_separator(&self) -> Option<Separator> {
        match (self.colon_separator, self.equals_separator) {
            (0, 0) => None,
            (colon, equals) if colon >= equals => Some(Separator::Colon),
            _ => Some(Separator::Equals),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.combinations == 0
    }
}
