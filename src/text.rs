use serde::Serialize;

use crate::block::{Block, BlockType, RelationshipType};
use crate::index::Document;

/// Display text of a form-field block, assembled from its WORD and
/// SELECTION_ELEMENT children in reading order.
pub fn assemble_child_text(document: &Document, block: &Block, band_tolerance: f64) -> String {
    let mut positioned = Vec::<(f64, f64, String)>::new();
    let mut unpositioned = Vec::<String>::new();

    for child_id in block.targets(RelationshipType::Child) {
        let Some(child) = document.get(child_id) else {
            continue;
        };

        let token = match child.block_type {
            BlockType::Word => child.text().trim().to_string(),
            BlockType::SelectionElement => child
                .selection_status
                .map(|status| status.marker().to_string())
                .unwrap_or_default(),
            _ => continue,
        };
        if token.is_empty() {
            continue;
        }

        match child.bounding_box {
            Some(bbox) => positioned.push((bbox.top, bbox.left, token)),
            None => unpositioned.push(token),
        }
    }

    let mut tokens = order_by_reading_position(positioned, band_tolerance);
    tokens.extend(unpositioned);
    tokens.join(" ")
}

/// Groups `(top, left, item)` entries into vertical bands, then orders bands
/// top-to-bottom and items left-to-right within each band.
pub fn order_by_reading_position<T>(mut items: Vec<(f64, f64, T)>, band_tolerance: f64) -> Vec<T> {
    items.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut bands = Vec::<(f64, Vec<(f64, T)>)>::new();
    for (top, left, item) in items {
        match bands.last_mut() {
            Some((band_top, members)) if top - *band_top <= band_tolerance => {
                members.push((left, item));
            }
            _ => bands.push((top, vec![(left, item)])),
        }
    }

    bands
        .into_iter()
        .flat_map(|(_, mut members)| {
            members.sort_by(|a, b| a.0.total_cmp(&b.0));
            members.into_iter().map(|(_, item)| item)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    Colon,
    Equals,
}

impl Separator {
    pub fn detect(text: &str) -> Option<Self> {
        if text.contains(':') {
            Some(Self::Colon)
        } else if text.contains('=') {
            Some(Self::Equals)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    Upper,
    Title,
    Other,
}

impl CaseStyle {
    pub fn of(text: &str) -> Self {
        if is_upper(text) {
            Self::Upper
        } else if is_title(text) {
            Self::Title
        } else {
            Self::Other
        }
    }

    /// Only fully uppercase or title-cased pairs count as agreeing.
    pub fn agrees(key: &str, value: &str) -> bool {
        let style = Self::of(key);
        style != Self::Other && style == Self::of(value)
    }
}

fn is_upper(text: &str) -> bool {
    let mut letters = text.chars().filter(|ch| ch.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn is_title(text: &str) -> bool {
    let words = text
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphabetic))
        .collect::<Vec<&str>>();
    if words.is_empty() {
        return false;
    }

    words.iter().all(|word| {
        let mut letters = word.chars().filter(|ch| ch.is_alphabetic());
        let starts_upper = letters.next().map(char::is_uppercase).unwrap_or(false);
        starts_upper && letters.all(char::is_lowercase)
    })
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
