use super::*;

use crate::config::SearchWindow;

#[derive(Debug, Clone)]
struct IdentifierEntry {
    id: String,
    label: String,
    bounding_box: BoundingBox,
}

/// Standalone short numbers on a page ("1", "12.", "3)") that label fields.
#[derive(Debug, Clone, Default)]
pub(crate) struct IdentifierIndex {
    entries: Vec<IdentifierEntry>,
}

impl IdentifierIndex {
    pub(crate) fn build(document: &Document, page: &PageIndex, keys: &[FieldCandidate]) -> Self {
        let mut entries = Vec::<IdentifierEntry>::new();

        for &index in page.of_type(BlockType::Line) {
            let block = document.block(index);
            if let (Some(label), Some(bounding_box)) =
                (identifier_label(block.text()), block.bounding_box)
            {
                entries.push(IdentifierEntry {
                    id: block.id.clone(),
                    label,
                    bounding_box,
                });
            }
        }

        for key in keys {
            if let (Some(label), Some(bounding_box)) = (identifier_label(&key.text), key.bounding_box)
            {
                entries.push(IdentifierEntry {
                    id: key.id.clone(),
                    label,
                    bounding_box,
                });
            }
        }

        Self { entries }
    }

    /// Nearest label inside `window` of either the key or the value.
    pub(crate) fn nearest(
        &self,
        key: &FieldCandidate,
        value: &FieldCandidate,
        window: &SearchWindow,
    ) -> Option<String> {
        let anchors = [key.bounding_box, value.bounding_box]
            .into_iter()
            .flatten()
            .collect::<Vec<BoundingBox>>();

        let mut best: Option<(f64, &IdentifierEntry)> = None;
        for entry in &self.entries {
            if entry.id == key.id || entry.id == value.id {
                continue;
            }

            for anchor in &anchors {
                let vertical = entry.bounding_box.top - anchor.top;
                let horizontal = entry.bounding_box.left - anchor.left;
                if !window.contains(vertical, horizontal) {
                    continue;
                }

                let distance = geometry::distance(&entry.bounding_box, anchor);
                if best.is_none_or(|(best_distance, _)| distance < best_distance) {
                    best = Some((distance, entry));
                }
            }
        }

        best.map(|(_, entry)| entry.label.clone())
    }
}

/// One or two digits, optionally followed by `.` or `)`.
pub(crate) fn identifier_label(text: &str) -> Option<String> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_suffix('.')
        .or_else(|| trimmed.strip_suffix(')'))
        .unwrap_or(trimmed);

    let is_label = (1..=2).contains(&digits.len()) && digits.bytes().all(|byte| byte.is_ascii_digit());
    is_label.then(|| digits.to_string())
}
