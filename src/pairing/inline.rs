use super::*;

/// LINE blocks shaped like `key: value` or `key = value`.
pub(crate) fn inline_pairs(document: &Document, page: &PageIndex) -> Vec<Pair> {
    page.of_type(BlockType::Line)
        .iter()
        .map(|&index| document.block(index))
        .filter_map(|block| {
            let (key, value) = split_inline(block.text())?;
            Some(Pair {
                key,
                value,
                confidence: block.normalized_confidence(),
                position: block
                    .bounding_box
                    .map(|bbox| bbox.anchor())
                    .unwrap_or_default(),
                provenance: Provenance::InlineSeparator,
                identifier_label: None,
                distance: Some(0.0),
            })
        })
        .collect()
}

/// Splits at the first `:` or `=`. The key needs a letter, both halves must
/// be non-empty, and `://` is never a separator.
pub(crate) fn split_inline(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let split_at = text.find([':', '='])?;
    if text[split_at..].starts_with("://") {
        return None;
    }

    let key = text[..split_at].trim();
    let value = text[split_at + 1..].trim();
    if key.is_empty() || value.is_empty() || !key.chars().any(char::is_alphabetic) {
        return None;
    }

    Some((key.to_string(), value.to_string()))
}
