use super::*;

/// Every selection mark on the page becomes a `[X]` / `[ ]` pair labelled by
/// the nearest preceding line, or by an empty key when none is close enough.
pub(crate) fn checkbox_pairs(
    document: &Document,
    page: &PageIndex,
    config: &ResolverConfig,
) -> Vec<Pair> {
    let lines = page
        .of_type(BlockType::Line)
        .iter()
        .map(|&index| document.block(index))
        .filter(|block| !block.text().trim().is_empty())
        .filter_map(|block| block.bounding_box.map(|bbox| (block, bbox)))
        .collect::<Vec<(&Block, BoundingBox)>>();

    page.of_type(BlockType::SelectionElement)
        .iter()
        .map(|&index| document.block(index))
        .map(|mark| {
            let value = mark
                .selection_status
                .unwrap_or(SelectionStatus::NotSelected)
                .marker()
                .to_string();
            let label = mark
                .bounding_box
                .and_then(|mark_box| nearest_preceding_line(&lines, &mark_box, config));

            Pair {
                key: label
                    .map(|(line, _)| line.text().trim().to_string())
                    .unwrap_or_default(),
                value,
                confidence: mark.normalized_confidence(),
                position: mark
                    .bounding_box
                    .map(|bbox| bbox.anchor())
                    .unwrap_or_default(),
                provenance: Provenance::Checkbox,
                identifier_label: None,
                distance: label.map(|(_, distance)| distance),
            }
        })
        .collect()
}

fn nearest_preceding_line<'a>(
    lines: &[(&'a Block, BoundingBox)],
    mark_box: &BoundingBox,
    config: &ResolverConfig,
) -> Option<(&'a Block, f64)> {
    let band = config.line_band_tolerance;

    lines
        .iter()
        .filter(|(_, line_box)| {
            let above = line_box.top < mark_box.top - band;
            let same_band_left =
                (line_box.top - mark_box.top).abs() <= band && line_box.left <= mark_box.left;
            above || same_band_left
        })
        .map(|(line, line_box)| (*line, geometry::distance(line_box, mark_box)))
        .filter(|(_, distance)| *distance <= config.checkbox_key_radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
