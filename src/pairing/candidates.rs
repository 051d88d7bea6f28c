use super::*;

/// Key and value views of the page's form-field blocks, in page order.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageFields {
    pub(crate) keys: Vec<FieldCandidate>,
    pub(crate) values: Vec<FieldCandidate>,
    value_lookup: HashMap<String, usize>,
    band_tolerance: f64,
}

impl PageFields {
    pub(crate) fn collect(document: &Document, page: &PageIndex, band_tolerance: f64) -> Self {
        let mut fields = Self {
            band_tolerance,
            ..Self::default()
        };

        for &index in page.of_type(BlockType::KeyValueSet) {
            let block = document.block(index);
            let candidate = FieldCandidate::from_block(document, block, band_tolerance);
            if candidate.text.is_empty() {
                debug!(page = page.page, block_id = %block.id, "form field has no text");
                continue;
            }

            if block.is_key() {
                fields.keys.push(candidate);
            } else if block.is_value() {
                fields
                    .value_lookup
                    .entry(candidate.id.clone())
                    .or_insert(fields.values.len());
                fields.values.push(candidate);
            }
        }

        fields
    }

    /// Resolves a relationship target to a value view. Targets may live on
    /// another page, so ids missing from this page fall back to the global map.
    pub(crate) fn value_for(&self, document: &Document, id: &str) -> Option<FieldCandidate> {
        if let Some(&index) = self.value_lookup.get(id) {
            return Some(self.values[index].clone());
        }

        let block = document.get(id)?;
        if !block.is_value() {
            return None;
        }

        let candidate = FieldCandidate::from_block(document, block, self.band_tolerance);
        (!candidate.text.is_empty()).then_some(candidate)
    }
}

/// First rung of the ladder that produces any candidate, with its candidates.
pub(crate) fn gather_candidates(
    document: &Document,
    key: &FieldCandidate,
    maps: &RelationshipMaps,
    fields: &PageFields,
    config: &ResolverConfig,
) -> Option<(ResolutionStage, Vec<FieldCandidate>)> {
    let direct = resolve_targets(document, maps.direct_targets(&key.id), fields);
    if !direct.is_empty() {
        return Some((ResolutionStage::Direct, direct));
    }

    let indirect = resolve_targets(document, maps.indirect_targets(&key.id), fields);
    if !indirect.is_empty() {
        return Some((ResolutionStage::Indirect, indirect));
    }

    let spatial = spatial_candidates(key, &fields.values, config);
    if !spatial.is_empty() {
        return Some((ResolutionStage::Spatial, spatial));
    }

    None
}

fn resolve_targets(document: &Document, ids: &[String], fields: &PageFields) -> Vec<FieldCandidate> {
    ids.iter()
        .filter_map(|id| fields.value_for(document, id))
        .collect()
}

pub(crate) fn spatial_candidates(
    key: &FieldCandidate,
    values: &[FieldCandidate],
    config: &ResolverConfig,
) -> Vec<FieldCandidate> {
    let Some(key_box) = key.bounding_box else {
        return Vec::new();
    };

    values
        .iter()
        .filter(|value| {
            let Some(value_box) = value.bounding_box else {
                return false;
            };
            let vertical_limit = if value.is_checkbox_like() {
                config.spatial.checkbox_vertical
            } else {
                config.spatial.vertical
            };

            (value_box.top - key_box.top).abs() < vertical_limit
                && (value_box.left - key_box.left).abs() < config.spatial.horizontal
        })
        .cloned()
        .collect()
}
