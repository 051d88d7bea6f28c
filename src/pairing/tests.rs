use serde_json::{Value, json};

use super::*;

pub(crate) fn candidate(
    id: &str,
    text: &str,
    raw_confidence: f64,
    anchor: Option<(f64, f64)>,
) -> FieldCandidate {
    FieldCandidate {
        id: id.to_string(),
        text: text.to_string(),
        confidence: crate::block::normalize_confidence(raw_confidence),
        bounding_box: anchor.map(|(top, left)| BoundingBox::new(top, left, 0.1, 0.02)),
    }
}

fn geometry(top: f64, left: f64) -> Value {
    json!({ "BoundingBox": { "Top": top, "Left": left, "Width": 0.05, "Height": 0.02 } })
}

fn word(id: &str, text: &str, top: f64, left: f64) -> Value {
    json!({
        "Id": id, "BlockType": "WORD", "Page": 1, "Text": text,
        "Confidence": 99.0, "Geometry": geometry(top, left)
    })
}

fn line(id: &str, text: &str, top: f64, left: f64) -> Value {
    json!({
        "Id": id, "BlockType": "LINE", "Page": 1, "Text": text,
        "Confidence": 97.0, "Geometry": geometry(top, left)
    })
}

fn field(
    id: &str,
    entity: &str,
    confidence: f64,
    top: f64,
    left: f64,
    relationships: Value,
) -> Value {
    json!({
        "Id": id, "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": [entity],
        "Confidence": confidence, "Geometry": geometry(top, left),
        "Relationships": relationships
    })
}

fn resolve(blocks: Vec<Value>) -> PageResolution {
    let document = Document::from_value(json!([{ "Blocks": blocks }])).expect("document");
    let page = document.page(1).expect("page 1");
    resolve_page(&document, page, &ResolverConfig::default())
}

fn pair(key: &str, value: &str, confidence: f64, top: f64, distance: Option<f64>) -> Pair {
    Pair {
        key: key.to_string(),
        value: value.to_string(),
        confidence,
        position: Position { top, left: 0.1 },
        provenance: Provenance::SpatialProximity,
        identifier_label: None,
        distance,
    }
}

#[test]
fn direct_relationship_pairs_name_with_value() {
    let resolution = resolve(vec![
        field(
            "K",
            "KEY",
            90.0,
            0.10,
            0.10,
            json!([{ "Type": "VALUE", "Ids": ["V"] }, { "Type": "CHILD", "Ids": ["w1"] }]),
        ),
        field(
            "V",
            "VALUE",
            80.0,
            0.10,
            0.30,
            json!([{ "Type": "CHILD", "Ids": ["w2", "w3"] }]),
        ),
        word("w1", "Name", 0.10, 0.10),
        word("w2", "John", 0.10, 0.30),
        word("w3", "Doe", 0.10, 0.35),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    let pair = &resolution.pairs[0];
    assert_eq!(pair.key, "Name");
    assert_eq!(pair.value, "John Doe");
    assert_eq!(pair.provenance, Provenance::DirectRelationship);
    assert!((pair.confidence - 0.8).abs() < 1e-12);
    assert_eq!(pair.position, Position { top: 0.10, left: 0.10 });

    assert_eq!(resolution.resolutions.len(), 1);
    assert_eq!(resolution.resolutions[0].stage, Some(ResolutionStage::Direct));
    assert!(!resolution.resolutions[0].scored);
}

#[test]
fn field_blocks_without_children_use_their_own_text() {
    let resolution = resolve(vec![
        json!({
            "Id": "K", "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": ["KEY"], "Text": "Name",
            "Relationships": [{ "Type": "VALUE", "Ids": ["V"] }]
        }),
        json!({
            "Id": "V", "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": ["VALUE"], "Text": "John Doe"
        }),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].key, "Name");
    assert_eq!(resolution.pairs[0].value, "John Doe");
    assert_eq!(resolution.pairs[0].provenance, Provenance::DirectRelationship);
}

#[test]
fn inline_separator_line_becomes_a_pair() {
    let resolution = resolve(vec![line("l1", "Date: 2024-01-01", 0.2, 0.1)]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].key, "Date");
    assert_eq!(resolution.pairs[0].value, "2024-01-01");
    assert_eq!(resolution.pairs[0].provenance, Provenance::InlineSeparator);
}

#[test]
fn selected_checkbox_takes_the_preceding_line_as_key() {
    let resolution = resolve(vec![
        line("l1", "Agree?", 0.20, 0.10),
        json!({
            "Id": "s1", "BlockType": "SELECTION_ELEMENT", "Page": 1,
            "SelectionStatus": "SELECTED", "Confidence": 93.0,
            "Geometry": geometry(0.20, 0.18)
        }),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].key, "Agree?");
    assert_eq!(resolution.pairs[0].value, "[X]");
    assert_eq!(resolution.pairs[0].provenance, Provenance::Checkbox);
}

#[test]
fn checkbox_without_nearby_line_has_empty_key() {
    let resolution = resolve(vec![
        line("l1", "Far away", 0.90, 0.80),
        json!({
            "Id": "s1", "BlockType": "SELECTION_ELEMENT", "Page": 1,
            "SelectionStatus": "NOT_SELECTED", "Confidence": 88.0,
            "Geometry": geometry(0.10, 0.10)
        }),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].key, "");
    assert_eq!(resolution.pairs[0].value, "[ ]");
}

#[test]
fn checkbox_ignores_lines_below_or_to_the_right() {
    let resolution = resolve(vec![
        line("below", "Below the mark", 0.25, 0.10),
        line("right", "Right of mark", 0.20, 0.15),
        json!({
            "Id": "s1", "BlockType": "SELECTION_ELEMENT", "Page": 1,
            "SelectionStatus": "SELECTED", "Confidence": 91.0,
            "Geometry": geometry(0.20, 0.10)
        }),
    ]);

    let checkboxes = resolution
        .pairs
        .iter()
        .filter(|pair| pair.provenance == Provenance::Checkbox)
        .collect::<Vec<&Pair>>();
    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(checkboxes.len(), 1);
    assert_eq!(checkboxes[0].key, "");
    assert_eq!(checkboxes[0].value, "[X]");
}

#[test]
fn spatial_tie_is_broken_by_value_confidence() {
    let resolution = resolve(vec![
        field("K", "KEY", 99.0, 0.30, 0.30, json!([{ "Type": "CHILD", "Ids": ["wk"] }])),
        field("V60", "VALUE", 60.0, 0.30, 0.38, json!([{ "Type": "CHILD", "Ids": ["w60"] }])),
        field("V95", "VALUE", 95.0, 0.30, 0.22, json!([{ "Type": "CHILD", "Ids": ["w95"] }])),
        word("wk", "Total", 0.30, 0.30),
        word("w60", "100", 0.30, 0.38),
        word("w95", "200", 0.30, 0.22),
    ]);

    let resolution_for_key = &resolution.resolutions[0];
    assert_eq!(resolution_for_key.stage, Some(ResolutionStage::Spatial));
    assert_eq!(resolution_for_key.candidate_count, 2);
    assert!(resolution_for_key.scored);
    assert_eq!(resolution_for_key.selected_value_id.as_deref(), Some("V95"));

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].value, "200");
    assert_eq!(resolution.pairs[0].provenance, Provenance::SpatialProximity);
}

#[test]
fn confidence_decides_when_pattern_table_is_empty() {
    let key = candidate("k", "Total", 99.0, Some((0.3, 0.3)));
    let candidates = vec![
        candidate("a", "100", 60.0, Some((0.3, 0.38))),
        candidate("b", "200", 95.0, Some((0.3, 0.22))),
    ];

    let selection = select_candidate(
        &key,
        &candidates,
        &PatternTable::default(),
        &crate::config::ScoringWeights::default(),
    );

    assert!(selection.scored);
    assert_eq!(selection.index, 1);
}

#[test]
fn equal_scores_keep_the_first_candidate() {
    let key = candidate("k", "total", 99.0, None);
    let candidates = vec![
        candidate("a", "x", 80.0, None),
        candidate("b", "y", 80.0, None),
    ];

    let selection = select_candidate(
        &key,
        &candidates,
        &PatternTable::default(),
        &crate::config::ScoringWeights::default(),
    );

    assert_eq!(selection.index, 0);
}

#[test]
fn dominant_offset_outweighs_a_confidence_gap() {
    let keys = vec![
        candidate("k1", "Total", 99.0, Some((0.1, 0.1))),
        candidate("k2", "Tax", 99.0, Some((0.2, 0.1))),
    ];
    let values = vec![
        candidate("v1", "100", 70.0, Some((0.1, 0.4))),
        candidate("v2", "5", 90.0, Some((0.2, 0.4))),
    ];
    let patterns = PatternTable::build(&keys, &values);
    assert_eq!(patterns.signature_share(&OffsetSignature { dx: 30, dy: 0 }), 0.5);

    let candidates = vec![
        candidate("near", "250", 95.0, Some((0.1, 0.2))),
        values[0].clone(),
    ];
    let selection = select_candidate(
        &keys[0],
        &candidates,
        &patterns,
        &crate::config::ScoringWeights::default(),
    );

    assert_eq!(selection.index, 1);
    let score = selection.score.expect("scored");
    assert!((score - (0.4 * 0.5 + 0.3 * 0.70)).abs() < 1e-12);
}

#[test]
fn matching_capitals_outweigh_a_small_confidence_gap() {
    let key = candidate("k", "NAME", 90.0, None);
    let candidates = vec![
        candidate("lower", "john doe", 90.0, None),
        candidate("upper", "JOHN DOE", 85.0, None),
    ];

    let selection = select_candidate(
        &key,
        &candidates,
        &PatternTable::default(),
        &crate::config::ScoringWeights::default(),
    );

    assert_eq!(selection.index, 1);
    let score = selection.score.expect("scored");
    assert!((score - (0.3 * 0.85 + 0.15)).abs() < 1e-12);
}

#[test]
fn score_adds_every_weighted_term() {
    let key = candidate("k", "Name:", 90.0, Some((0.1, 0.1)));
    let title = candidate("v", "John Doe", 80.0, Some((0.1, 0.4)));
    let upper = candidate("u", "JOHN DOE", 80.0, Some((0.1, 0.4)));
    let patterns = PatternTable::build(std::slice::from_ref(&key), std::slice::from_ref(&title));
    let weights = crate::config::ScoringWeights::default();

    assert_eq!(patterns.dominant_separator(), Some(Separator::Colon));

    let full = score_candidate(&key, &title, &patterns, &weights);
    assert!((full - (0.4 * 1.0 + 0.3 * 0.8 + 0.15 + 0.15)).abs() < 1e-12);

    let without_case = score_candidate(&key, &upper, &patterns, &weights);
    assert!((without_case - (0.4 * 1.0 + 0.3 * 0.8 + 0.15)).abs() < 1e-12);

    let unpositioned = candidate("x", "John Doe", 80.0, None);
    let without_pattern = score_candidate(&key, &unpositioned, &patterns, &weights);
    assert!((without_pattern - (0.3 * 0.8 + 0.15 + 0.15)).abs() < 1e-12);
}

#[test]
fn single_candidate_is_selected_without_scoring() {
    let key = candidate("k", "Name", 90.0, Some((0.1, 0.1)));
    let candidates = vec![candidate("v", "John", 10.0, Some((0.1, 0.3)))];

    let selection = select_candidate(
        &key,
        &candidates,
        &PatternTable::default(),
        &crate::config::ScoringWeights::default(),
    );

    assert_eq!(
        selection,
        Selection {
            index: 0,
            scored: false,
            score: None
        }
    );
}

#[test]
fn two_hop_chain_resolves_as_indirect() {
    let resolution = resolve(vec![
        field(
            "K",
            "KEY",
            90.0,
            0.10,
            0.10,
            json!([{ "Type": "CHILD", "Ids": ["wk", "M"] }]),
        ),
        json!({ "Id": "M", "Page": 1, "Relationships": [{ "Type": "VALUE", "Ids": ["V"] }] }),
        field("V", "VALUE", 90.0, 0.80, 0.80, json!([{ "Type": "CHILD", "Ids": ["wv"] }])),
        word("wk", "Policy", 0.10, 0.10),
        word("wv", "A-17", 0.80, 0.80),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].key, "Policy");
    assert_eq!(resolution.pairs[0].value, "A-17");
    assert_eq!(
        resolution.pairs[0].provenance,
        Provenance::IndirectRelationship
    );
}

#[test]
fn dangling_value_reference_leaves_key_unpaired() {
    let resolution = resolve(vec![
        field(
            "K",
            "KEY",
            90.0,
            0.10,
            0.10,
            json!([{ "Type": "VALUE", "Ids": ["ghost"] }, { "Type": "CHILD", "Ids": ["wk"] }]),
        ),
        word("wk", "Name", 0.10, 0.10),
    ]);

    assert!(resolution.pairs.is_empty());
    assert_eq!(resolution.unpaired_keys, vec!["K".to_string()]);
}

#[test]
fn direct_target_on_another_page_is_still_resolved() {
    let document = Document::from_value(json!([{ "Blocks": [
        field("K", "KEY", 90.0, 0.9, 0.1, json!([{ "Type": "VALUE", "Ids": ["V"] }, { "Type": "CHILD", "Ids": ["wk"] }])),
        word("wk", "Continued", 0.9, 0.1),
        { "Id": "V", "BlockType": "KEY_VALUE_SET", "Page": 2, "EntityTypes": ["VALUE"], "Confidence": 85.0,
          "Relationships": [{ "Type": "CHILD", "Ids": ["wv"] }] },
        { "Id": "wv", "BlockType": "WORD", "Page": 2, "Text": "overflow" }
    ] }]))
    .expect("document");

    let page = document.page(1).expect("page 1");
    let resolution = resolve_page(&document, page, &ResolverConfig::default());

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].value, "overflow");
    assert_eq!(resolution.pairs[0].position, Position { top: 0.9, left: 0.1 });
}

#[test]
fn nearby_short_number_becomes_identifier_label() {
    let resolution = resolve(vec![
        line("n", "3.", 0.10, 0.03),
        field(
            "K",
            "KEY",
            90.0,
            0.10,
            0.10,
            json!([{ "Type": "VALUE", "Ids": ["V"] }, { "Type": "CHILD", "Ids": ["wk"] }]),
        ),
        field("V", "VALUE", 90.0, 0.10, 0.30, json!([{ "Type": "CHILD", "Ids": ["wv"] }])),
        word("wk", "Dose", 0.10, 0.10),
        word("wv", "10mg", 0.10, 0.30),
    ]);

    assert_eq!(resolution.pairs.len(), 1);
    assert_eq!(resolution.pairs[0].identifier_label.as_deref(), Some("3"));
}

#[test]
fn identifier_label_accepts_only_short_numbers() {
    assert_eq!(identifier_label(" 7 ").as_deref(), Some("7"));
    assert_eq!(identifier_label("12)").as_deref(), Some("12"));
    assert_eq!(identifier_label("123"), None);
    assert_eq!(identifier_label("a1"), None);
    assert_eq!(identifier_label(""), None);
}

#[test]
fn split_inline_guards_against_non_fields() {
    assert_eq!(
        split_inline("Ratio = 3:4"),
        Some(("Ratio".to_string(), "3:4".to_string()))
    );
    assert_eq!(split_inline("10:30"), None);
    assert_eq!(split_inline("Name:"), None);
    assert_eq!(split_inline("see https://example.org"), None);
}

#[test]
fn spatial_candidates_use_wider_band_for_checkboxes() {
    let key = candidate("k", "Smoker", 90.0, Some((0.40, 0.10)));
    let values = vec![
        candidate("text", "yes", 90.0, Some((0.46, 0.12))),
        candidate("box", "[X]", 90.0, Some((0.46, 0.12))),
    ];

    let found = spatial_candidates(&key, &values, &ResolverConfig::default());

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "box");
}

#[test]
fn ranking_keeps_the_most_confident_duplicate() {
    let pairs = vec![
        pair("Name", "John", 0.70, 0.1, Some(0.2)),
        pair("Name", "John", 0.90, 0.5, Some(0.3)),
        pair("City", "Lisbon", 0.90, 0.3, Some(0.1)),
    ];

    let finalized = finalize_pairs(pairs);

    assert_eq!(finalized.len(), 2);
    assert_eq!(finalized[0].key, "City");
    assert_eq!(finalized[1].key, "Name");
    assert_eq!(finalized[1].confidence, 0.90);
    assert_eq!(finalized[1].position.top, 0.5);
}

#[test]
fn ranking_breaks_confidence_ties_by_distance() {
    let mut pairs = vec![
        pair("A", "far", 0.8, 0.1, Some(0.4)),
        pair("A", "near", 0.8, 0.2, Some(0.1)),
        pair("A", "unknown", 0.8, 0.3, None),
    ];

    rank_pairs(&mut pairs);

    let order = pairs.iter().map(|pair| pair.value.as_str()).collect::<Vec<&str>>();
    assert_eq!(order, vec!["near", "far", "unknown"]);
}

#[test]
fn dedup_is_idempotent() {
    let pairs = vec![
        pair("Name", "John", 0.9, 0.1, None),
        pair("Name", "John", 0.8, 0.2, None),
        pair("Name", "Jane", 0.8, 0.3, None),
        pair("", "[X]", 0.7, 0.4, None),
        pair("", "[X]", 0.7, 0.5, None),
    ];

    let once = dedup_pairs(pairs);
    let twice = dedup_pairs(once.clone());

    assert_eq!(once.len(), 3);
    assert_eq!(once, twice);
}

#[test]
fn checkbox_like_values_are_only_marks() {
    assert!(candidate("a", "[X]", 90.0, None).is_checkbox_like());
    assert!(candidate("a", "[ ] [X]", 90.0, None).is_checkbox_like());
    assert!(candidate("a", "[ ]", 90.0, None).is_checkbox_like());
    assert!(!candidate("a", "[X] yes", 90.0, None).is_checkbox_like());
    assert!(!candidate("a", "", 90.0, None).is_checkbox_like());
}
