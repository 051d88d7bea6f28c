use std::collections::{HashMap, HashSet};

use crate::block::{Block, RelationshipType};
use crate::index::{Document, PageIndex};

pub const DEFAULT_CHASE_DEPTH: usize = 2;

/// Relationship edges of one page, split by how they were reached.
///
/// `direct` holds KEY/VALUE targets of each block. `indirect` holds CHILD
/// targets plus everything reached by following KEY/VALUE edges from the
/// block's own targets, up to the chase depth.
#[derive(Debug, Clone, Default)]
pub struct RelationshipMaps {
    pub direct: HashMap<String, Vec<String>>,
    pub indirect: HashMap<String, Vec<String>>,
}

impl RelationshipMaps {
    pub fn direct_targets(&self, id: &str) -> &[String] {
        self.direct.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn indirect_targets(&self, id: &str) -> &[String] {
        self.indirect.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}

pub fn classify_page(document: &Document, page: &PageIndex, max_depth: usize) -> RelationshipMaps {
    let mut maps = RelationshipMaps::default();

    for &index in &page.with_relationships {
        let block = document.block(index);

        for relationship in &block.relationships {
            if relationship.kind.is_key_value() {
                merge_unique(
                    maps.direct.entry(block.id.clone()).or_default(),
                    &relationship.ids,
                );
            } else if relationship.kind == RelationshipType::Child {
                merge_unique(
                    maps.indirect.entry(block.id.clone()).or_default(),
                    &relationship.ids,
                );
            }
        }

        let chased = chase(document, block, max_depth);
        if !chased.is_empty() {
            merge_unique(maps.indirect.entry(block.id.clone()).or_default(), &chased);
        }
    }

    maps
}

/// Bounded breadth-first walk from `origin`.
///
/// The first hop follows every edge type; later hops follow KEY/VALUE edges
/// only. Returns the ids reached at depth 2 through `max_depth`, in discovery
/// order, without the origin itself.
pub fn chase<'a>(document: &'a Document, origin: &'a Block, max_depth: usize) -> Vec<String> {
    let mut reached = Vec::<String>::new();
    if max_depth < 2 {
        return reached;
    }

    let mut seen = HashSet::<&str>::new();
    let mut expanded = HashSet::<&str>::from([origin.id.as_str()]);
    let mut frontier = origin
        .relationships
        .iter()
        .flat_map(|relationship| relationship.ids.iter().map(String::as_str))
        .collect::<Vec<&str>>();

    for _ in 2..=max_depth {
        let mut next = Vec::<&str>::new();

        for id in frontier {
            if !expanded.insert(id) {
                continue;
            }
            for relationship in document
                .relationships(id)
                .iter()
                .filter(|relationship| relationship.kind.is_key_value())
            {
                for target in &relationship.ids {
                    if target == &origin.id {
                        continue;
                    }
                    if seen.insert(target.as_str()) {
                        reached.push(target.clone());
                    }
                    next.push(target.as_str());
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    reached
}

fn merge_unique(into: &mut Vec<String>, ids: &[String]) {
    for id in ids {
        if !into.contains(id) {
            into.push(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn document(blocks: serde_json::Value) -> Document {
        Document::from_value(json!([{ "Blocks": blocks }])).expect("document")
    }

    #[test]
    fn two_hop_chain_lands_in_indirect_set() {
        let document = document(json!([
            { "Id": "A", "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": ["KEY"],
              "Relationships": [{ "Type": "CHILD", "Ids": ["B"] }] },
            { "Id": "B", "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": ["KEY"],
              "Relationships": [{ "Type": "VALUE", "Ids": ["C"] }] },
            { "Id": "C", "BlockType": "KEY_VALUE_SET", "Page": 1, "EntityTypes": ["VALUE"] }
        ]));
        let page = document.page(1).expect("page");

        let maps = classify_page(&document, page, DEFAULT_CHASE_DEPTH);

        assert!(maps.direct_targets("A").is_empty());
        assert_eq!(maps.indirect_targets("A"), ["B".to_string(), "C".to_string()]);
        assert_eq!(maps.direct_targets("B"), ["C".to_string()]);
    }

    #[test]
    fn chase_stops_at_the_depth_limit() {
        let document = document(json!([
            { "Id": "A", "Relationships": [{ "Type": "CHILD", "Ids": ["B"] }] },
            { "Id": "B", "Relationships": [{ "Type": "VALUE", "Ids": ["C"] }] },
            { "Id": "C", "Relationships": [{ "Type": "VALUE", "Ids": ["D"] }] },
            { "Id": "D" }
        ]));
        let origin = document.get("A").expect("origin");

        assert_eq!(chase(&document, origin, 2), vec!["C".to_string()]);
        assert_eq!(
            chase(&document, origin, 3),
            vec!["C".to_string(), "D".to_string()]
        );
        assert!(chase(&document, origin, 1).is_empty());
    }

    #[test]
    fn chase_survives_cycles_and_dangling_ids() {
        let document = document(json!([
            { "Id": "A", "Relationships": [{ "Type": "VALUE", "Ids": ["B", "ghost"] }] },
            { "Id": "B", "Relationships": [{ "Type": "KEY", "Ids": ["A", "C"] }] },
            { "Id": "C", "Relationships": [{ "Type": "KEY", "Ids": ["B"] }] }
        ]));
        let origin = document.get("A").expect("origin");

        let reached = chase(&document, origin, 6);
        assert_eq!(reached, vec!["C".to_string(), "B".to_string()]);
    }

    #[test]
    fn second_hop_ignores_child_edges() {
        let document = document(json!([
            { "Id": "K", "Page": 1, "Relationships": [{ "Type": "VALUE", "Ids": ["V"] }] },
            { "Id": "V", "Page": 1, "Relationships": [{ "Type": "CHILD", "Ids": ["W"] }] },
            { "Id": "W", "Page": 1 }
        ]));
        let page = document.page(1).expect("page");

        let maps = classify_page(&document, page, DEFAULT_CHASE_DEPTH);

        assert_eq!(maps.direct_targets("K"), ["V".to_string()]);
        assert!(maps.indirect_targets("K").is_empty());
        assert_eq!(maps.indirect_targets("V"), ["W".to_string()]);
    }
}
