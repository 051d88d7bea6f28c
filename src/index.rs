use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::block::{Block, BlockType, RawBlock, Relationship};
use crate::error::LoadError;

/// Per-page lookup structures over the document arena. Entries are indices
/// into [`Document::blocks`].
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pub page: u32,
    pub blocks: Vec<usize>,
    pub positioned: Vec<usize>,
    pub by_type: BTreeMap<BlockType, Vec<usize>>,
    pub with_relationships: Vec<usize>,
}

impl PageIndex {
    pub fn of_type(&self, block_type: BlockType) -> &[usize] {
        self.by_type
            .get(&block_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A fully loaded analysis document. Built once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    by_id: HashMap<String, usize>,
    pages: BTreeMap<u32, PageIndex>,
    response_count: usize,
    skipped_block_count: usize,
    declared_page_count: Option<u32>,
}

impl Document {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let raw = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&raw)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, LoadError> {
        let value = serde_json::from_slice::<Value>(raw)?;
        Self::from_value(value)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LoadError> {
        let value = serde_json::from_str::<Value>(raw)?;
        Self::from_value(value)
    }

    /// Accepts a list of per-page response objects, or one response object.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        let responses = match value {
            Value::Array(items) => items,
            Value::Object(_) => vec![value],
            Value::Null => return Err(LoadError::UnexpectedShape("null")),
            Value::Bool(_) => return Err(LoadError::UnexpectedShape("a boolean")),
            Value::Number(_) => return Err(LoadError::UnexpectedShape("a number")),
            Value::String(_) => return Err(LoadError::UnexpectedShape("a string")),
        };

        let mut blocks = Vec::<Block>::new();
        let mut skipped_block_count = 0usize;
        let mut declared_page_count = None::<u32>;

        for (response_index, response) in responses.iter().enumerate() {
            let Some(object) = response.as_object() else {
                warn!(response_index, "skipping response entry that is not an object");
                continue;
            };

            if let Some(pages) = object
                .get("DocumentMetadata")
                .and_then(|metadata| metadata.get("Pages"))
                .and_then(Value::as_u64)
                .and_then(|pages| u32::try_from(pages).ok())
            {
                declared_page_count = Some(declared_page_count.map_or(pages, |seen| seen.max(pages)));
            }

            let Some(raw_blocks) = object.get("Blocks").and_then(Value::as_array) else {
                debug!(response_index, "response entry has no Blocks list");
                continue;
            };

            for (block_index, raw_block) in raw_blocks.iter().enumerate() {
                match serde_json::from_value::<RawBlock>(raw_block.clone()) {
                    Ok(raw) => blocks.push(Block::from_raw(raw)),
                    Err(err) => {
                        skipped_block_count += 1;
                        warn!(
                            response_index,
                            block_index,
                            error = %err,
                            "skipping malformed block"
                        );
                    }
                }
            }
        }

        let mut document = Self::from_blocks(blocks);
        document.response_count = responses.len();
        document.skipped_block_count = skipped_block_count;
        document.declared_page_count = declared_page_count;
        Ok(document)
    }

    /// Indexes already-built blocks. The first block with a given id owns it
    /// in the id map; later duplicates stay in the arena for validation.
    /// Blocks without an id are never resolvable.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut by_id = HashMap::<String, usize>::with_capacity(blocks.len());
        let mut pages = BTreeMap::<u32, PageIndex>::new();

        for (index, block) in blocks.iter().enumerate() {
            if !block.id.is_empty() {
                by_id.entry(block.id.clone()).or_insert(index);
            }

            let page = pages.entry(block.page).or_insert_with(|| PageIndex {
                page: block.page,
                ..PageIndex::default()
            });
            page.blocks.push(index);
            if block.bounding_box.is_some() {
                page.positioned.push(index);
            }
            page.by_type.entry(block.block_type).or_default().push(index);
            if !block.relationships.is_empty() {
                page.with_relationships.push(index);
            }
        }

        Self {
            blocks,
            by_id,
            pages,
            response_count: 0,
            skipped_block_count: 0,
            declared_page_count: None,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    pub fn get(&self, id: &str) -> Option<&Block> {
        self.by_id.get(id).map(|index| &self.blocks[*index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn relationships(&self, id: &str) -> &[Relationship] {
        self.get(id)
            .map(|block| block.relationships.as_slice())
            .unwrap_or_default()
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageIndex> {
        self.pages.values()
    }

    pub fn page(&self, page: u32) -> Option<&PageIndex> {
        self.pages.get(&page)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn response_count(&self) -> usize {
        self.response_count
    }

    pub fn skipped_block_count(&self) -> usize {
        self.skipped_block_count
    }

    pub fn declared_page_count(&self) -> Option<u32> {
        self.declared_page_count
    }
}
