use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geometry::BoundingBox;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    KeyValueSet,
    SelectionElement,
    Table,
    TableTitle,
    TableFooter,
    Cell,
    MergedCell,
    Title,
    Query,
    QueryResult,
    Signature,
    Unknown,
}

impl BlockType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PAGE" => Self::Page,
            "LINE" => Self::Line,
            "WORD" => Self::Word,
            "KEY_VALUE_SET" => Self::KeyValueSet,
            "SELECTION_ELEMENT" => Self::SelectionElement,
            "TABLE" => Self::Table,
            "TABLE_TITLE" => Self::TableTitle,
            "TABLE_FOOTER" => Self::TableFooter,
            "CELL" => Self::Cell,
            "MERGED_CELL" => Self::MergedCell,
            "TITLE" => Self::Title,
            "QUERY" => Self::Query,
            "QUERY_RESULT" => Self::QueryResult,
            "SIGNATURE" => Self::Signature,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "PAGE",
            Self::Line => "LINE",
            Self::Word => "WORD",
            Self::KeyValueSet => "KEY_VALUE_SET",
            Self::SelectionElement => "SELECTION_ELEMENT",
            Self::Table => "TABLE",
            Self::TableTitle => "TABLE_TITLE",
            Self::TableFooter => "TABLE_FOOTER",
            Self::Cell => "CELL",
            Self::MergedCell => "MERGED_CELL",
            Self::Title => "TITLE",
            Self::Query => "QUERY",
            Self::QueryResult => "QUERY_RESULT",
            Self::Signature => "SIGNATURE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Value,
    Key,
    Child,
    MergedCell,
    Title,
    Answer,
    Table,
    TableTitle,
    TableFooter,
    ComplexFeatures,
    Other,
}

impl RelationshipType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "VALUE" => Self::Value,
            "KEY" => Self::Key,
            "CHILD" => Self::Child,
            "MERGED_CELL" => Self::MergedCell,
            "TITLE" => Self::Title,
            "ANSWER" => Self::Answer,
            "TABLE" => Self::Table,
            "TABLE_TITLE" => Self::TableTitle,
            "TABLE_FOOTER" => Self::TableFooter,
            "COMPLEX_FEATURES" => Self::ComplexFeatures,
            _ => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Value => "VALUE",
            Self::Key => "KEY",
            Self::Child => "CHILD",
            Self::MergedCell => "MERGED_CELL",
            Self::Title => "TITLE",
            Self::Answer => "ANSWER",
            Self::Table => "TABLE",
            Self::TableTitle => "TABLE_TITLE",
            Self::TableFooter => "TABLE_FOOTER",
            Self::ComplexFeatures => "COMPLEX_FEATURES",
            Self::Other => "OTHER",
        }
    }

    /// KEY and VALUE edges link the two halves of a form field.
    pub fn is_key_value(self) -> bool {
        matches!(self, Self::Key | Self::Value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Key,
    Value,
    Other,
}

impl EntityType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "KEY" => Self::Key,
            "VALUE" => Self::Value,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectionStatus {
    Selected,
    NotSelected,
}

impl SelectionStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "SELECTED" => Some(Self::Selected),
            "NOT_SELECTED" => Some(Self::NotSelected),
            _ => None,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Self::Selected => "[X]",
            Self::NotSelected => "[ ]",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Relationship {
    pub kind: RelationshipType,
    pub ids: Vec<String>,
}

/// One positioned element of the analysis output. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    pub page: u32,
    pub block_type: BlockType,
    pub text: Option<String>,
    /// Raw confidence as delivered, either on a 0-100 or a 0-1 scale.
    pub confidence: Option<f64>,
    pub bounding_box: Option<BoundingBox>,
    pub entity_types: Vec<EntityType>,
    pub selection_status: Option<SelectionStatus>,
    pub relationships: Vec<Relationship>,
}

impl Block {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    pub fn raw_confidence(&self) -> f64 {
        self.confidence.unwrap_or(0.0)
    }

    pub fn normalized_confidence(&self) -> f64 {
        normalize_confidence(self.raw_confidence())
    }

    pub fn is_key(&self) -> bool {
        self.block_type == BlockType::KeyValueSet && self.entity_types.contains(&EntityType::Key)
    }

    pub fn is_value(&self) -> bool {
        self.block_type == BlockType::KeyValueSet
            && self.entity_types.contains(&EntityType::Value)
    }

    pub fn targets(&self, kind: RelationshipType) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(move |relationship| relationship.kind == kind)
            .flat_map(|relationship| relationship.ids.iter().map(String::as_str))
    }

    pub(crate) fn from_raw(raw: RawBlock) -> Self {
        let bounding_box = raw
            .geometry
            .as_ref()
            .and_then(|geometry| geometry.get("BoundingBox"))
            .and_then(bounding_box_from_value);

        let relationships = raw
            .relationships
            .unwrap_or_default()
            .iter()
            .filter_map(relationship_from_value)
            .collect::<Vec<Relationship>>();

        let entity_types = raw
            .entity_types
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_str)
            .map(EntityType::parse)
            .collect::<Vec<EntityType>>();

        Self {
            id: raw.id.unwrap_or_default(),
            page: raw.page.unwrap_or(0),
            block_type: raw
                .block_type
                .as_deref()
                .map(BlockType::parse)
                .unwrap_or(BlockType::Unknown),
            text: raw.text,
            confidence: raw.confidence,
            bounding_box,
            entity_types,
            selection_status: raw.selection_status.as_deref().and_then(SelectionStatus::parse),
            relationships,
        }
    }
}

/// Maps a raw confidence onto [0, 1]. Values above 1 are read as percentages.
pub fn normalize_confidence(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }

    let scaled = if raw > 1.0 { raw / 100.0 } else { raw };
    scaled.clamp(0.0, 1.0)
}

/// Wire shape of a block. Every field is optional and tolerant of the wrong
/// JSON type so that one odd field never rejects the whole block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub(crate) struct RawBlock {
    #[serde(deserialize_with = "lenient_string")]
    id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    block_type: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    page: Option<u32>,
    #[serde(deserialize_with = "lenient_string")]
    text: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    confidence: Option<f64>,
    geometry: Option<Value>,
    #[serde(deserialize_with = "lenient_array")]
    relationships: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient_array")]
    entity_types: Option<Vec<Value>>,
    #[serde(deserialize_with = "lenient_string")]
    selection_status: Option<String>,
}

fn bounding_box_from_value(value: &Value) -> Option<BoundingBox> {
    let object = value.as_object()?;
    let field = |name: &str| object.get(name).and_then(number_from_value).unwrap_or(0.0);

    Some(BoundingBox {
        top: field("Top"),
        left: field("Left"),
        width: field("Width"),
        height: field("Height"),
    })
}

fn relationship_from_value(value: &Value) -> Option<Relationship> {
    let object = value.as_object()?;
    let kind = object
        .get("Type")
        .and_then(Value::as_str)
        .map(RelationshipType::parse)
        .unwrap_or(RelationshipType::Other);
    let ids = object
        .get("Ids")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect::<Vec<String>>()
        })
        .unwrap_or_default();

    Some(Relationship { kind, ids })
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_u64().and_then(|page| u32::try_from(page).ok()),
        Some(Value::String(text)) => text.trim().parse::<u32>().ok(),
        _ => None,
    })
}

fn lenient_array<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items),
        _ => None,
    })
}
