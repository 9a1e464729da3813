//! Recipe records as they appear in the game's data files.
//!
//! One record per recipe file. The record's product name is the file stem and
//! is carried by the caller (see [`crate::compile`]); the record itself only
//! holds the craft type and its type-specific fields. Identifiers keep their
//! `minecraft:` namespace here and are normalized during extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Namespace prefix stripped from every identifier.
pub const NAMESPACE: &str = "minecraft:";

/// Marker that distinguishes a tag-group reference from a concrete material.
pub const TAG_MARKER: char = '#';

/// Strip the `minecraft:` namespace from an identifier, keeping a leading
/// tag marker: `#minecraft:planks` becomes `#planks`.
pub fn normalize_id(id: &str) -> String {
    match id.strip_prefix(TAG_MARKER) {
        Some(rest) => format!("{TAG_MARKER}{}", rest.strip_prefix(NAMESPACE).unwrap_or(rest)),
        None => id.strip_prefix(NAMESPACE).unwrap_or(id).to_string(),
    }
}

// ---------------------------------------------------------------------------
// Craft types
// ---------------------------------------------------------------------------

/// The shape of a recipe record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CraftType {
    CraftingShaped,
    CraftingShapeless,
    Smelting,
    SmithingTransform,
    CraftingTransmute,
    /// Shapeless recipes in the wool group. Never a declared type; detected
    /// from the record's group marker.
    WoolDye,
}

impl CraftType {
    pub fn as_str(self) -> &'static str {
        match self {
            CraftType::CraftingShaped => "crafting_shaped",
            CraftType::CraftingShapeless => "crafting_shapeless",
            CraftType::Smelting => "smelting",
            CraftType::SmithingTransform => "smithing_transform",
            CraftType::CraftingTransmute => "crafting_transmute",
            CraftType::WoolDye => "wool_dye",
        }
    }
}

impl fmt::Display for CraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Ingredients
// ---------------------------------------------------------------------------

/// One ingredient slot. Data files use several spellings for the same thing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Ingredient {
    /// `"minecraft:stick"` or `"#minecraft:planks"`.
    Id(String),
    /// `{"item": "minecraft:stick"}`.
    Item { item: String },
    /// `{"tag": "minecraft:planks"}`.
    Tag { tag: String },
    /// Any of several acceptable materials.
    AnyOf(Vec<Ingredient>),
}

impl Ingredient {
    /// The single material name that stands for this slot.
    ///
    /// For a multi-option slot the shortest normalized name wins, ties going
    /// to the first listed option: the base form of a material family almost
    /// always has the shortest name. Returns `None` for an empty option list.
    pub fn representative(&self) -> Option<String> {
        match self {
            Ingredient::Id(id) => Some(normalize_id(id)),
            Ingredient::Item { item } => Some(normalize_id(item)),
            Ingredient::Tag { tag } => {
                let tag = tag.strip_prefix(TAG_MARKER).unwrap_or(tag);
                Some(normalize_id(&format!("{TAG_MARKER}{tag}")))
            }
            Ingredient::AnyOf(options) => options
                .iter()
                .filter_map(Ingredient::representative)
                .min_by_key(|name| name.len()),
        }
    }
}

/// The output section of a crafting record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecipeResult {
    #[serde(default)]
    pub id: Option<String>,
    /// Batch size. Data files omit it when a recipe yields a single unit.
    #[serde(default = "default_count")]
    pub count: i64,
}

fn default_count() -> i64 {
    1
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A parsed recipe record, tagged by its declared `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum RecipeRecord {
    #[serde(rename = "minecraft:crafting_shaped", alias = "crafting_shaped")]
    Shaped {
        #[serde(default)]
        group: Option<String>,
        pattern: Vec<String>,
        key: BTreeMap<String, Ingredient>,
        result: RecipeResult,
    },
    #[serde(rename = "minecraft:crafting_shapeless", alias = "crafting_shapeless")]
    Shapeless {
        #[serde(default)]
        group: Option<String>,
        ingredients: Vec<Ingredient>,
        result: RecipeResult,
    },
    #[serde(rename = "minecraft:smelting", alias = "smelting")]
    Smelting { ingredient: Ingredient },
    #[serde(rename = "minecraft:smithing_transform", alias = "smithing_transform")]
    SmithingTransform {
        base: Ingredient,
        addition: Ingredient,
        template: Ingredient,
    },
    #[serde(rename = "minecraft:crafting_transmute", alias = "crafting_transmute")]
    Transmute {
        #[serde(default)]
        input: Option<Ingredient>,
        material: Ingredient,
    },
    /// Loot-style and special recipes the extractor does not handle.
    #[serde(other)]
    Unsupported,
}

impl RecipeRecord {
    /// The declared craft type, or `None` for unsupported records.
    ///
    /// Wool-dye records report their declared shapeless type here; the
    /// wool-dye shape only matters to the extractor.
    pub fn craft_type(&self) -> Option<CraftType> {
        match self {
            RecipeRecord::Shaped { .. } => Some(CraftType::CraftingShaped),
            RecipeRecord::Shapeless { .. } => Some(CraftType::CraftingShapeless),
            RecipeRecord::Smelting { .. } => Some(CraftType::Smelting),
            RecipeRecord::SmithingTransform { .. } => Some(CraftType::SmithingTransform),
            RecipeRecord::Transmute { .. } => Some(CraftType::CraftingTransmute),
            RecipeRecord::Unsupported => None,
        }
    }

    pub fn group(&self) -> Option<&str> {
        match self {
            RecipeRecord::Shaped { group, .. } | RecipeRecord::Shapeless { group, .. } => {
                group.as_deref()
            }
            _ => None,
        }
    }
}
