//! Ingredient extraction: one recipe record in, one flat ingredient map out.

use crate::recipe::{CraftType, Ingredient, RecipeRecord, RecipeResult};
use crate::rules::RuleSet;
use crate::tags::{TagError, TagTable};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while extracting a single record.
///
/// Never fatal to a catalog pass: callers log the record and move on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecipeError {
    #[error("malformed {craft_type} recipe: {detail}")]
    MalformedRecipe {
        craft_type: CraftType,
        detail: String,
    },
}

fn malformed(craft_type: CraftType, detail: impl Into<String>) -> RecipeError {
    RecipeError::MalformedRecipe {
        craft_type,
        detail: detail.into(),
    }
}

// ---------------------------------------------------------------------------
// IngredientMap
// ---------------------------------------------------------------------------

/// Material name to occurrence count, plus the batch size of the output.
///
/// Counts are always positive. Keys are kept sorted so that everything
/// built from a map (graph edges, resolution order) is deterministic.
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientMap {
    ingredients: BTreeMap<String, f64>,
    count: f64,
}

impl IngredientMap {
    /// An empty map for a recipe yielding `count` units per batch.
    pub fn new(count: f64) -> Self {
        Self {
            ingredients: BTreeMap::new(),
            count,
        }
    }

    /// Record one more occurrence of `name`.
    pub fn add(&mut self, name: impl Into<String>) {
        self.add_n(name, 1.0);
    }

    pub fn add_n(&mut self, name: impl Into<String>, occurrences: f64) {
        *self.ingredients.entry(name.into()).or_insert(0.0) += occurrences;
    }

    /// Batch size: units of product per crafting operation.
    pub fn count(&self) -> f64 {
        self.count
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.ingredients.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ingredients.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// Replace every tag reference by its representative. Two slots that
    /// land on the same material are summed.
    pub fn resolve_tags(self, tags: &TagTable) -> Result<Self, TagError> {
        let mut resolved = IngredientMap::new(self.count);
        for (name, occurrences) in &self.ingredients {
            resolved.add_n(tags.resolve(name)?, *occurrences);
        }
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Normalize one record into an [`IngredientMap`].
///
/// Returns `Ok(None)` for craft types the extractor does not handle.
/// Tag references are left in place; see [`IngredientMap::resolve_tags`].
pub fn extract(record: &RecipeRecord, rules: &RuleSet) -> Result<Option<IngredientMap>, RecipeError> {
    let map = match record {
        RecipeRecord::Shaped {
            pattern,
            key,
            result,
            ..
        } => extract_shaped(pattern, key, result)?,
        RecipeRecord::Shapeless {
            group, ingredients, ..
        } if group.as_deref() == Some(rules.wool.group.as_str()) => {
            extract_wool_dye(ingredients, rules)?
        }
        RecipeRecord::Shapeless {
            ingredients,
            result,
            ..
        } => extract_shapeless(ingredients, result)?,
        RecipeRecord::Smelting { ingredient } => {
            let mut map = IngredientMap::new(1.0);
            map.add(slot(ingredient, CraftType::Smelting, "ingredient")?);
            map
        }
        RecipeRecord::SmithingTransform {
            base,
            addition,
            template,
        } => {
            let kind = CraftType::SmithingTransform;
            let mut map = IngredientMap::new(1.0);
            map.add(slot(addition, kind, "addition")?);
            map.add(slot(base, kind, "base")?);
            map.add(slot(template, kind, "template")?);
            map
        }
        RecipeRecord::Transmute { input, material } => {
            let kind = CraftType::CraftingTransmute;
            let base = match input {
                Some(input) => slot(input, kind, "input")?,
                None => rules.transmute_base.clone(),
            };
            let mut map = IngredientMap::new(1.0);
            map.add(base);
            map.add(slot(material, kind, "material")?);
            map
        }
        RecipeRecord::Unsupported => return Ok(None),
    };
    Ok(Some(map))
}

fn slot(ingredient: &Ingredient, kind: CraftType, field: &str) -> Result<String, RecipeError> {
    ingredient
        .representative()
        .ok_or_else(|| malformed(kind, format!("empty ingredient list in '{field}'")))
}

fn batch_size(result: &RecipeResult, kind: CraftType) -> Result<f64, RecipeError> {
    if result.count <= 0 {
        return Err(malformed(
            kind,
            format!("non-positive result count {}", result.count),
        ));
    }
    Ok(result.count as f64)
}

fn extract_shaped(
    pattern: &[String],
    key: &BTreeMap<String, Ingredient>,
    result: &RecipeResult,
) -> Result<IngredientMap, RecipeError> {
    let kind = CraftType::CraftingShaped;
    let mut map = IngredientMap::new(batch_size(result, kind)?);

    for symbol in pattern.concat().chars().filter(|c| *c != ' ') {
        let ingredient = key
            .get(symbol.encode_utf8(&mut [0; 4]) as &str)
            .ok_or_else(|| malformed(kind, format!("pattern key '{symbol}' has no entry")))?;
        map.add(slot(ingredient, kind, "key")?);
    }

    if map.is_empty() {
        return Err(malformed(kind, "pattern is empty"));
    }
    Ok(map)
}

fn extract_shapeless(
    ingredients: &[Ingredient],
    result: &RecipeResult,
) -> Result<IngredientMap, RecipeError> {
    let kind = CraftType::CraftingShapeless;
    if ingredients.is_empty() {
        return Err(malformed(kind, "no ingredients"));
    }
    let mut map = IngredientMap::new(batch_size(result, kind)?);
    for ingredient in ingredients {
        map.add(slot(ingredient, kind, "ingredients")?);
    }
    Ok(map)
}

/// Dyed wool is plain wool plus a colorant; dyeing with the default colorant
/// is just the plain wool.
fn extract_wool_dye(ingredients: &[Ingredient], rules: &RuleSet) -> Result<IngredientMap, RecipeError> {
    let kind = CraftType::WoolDye;
    let dye = ingredients
        .first()
        .ok_or_else(|| malformed(kind, "no colorant"))
        .and_then(|first| slot(first, kind, "ingredients"))?;

    let mut map = IngredientMap::new(1.0);
    map.add(rules.wool.default_wool.as_str());
    if dye != rules.wool.default_dye {
        map.add(dye);
    }
    Ok(map)
}
