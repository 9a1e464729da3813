//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::extract::IngredientMap;
use crate::graph::CraftGraph;
use crate::recipe::{Ingredient, NAMESPACE, RecipeRecord, RecipeResult, TAG_MARKER};
use std::collections::BTreeMap;

// ===========================================================================
// Ingredient constructors
// ===========================================================================

/// A namespaced ingredient as it appears in data files. `#planks` becomes
/// `#minecraft:planks`.
pub fn ingredient(name: &str) -> Ingredient {
    match name.strip_prefix(TAG_MARKER) {
        Some(tag) => Ingredient::Id(format!("{TAG_MARKER}{NAMESPACE}{tag}")),
        None => Ingredient::Id(format!("{NAMESPACE}{name}")),
    }
}

fn result(count: i64) -> RecipeResult {
    RecipeResult { id: None, count }
}

// ===========================================================================
// Record constructors
// ===========================================================================

pub fn shaped(pattern: &[&str], key: &[(&str, &str)], count: i64) -> RecipeRecord {
    RecipeRecord::Shaped {
        group: None,
        pattern: pattern.iter().map(|row| row.to_string()).collect(),
        key: key
            .iter()
            .map(|(symbol, name)| (symbol.to_string(), ingredient(name)))
            .collect(),
        result: result(count),
    }
}

pub fn shapeless(ingredients: &[&str], count: i64) -> RecipeRecord {
    RecipeRecord::Shapeless {
        group: None,
        ingredients: ingredients.iter().map(|name| ingredient(name)).collect(),
        result: result(count),
    }
}

pub fn smelting(input: &str) -> RecipeRecord {
    RecipeRecord::Smelting {
        ingredient: ingredient(input),
    }
}

pub fn smithing(base: &str, addition: &str, template: &str) -> RecipeRecord {
    RecipeRecord::SmithingTransform {
        base: ingredient(base),
        addition: ingredient(addition),
        template: ingredient(template),
    }
}

pub fn transmute(input: &str, material: &str) -> RecipeRecord {
    RecipeRecord::Transmute {
        input: Some(ingredient(input)),
        material: ingredient(material),
    }
}

/// A wool-group shapeless record: colorant first, then the wool it dyes.
pub fn wool_dye(dye: &str) -> RecipeRecord {
    RecipeRecord::Shapeless {
        group: Some("wool".to_string()),
        ingredients: vec![
            ingredient(dye),
            Ingredient::AnyOf(vec![ingredient("black_wool"), ingredient("blue_wool")]),
        ],
        result: result(1),
    }
}

/// Key records by name, the way the data loader hands them over.
pub fn records<'a>(
    items: impl IntoIterator<Item = (&'a str, RecipeRecord)>,
) -> BTreeMap<String, RecipeRecord> {
    items
        .into_iter()
        .map(|(name, record)| (name.to_string(), record))
        .collect()
}

// ===========================================================================
// Graph helpers
// ===========================================================================

pub fn recipe_map(count: f64, ingredients: &[(&str, f64)]) -> IngredientMap {
    let mut map = IngredientMap::new(count);
    for (name, occurrences) in ingredients {
        map.add_n(*name, *occurrences);
    }
    map
}

/// Build a graph straight from `(product, batch size, ingredients)` rows,
/// skipping record parsing.
pub fn graph_of(rows: &[(&str, f64, &[(&str, f64)])]) -> CraftGraph {
    let mut graph = CraftGraph::new();
    for (product, count, ingredients) in rows {
        graph.add_recipe(product, &recipe_map(*count, ingredients));
    }
    graph
}

/// A layered synthetic recipe book: `width` raw materials feeding `depth`
/// tiers of `width` products each. Used by benchmarks and property tests.
pub fn layered_records(width: usize, depth: usize) -> BTreeMap<String, RecipeRecord> {
    let mut out = BTreeMap::new();
    for tier in 1..=depth {
        for slot in 0..width {
            let a = format!("tier{}_item{}", tier - 1, slot);
            let b = format!("tier{}_item{}", tier - 1, (slot + 1) % width);
            let record = shaped(&["AB", "BA"], &[("A", a.as_str()), ("B", b.as_str())], (slot % 4 + 1) as i64);
            out.insert(format!("tier{tier}_item{slot}"), record);
        }
    }
    out
}
