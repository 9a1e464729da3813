//! Recipe book compilation: records in, one ingredient map per product out.
//!
//! Runs single-threaded over the whole record set before any graph query,
//! since priority overwrites decide which recipe a product ends up with.

use crate::extract::{self, IngredientMap, RecipeError};
use crate::graph::CraftGraph;
use crate::recipe::{CraftType, RecipeRecord};
use crate::rules::RuleSet;
use crate::tags::TagError;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Errors and reporting
// ---------------------------------------------------------------------------

/// Why a single record was dropped. Never fatal to the pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error(transparent)]
    Recipe(#[from] RecipeError),
    #[error(transparent)]
    Tag(#[from] TagError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    pub record: String,
    pub error: RecordError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileReport {
    pub records: usize,
    pub extracted: usize,
    pub ignored: usize,
    pub unsupported: usize,
    pub overwritten: usize,
    pub rejected: Vec<RejectedRecord>,
}

// ---------------------------------------------------------------------------
// RecipeBook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRecipe {
    /// Declared type of the record that won the product.
    pub craft_type: CraftType,
    pub ingredients: IngredientMap,
}

/// One recipe per product, keyed and iterated by product name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeBook {
    recipes: BTreeMap<String, CompiledRecipe>,
}

impl RecipeBook {
    pub fn get(&self, product: &str) -> Option<&CompiledRecipe> {
        self.recipes.get(product)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CompiledRecipe)> {
        self.recipes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_graph(&self) -> CraftGraph {
        let graph = CraftGraph::build(
            self.recipes
                .iter()
                .map(|(product, recipe)| (product, &recipe.ingredients)),
        );
        info!(
            materials = graph.node_count(),
            edges = graph.edge_count(),
            "craft graph built"
        );
        graph
    }
}

// ---------------------------------------------------------------------------
// Compilation
// ---------------------------------------------------------------------------

/// Compile every record, in record-name order.
///
/// The first record to produce a product claims it. A later record replaces
/// it only when its declared craft type is a priority type and the product
/// is not exempt.
pub fn compile_recipes(
    records: &BTreeMap<String, RecipeRecord>,
    rules: &RuleSet,
) -> (RecipeBook, CompileReport) {
    let mut book = RecipeBook::default();
    let mut report = CompileReport {
        records: records.len(),
        ..CompileReport::default()
    };

    for (record_name, record) in records {
        if rules.records.is_ignored(record_name) {
            debug!(record = %record_name, "record ignored");
            report.ignored += 1;
            continue;
        }

        let (craft_type, ingredients) = match compile_record(record, rules) {
            Ok(Some(compiled)) => compiled,
            Ok(None) => {
                report.unsupported += 1;
                continue;
            }
            Err(error) => {
                warn!(record = %record_name, %error, "recipe record dropped");
                report.rejected.push(RejectedRecord {
                    record: record_name.clone(),
                    error,
                });
                continue;
            }
        };
        report.extracted += 1;

        let product = rules.records.product_name(record_name);
        let compiled = CompiledRecipe {
            craft_type,
            ingredients,
        };
        match book.recipes.entry(product.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(compiled);
            }
            Entry::Occupied(mut slot) if rules.priority.may_overwrite(product, craft_type) => {
                debug!(
                    product,
                    record = %record_name,
                    replaced = %slot.get().craft_type,
                    by = %craft_type,
                    "priority recipe overwrites"
                );
                slot.insert(compiled);
                report.overwritten += 1;
            }
            Entry::Occupied(_) => {
                debug!(product, record = %record_name, "recipe kept; record is not a priority type");
            }
        }
    }

    info!(
        records = report.records,
        products = book.len(),
        rejected = report.rejected.len(),
        "recipe book compiled"
    );
    (book, report)
}

fn compile_record(
    record: &RecipeRecord,
    rules: &RuleSet,
) -> Result<Option<(CraftType, IngredientMap)>, RecordError> {
    let Some(craft_type) = record.craft_type() else {
        return Ok(None);
    };
    let Some(map) = extract::extract(record, rules)? else {
        return Ok(None);
    };
    Ok(Some((craft_type, map.resolve_tags(&rules.tags)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn first_record_claims_product() {
        let records = records([
            ("torch", shaped(&["X", "#"], &[("X", "coal"), ("#", "stick")], 4)),
            ("torch_from_charcoal", smelting("charcoal")),
        ]);
        let (book, report) = compile_recipes(&records, &RuleSet::standard());
        let torch = book.get("torch").unwrap();
        assert_eq!(torch.craft_type, CraftType::CraftingShaped);
        assert_eq!(torch.ingredients.get("coal"), Some(1.0));
        assert_eq!(report.extracted, 2);
        assert_eq!(report.overwritten, 0);
    }

    #[test]
    fn priority_record_overwrites_smelting() {
        let records = records([
            ("glass", smelting("sand")),
            ("glass_from_crafting", shapeless(&["quartz", "quartz"], 1)),
        ]);
        let (book, report) = compile_recipes(&records, &RuleSet::standard());
        let glass = book.get("glass").unwrap();
        assert_eq!(glass.ingredients.get("sand"), None);
        assert_eq!(glass.ingredients.get("quartz"), Some(2.0));
        assert_eq!(report.overwritten, 1);
    }

    #[test]
    fn exempt_product_keeps_first_recipe() {
        let records = records([
            ("stick", shaped(&["#", "#"], &[("#", "#planks")], 4)),
            ("stick_from_bamboo_item", shaped(&["#", "#"], &[("#", "bamboo")], 1)),
        ]);
        let (book, _) = compile_recipes(&records, &RuleSet::standard());
        let stick = book.get("stick").unwrap();
        assert_eq!(stick.ingredients.get("oak_planks"), Some(2.0));
        assert_eq!(stick.ingredients.get("bamboo"), None);
    }

    #[test]
    fn ignored_and_unsupported_records_are_counted() {
        let records = records([
            ("dye_red_bed", shapeless(&["white_bed", "red_dye"], 1)),
            ("book_cloning", RecipeRecord::Unsupported),
            ("stick", shaped(&["#", "#"], &[("#", "#planks")], 4)),
        ]);
        let (book, report) = compile_recipes(&records, &RuleSet::standard());
        assert_eq!(report.ignored, 1);
        assert_eq!(report.unsupported, 1);
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn bad_records_are_rejected_not_fatal() {
        let records = records([
            ("mystery", shapeless(&["#mystery_group"], 1)),
            ("broken", shaped(&["XY"], &[("X", "coal")], 1)),
            ("stick", shaped(&["#", "#"], &[("#", "#planks")], 4)),
        ]);
        let (book, report) = compile_recipes(&records, &RuleSet::standard());
        assert_eq!(book.len(), 1);
        assert_eq!(report.rejected.len(), 2);
        assert!(report.rejected.iter().any(|r| r.record == "mystery"
            && matches!(r.error, RecordError::Tag(TagError::UnknownTagGroup(_)))));
        assert!(report.rejected.iter().any(|r| r.record == "broken"
            && matches!(r.error, RecordError::Recipe(_))));
    }

    #[test]
    fn wool_dye_record_compiles_under_product_name() {
        let records = records([("dye_blue_wool", wool_dye("blue_dye"))]);
        let (book, _) = compile_recipes(&records, &RuleSet::standard());
        let wool = book.get("blue_wool").unwrap();
        assert_eq!(wool.ingredients.get("white_wool"), Some(1.0));
        assert_eq!(wool.ingredients.get("blue_dye"), Some(1.0));
    }

    #[test]
    fn book_builds_graph() {
        let records = records([("torch", shaped(&["X", "#"], &[("X", "coal"), ("#", "stick")], 4))]);
        let (book, _) = compile_recipes(&records, &RuleSet::standard());
        let graph = book.to_graph();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }
}
