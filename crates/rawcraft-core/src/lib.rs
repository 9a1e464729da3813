//! Rawcraft Core -- raw-material cost tables for a crafting game's recipe book.
//!
//! Given every recipe record and the item and block catalogs, this crate
//! computes, for each catalog name, the fractional quantities of raw
//! materials needed to produce one unit of it.
//!
//! # Pipeline
//!
//! 1. **Extract** -- each recipe record becomes an ingredient map plus a batch
//!    size ([`extract`]). Tag-group references are replaced by their
//!    representative material ([`tags`]).
//! 2. **Compile** -- records collapse onto product names; priority craft
//!    types may overwrite earlier recipes ([`compile`]).
//! 3. **Graph** -- ingredient-to-product edges weighted by consumption per
//!    unit of product ([`graph`]).
//! 4. **Resolve** -- each target is expanded into raw materials, stopping at
//!    axioms and leaves and applying special cases ([`resolver`]).
//! 5. **Assemble** -- items and decomposed blocks are resolved in parallel
//!    into one sorted table ([`table`], [`decompose`]).
//!
//! All domain exceptions are data in an immutable [`rules::RuleSet`], passed
//! by reference through every step.
//!
//! # Key Types
//!
//! - [`rules::RuleSet`] -- Tag table, axiom patterns, priority, rewrites,
//!   special cases, block rules. [`rules::RuleSet::standard`] is built in.
//! - [`graph::CraftGraph`] -- Read-only weighted craft graph.
//! - [`resolver::Resolver`] -- Worklist resolver with a depth guard.
//! - [`table::RawMaterialsTable`] -- The final name-to-materials table.
//! - [`bill::BillOfMaterials`] -- Rounded totals for a shopping list.

pub mod axiom;
pub mod bill;
pub mod compile;
pub mod decompose;
pub mod extract;
pub mod graph;
pub mod id;
pub mod normalize;
pub mod recipe;
pub mod resolver;
pub mod rules;
pub mod special;
pub mod table;
pub mod tags;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
