//! Table assembly: resolve every catalog item and block into one sorted,
//! deterministic raw-materials table.
//!
//! The graph is built single-threaded and frozen. Item and block resolution
//! then fans out across a rayon pool (feature `parallel`, on by default);
//! every worker owns its own worklist and totals and only reads the graph.

use crate::axiom::{self, AxiomError};
use crate::compile::{self, CompileReport};
use crate::graph::CraftGraph;
use crate::recipe::RecipeRecord;
use crate::resolver::{self, RawMaterialEntry, ResolveError, Resolver, Totals};
use crate::rules::{ConfigError, RuleSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Run-level failures. Per-item failures never surface here; they are listed
/// in the [`AssemblyReport`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Axiom(#[from] AxiomError),
    #[error("deadline passed after resolving {resolved} of {total} catalog entries")]
    DeadlineExceeded { resolved: usize, total: usize },
}

// ---------------------------------------------------------------------------
// Catalog and table
// ---------------------------------------------------------------------------

/// Every name the table must cover. Blocks are a superset of items; names
/// are kept sorted and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<String>,
    blocks: Vec<String>,
}

impl Catalog {
    pub fn new(
        items: impl IntoIterator<Item = impl Into<String>>,
        blocks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let items: BTreeSet<String> = items.into_iter().map(Into::into).collect();
        let blocks: BTreeSet<String> = blocks.into_iter().map(Into::into).collect();
        Self {
            items: items.into_iter().collect(),
            blocks: blocks.into_iter().collect(),
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn blocks(&self) -> &[String] {
        &self.blocks
    }

    /// Blocks that are not also items, in name order.
    pub fn block_only(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .iter()
            .filter(|block| self.items.binary_search(block).is_err())
            .map(String::as_str)
    }
}

/// Name to sorted raw-material list. Serializes as a plain JSON object with
/// keys in name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMaterialsTable {
    entries: BTreeMap<String, Vec<RawMaterialEntry>>,
}

impl RawMaterialsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entries: Vec<RawMaterialEntry>) {
        self.entries.insert(name.into(), entries);
    }

    pub fn get(&self, name: &str) -> Option<&[RawMaterialEntry]> {
        self.entries.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawMaterialEntry])> {
        self.entries
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    IgnoredBlock,
    Resolve(ResolveError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IgnoredBlock => f.write_str("technical block"),
            SkipReason::Resolve(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Catalog items plus block-only names.
    pub total: usize,
    pub resolved: usize,
    pub skipped: Vec<SkippedEntry>,
    /// Present when the table was built from recipe records.
    pub compile: Option<CompileReport>,
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resolved {} of {} catalog items, {} skipped",
            self.resolved,
            self.total,
            self.skipped.len()
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Overrides [`RuleSet::max_depth`].
    pub max_depth: Option<usize>,
    /// Abort the run once this instant passes.
    pub deadline: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct Assembly {
    pub table: RawMaterialsTable,
    pub report: AssemblyReport,
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Compile `records`, build the graph and assemble the table.
pub fn build_table(
    records: &BTreeMap<String, RecipeRecord>,
    catalog: &Catalog,
    rules: &RuleSet,
    options: &AssembleOptions,
) -> Result<Assembly, TableError> {
    rules.validate()?;
    let (book, compile_report) = compile::compile_recipes(records, rules);
    let graph = book.to_graph();
    let mut assembly = assemble_table(&graph, catalog, rules, options)?;
    assembly.report.compile = Some(compile_report);
    Ok(assembly)
}

/// Resolve every catalog item, then every block that is not an item.
pub fn assemble_table(
    graph: &CraftGraph,
    catalog: &Catalog,
    rules: &RuleSet,
    options: &AssembleOptions,
) -> Result<Assembly, TableError> {
    rules.validate()?;
    axiom::validate_axioms(graph, &rules.axioms)?;

    let mut resolver = Resolver::new(graph, rules).with_deadline(options.deadline);
    if let Some(depth) = options.max_depth {
        resolver = resolver.with_max_depth(depth);
    }

    let blocks: Vec<&str> = catalog.block_only().collect();
    let mut report = AssemblyReport {
        total: catalog.items().len() + blocks.len(),
        ..AssemblyReport::default()
    };
    let mut table = RawMaterialsTable::new();

    let items: Vec<&str> = catalog.items().iter().map(String::as_str).collect();
    let item_results = fan_out(&items, |item| {
        resolver.resolve(item).map_err(SkipReason::Resolve)
    });
    let block_results = fan_out(&blocks, |block| resolve_block(&resolver, rules, block));

    let results = items
        .iter()
        .zip(item_results)
        .chain(blocks.iter().zip(block_results));
    for (name, result) in results {
        match result {
            Ok(entries) => {
                table.insert(*name, entries);
                report.resolved += 1;
            }
            Err(SkipReason::Resolve(ResolveError::DeadlineExceeded { .. })) => {
                return Err(TableError::DeadlineExceeded {
                    resolved: report.resolved,
                    total: report.total,
                });
            }
            Err(reason) => {
                warn!(name = *name, %reason, "catalog entry skipped");
                report.skipped.push(SkippedEntry {
                    name: name.to_string(),
                    reason,
                });
            }
        }
    }

    apply_legacy_aliases(&mut table, rules);
    info!("{report}");
    Ok(Assembly { table, report })
}

fn resolve_block(
    resolver: &Resolver<'_>,
    rules: &RuleSet,
    block: &str,
) -> Result<Vec<RawMaterialEntry>, SkipReason> {
    if rules.ignored_blocks.contains(block) {
        return Err(SkipReason::IgnoredBlock);
    }
    let mut totals = Totals::new();
    for part in rules.blocks.decompose(block) {
        resolver
            .resolve_into(&part, 1.0, &mut totals)
            .map_err(SkipReason::Resolve)?;
    }
    Ok(resolver::sorted_entries(totals))
}

fn fan_out<T, F>(names: &[&str], resolve: F) -> Vec<Result<T, SkipReason>>
where
    T: Send,
    F: Fn(&str) -> Result<T, SkipReason> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        names.par_iter().map(|name| resolve(*name)).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        names.iter().map(|name| resolve(*name)).collect()
    }
}

fn apply_legacy_aliases(table: &mut RawMaterialsTable, rules: &RuleSet) {
    for alias in &rules.legacy_aliases {
        if table.contains(&alias.legacy) {
            continue;
        }
        if let Some(entries) = table.get(&alias.current) {
            let entries = entries.to_vec();
            table.insert(alias.legacy.as_str(), entries);
        }
    }
}
