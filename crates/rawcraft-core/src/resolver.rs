//! Raw-material resolution.
//!
//! Expands one target into a weighted sum over terminal materials. The walk
//! uses an explicit stack instead of recursion so that a mis-authored rule
//! set fails with [`ResolveError::RecursionLimitExceeded`] and a readable
//! chain rather than overflowing the thread's stack.
//!
//! Order of checks for every material reached:
//!
//! 1. **Special case** -- a hand-authored expansion owns the material.
//! 2. **Axiom** -- semi-raw materials are terminal. Template axioms also
//!    walk their other predecessors.
//! 3. **Leaf** -- no known recipe, so the material is raw.
//! 4. **Expand** -- recurse into each ingredient at `quantity * weight`.

use crate::graph::CraftGraph;
use crate::normalize;
use crate::rules::RuleSet;
use crate::special;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::time::Instant;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One raw material and the fractional quantity needed per unit of target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialEntry {
    pub item: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("recursion limit {limit} exceeded resolving '{target}': {}", chain.join(" -> "))]
    RecursionLimitExceeded {
        target: String,
        limit: usize,
        chain: Vec<String>,
    },
    #[error("deadline passed before '{target}' was resolved")]
    DeadlineExceeded { target: String },
}

/// Running totals keyed by material name.
pub type Totals = BTreeMap<String, f64>;

/// Turn totals into the caller-facing list: quantity descending, then name
/// ascending.
pub fn sorted_entries(totals: Totals) -> Vec<RawMaterialEntry> {
    let mut entries: Vec<RawMaterialEntry> = totals
        .into_iter()
        .map(|(item, quantity)| RawMaterialEntry { item, quantity })
        .collect();
    entries.sort_by(|a, b| {
        b.quantity
            .total_cmp(&a.quantity)
            .then_with(|| a.item.cmp(&b.item))
    });
    entries
}

// ---------------------------------------------------------------------------
// Worklist
// ---------------------------------------------------------------------------

/// A material reached during the walk, remembered so the chain to any node
/// can be reported.
struct Visit<'a> {
    name: Cow<'a, str>,
    parent: Option<usize>,
}

struct Task {
    visit: usize,
    quantity: f64,
    depth: usize,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves targets against one read-only graph. Cheap to construct; share
/// freely between threads.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'g> {
    graph: &'g CraftGraph,
    rules: &'g RuleSet,
    max_depth: usize,
    deadline: Option<Instant>,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g CraftGraph, rules: &'g RuleSet) -> Self {
        Self {
            graph,
            rules,
            max_depth: rules.max_depth,
            deadline: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Refuse to start new targets once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn graph(&self) -> &'g CraftGraph {
        self.graph
    }

    /// Raw materials for one unit of `target`, sorted.
    pub fn resolve(&self, target: &str) -> Result<Vec<RawMaterialEntry>, ResolveError> {
        let mut totals = Totals::new();
        self.resolve_into(target, 1.0, &mut totals)?;
        Ok(sorted_entries(totals))
    }

    /// Add the raw materials for `quantity` units of `target` to `totals`.
    ///
    /// A target that is not in the graph after rewriting counts as raw
    /// itself. Nothing is added when an error is returned.
    pub fn resolve_into(
        &self,
        target: &str,
        quantity: f64,
        totals: &mut Totals,
    ) -> Result<(), ResolveError> {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(ResolveError::DeadlineExceeded {
                target: target.to_string(),
            });
        }

        let target = normalize::rewrite(&self.rules.rewrites, target);
        if !self.graph.contains(&target) {
            *totals.entry(target.into_owned()).or_insert(0.0) += quantity;
            return Ok(());
        }

        let mut found = Totals::new();
        self.walk(target, quantity, &mut found)?;
        for (item, amount) in found {
            *totals.entry(item).or_insert(0.0) += amount;
        }
        Ok(())
    }

    fn walk<'a>(&self, target: Cow<'a, str>, quantity: f64, totals: &mut Totals) -> Result<(), ResolveError>
    where
        'g: 'a,
    {
        let mut visits: Vec<Visit<'a>> = vec![Visit {
            name: target,
            parent: None,
        }];
        let mut stack = vec![Task {
            visit: 0,
            quantity,
            depth: 0,
        }];
        let mut children: Vec<(Cow<'a, str>, f64)> = Vec::new();

        while let Some(task) = stack.pop() {
            if task.depth > self.max_depth {
                return Err(self.limit_exceeded(&visits, task.visit));
            }
            let name = visits[task.visit].name.clone();

            if let Some(portions) = special::intercept(&self.rules.special_cases, &name) {
                children.extend(
                    portions
                        .into_iter()
                        .map(|portion| (Cow::Owned(portion.item), task.quantity * portion.factor)),
                );
            } else if self.rules.axioms.is_axiom(&name) {
                *totals.entry(name.to_string()).or_insert(0.0) += task.quantity;
                if self.rules.axioms.is_template(&name)
                    && let Some(id) = self.graph.id(&name)
                {
                    for edge in self.graph.predecessors(id) {
                        if edge.ingredient == id {
                            continue;
                        }
                        if let Some(ingredient) = self.graph.name(edge.ingredient) {
                            children.push((Cow::Borrowed(ingredient), task.quantity * edge.weight));
                        }
                    }
                }
            } else {
                match self.graph.id(&name) {
                    Some(id) if !self.graph.predecessors(id).is_empty() => {
                        for edge in self.graph.predecessors(id) {
                            if let Some(ingredient) = self.graph.name(edge.ingredient) {
                                children.push((Cow::Borrowed(ingredient), task.quantity * edge.weight));
                            }
                        }
                    }
                    _ => {
                        *totals.entry(name.into_owned()).or_insert(0.0) += task.quantity;
                    }
                }
            }

            // Reversed so the first listed ingredient is walked first.
            for (child, amount) in children.drain(..).rev() {
                stack.push(Task {
                    visit: visits.len(),
                    quantity: amount,
                    depth: task.depth + 1,
                });
                visits.push(Visit {
                    name: child,
                    parent: Some(task.visit),
                });
            }
        }
        Ok(())
    }

    fn limit_exceeded(&self, visits: &[Visit<'_>], at: usize) -> ResolveError {
        let mut chain = Vec::new();
        let mut cursor = Some(at);
        while let Some(index) = cursor {
            chain.push(visits[index].name.to_string());
            cursor = visits[index].parent;
        }
        chain.reverse();
        ResolveError::RecursionLimitExceeded {
            target: chain.first().cloned().unwrap_or_default(),
            limit: self.max_depth,
            chain,
        }
    }
}

/// Resolve a single target with the rule set's depth limit.
pub fn resolve(
    graph: &CraftGraph,
    rules: &RuleSet,
    target: &str,
) -> Result<Vec<RawMaterialEntry>, ResolveError> {
    Resolver::new(graph, rules).resolve(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn entry(item: &str, quantity: f64) -> RawMaterialEntry {
        RawMaterialEntry {
            item: item.to_string(),
            quantity,
        }
    }

    #[test]
    fn torch_scenario() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[("torch", 4.0, &[("coal", 1.0), ("stick", 1.0)])]);
        assert_eq!(
            resolve(&graph, &rules, "torch").unwrap(),
            vec![entry("coal", 0.25), entry("stick", 0.25)]
        );
    }

    #[test]
    fn leaf_resolves_to_itself() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[("torch", 4.0, &[("coal", 1.0), ("stick", 1.0)])]);
        assert_eq!(resolve(&graph, &rules, "stick").unwrap(), vec![entry("stick", 1.0)]);
    }

    #[test]
    fn unknown_target_is_raw() {
        let rules = RuleSet::standard();
        let graph = CraftGraph::new();
        assert_eq!(
            resolve(&graph, &rules, "dragon_egg").unwrap(),
            vec![entry("dragon_egg", 1.0)]
        );
    }

    #[test]
    fn weights_compose_along_a_path() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            ("b_part", 1.0, &[("a_base", 2.0)]),
            ("c_product", 1.0, &[("b_part", 3.0)]),
        ]);
        assert_eq!(
            resolve(&graph, &rules, "c_product").unwrap(),
            vec![entry("a_base", 6.0)]
        );
    }

    #[test]
    fn axiom_stops_expansion() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            ("coal", 9.0, &[("coal_block", 1.0)]),
            ("coal_block", 1.0, &[("coal", 9.0)]),
        ]);
        assert_eq!(resolve(&graph, &rules, "coal").unwrap(), vec![entry("coal", 1.0)]);
        assert_eq!(
            resolve(&graph, &rules, "coal_block").unwrap(),
            vec![entry("coal", 9.0)]
        );
    }

    #[test]
    fn template_walks_co_ingredients_once() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[(
            "coast_armor_trim_smithing_template",
            2.0,
            &[
                ("diamond", 7.0),
                ("coast_armor_trim_smithing_template", 1.0),
                ("cobblestone", 1.0),
            ],
        )]);
        let entries = resolve(&graph, &rules, "coast_armor_trim_smithing_template").unwrap();
        assert_eq!(
            entries,
            vec![
                entry("diamond", 3.5),
                entry("coast_armor_trim_smithing_template", 1.0),
                entry("cobblestone", 0.5),
            ]
        );
    }

    #[test]
    fn special_case_replaces_recipe() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            (
                "netherite_ingot",
                1.0,
                &[("netherite_scrap", 4.0), ("gold_ingot", 4.0)],
            ),
            ("netherite_block", 1.0, &[("netherite_ingot", 9.0)]),
        ]);
        assert_eq!(
            resolve(&graph, &rules, "netherite_block").unwrap(),
            vec![entry("gold_ingot", 36.0), entry("netherite_scrap", 36.0)]
        );
    }

    #[test]
    fn stripped_log_costs_a_log() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            ("oak_planks", 4.0, &[("oak_log", 1.0)]),
            ("oak_hanging_sign", 6.0, &[("stripped_oak_log", 6.0), ("chain", 2.0)]),
        ]);
        assert_eq!(
            resolve(&graph, &rules, "oak_hanging_sign").unwrap(),
            vec![entry("oak_log", 1.0), entry("chain", 2.0 / 6.0)]
        );
    }

    #[test]
    fn target_rewrites_apply_before_lookup() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[(
            "red_concrete_powder",
            8.0,
            &[("red_dye", 1.0), ("sand", 4.0), ("gravel", 4.0)],
        )]);
        assert_eq!(
            resolve(&graph, &rules, "red_concrete").unwrap(),
            vec![
                entry("gravel", 0.5),
                entry("sand", 0.5),
                entry("red_dye", 0.125)
            ]
        );
    }

    #[test]
    fn resolution_is_deterministic() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            ("stick", 4.0, &[("oak_planks", 2.0)]),
            ("oak_planks", 4.0, &[("oak_log", 1.0)]),
            ("ladder", 3.0, &[("stick", 7.0)]),
        ]);
        let first = resolve(&graph, &rules, "ladder").unwrap();
        let second = resolve(&graph, &rules, "ladder").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn depth_limit_reports_chain() {
        let mut rules = RuleSet::standard();
        rules.max_depth = 2;
        let graph = graph_of(&[
            ("b_part", 1.0, &[("a_part", 1.0)]),
            ("c_part", 1.0, &[("b_part", 1.0)]),
            ("d_part", 1.0, &[("c_part", 1.0)]),
            ("e_part", 1.0, &[("d_part", 1.0)]),
        ]);
        let err = resolve(&graph, &rules, "e_part").unwrap_err();
        assert_eq!(
            err,
            ResolveError::RecursionLimitExceeded {
                target: "e_part".into(),
                limit: 2,
                chain: vec![
                    "e_part".into(),
                    "d_part".into(),
                    "c_part".into(),
                    "b_part".into()
                ],
            }
        );
    }

    #[test]
    fn unterminated_cycle_hits_the_limit() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[
            ("left_thing", 1.0, &[("right_thing", 1.0)]),
            ("right_thing", 1.0, &[("left_thing", 1.0)]),
        ]);
        assert!(matches!(
            resolve(&graph, &rules, "left_thing"),
            Err(ResolveError::RecursionLimitExceeded { limit: 64, .. })
        ));
    }

    #[test]
    fn passed_deadline_refuses_work() {
        let rules = RuleSet::standard();
        let graph = CraftGraph::new();
        let resolver = Resolver::new(&graph, &rules).with_deadline(Some(Instant::now()));
        assert!(matches!(
            resolver.resolve("stick"),
            Err(ResolveError::DeadlineExceeded { .. })
        ));
    }

    #[test]
    fn resolve_into_accumulates() {
        let rules = RuleSet::standard();
        let graph = graph_of(&[("torch", 4.0, &[("coal", 1.0), ("stick", 1.0)])]);
        let resolver = Resolver::new(&graph, &rules);
        let mut totals = Totals::new();
        resolver.resolve_into("torch", 1.0, &mut totals).unwrap();
        resolver.resolve_into("coal", 2.0, &mut totals).unwrap();
        assert_eq!(totals["coal"], 2.25);
        assert_eq!(totals["stick"], 0.25);
    }
}
