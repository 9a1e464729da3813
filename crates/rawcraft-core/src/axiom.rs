//! Semi-raw material classification.
//!
//! Some materials have recipes in the data files (ingots from blocks, dyes
//! from flowers) but count as raw for anyone planning a build. The rules here
//! are a plain membership test plus a handful of prefix and suffix checks.

use crate::graph::CraftGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AxiomError {
    #[error("axiom '{material}' does not match the recipe data: {detail}")]
    UnresolvedAxiomPattern { material: String, detail: String },
}

/// A name prefix that marks a material as raw, unless the name also ends with
/// `unless_suffix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixRule {
    pub prefix: String,
    #[serde(default)]
    pub unless_suffix: Option<String>,
}

impl PrefixRule {
    fn matches(&self, name: &str) -> bool {
        name.starts_with(&self.prefix)
            && !self
                .unless_suffix
                .as_deref()
                .is_some_and(|suffix| name.ends_with(suffix))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxiomRules {
    /// Names that are raw as-is.
    #[serde(default)]
    pub exact: BTreeSet<String>,
    /// Suffixes that make a name raw. At least one character must precede
    /// the suffix, so a bare `dye` is not matched by `dye`.
    #[serde(default)]
    pub suffixes: Vec<String>,
    #[serde(default)]
    pub prefixes: Vec<PrefixRule>,
    /// Suffix identifying smithing templates, which get the co-ingredient
    /// walk during resolution.
    #[serde(default)]
    pub template_suffix: String,
}

impl AxiomRules {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.suffixes.is_empty() && self.prefixes.is_empty()
    }

    pub fn is_axiom(&self, name: &str) -> bool {
        self.exact.contains(name)
            || self
                .suffixes
                .iter()
                .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix.as_str()))
            || self.prefixes.iter().any(|rule| rule.matches(name))
    }

    /// Template axioms are terminal but still contribute their co-ingredients.
    pub fn is_template(&self, name: &str) -> bool {
        !self.template_suffix.is_empty()
            && name.ends_with(self.template_suffix.as_str())
            && self.is_axiom(name)
    }
}

/// Check that every template axiom in the graph has the recipe shape the
/// co-ingredient walk assumes: either no recipe at all, or a recipe that
/// consumes one of the template itself.
///
/// A mismatch means the rule tables are out of date with the recipe data.
pub fn validate_axioms(graph: &CraftGraph, rules: &AxiomRules) -> Result<(), AxiomError> {
    for (id, name) in graph.materials() {
        if !rules.is_template(name) {
            continue;
        }
        if !graph.predecessors(id).is_empty() && !graph.is_self_duplicating(id) {
            return Err(AxiomError::UnresolvedAxiomPattern {
                material: name.to_string(),
                detail: "template has a recipe that does not consume a template".to_string(),
            });
        }
    }
    Ok(())
}
