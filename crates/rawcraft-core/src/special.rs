//! Hand-authored expansions that replace the generic recipe walk for a few
//! named materials.
//!
//! Cases are evaluated in list order and the first match owns the material.
//! Adding an exception means adding an entry, never touching the resolver.

use serde::{Deserialize, Serialize};

/// `factor` units of `item` per unit of the intercepted material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub item: String,
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecialCase {
    /// `item` costs exactly the listed portions.
    Expand { item: String, into: Vec<Portion> },
    /// A cosmetic modifier: the material costs the same as its unmodified
    /// base name.
    StripPrefix { prefixes: Vec<String> },
}

impl SpecialCase {
    /// The replacement portions for `name`, or `None` when this case does not
    /// apply.
    pub fn expand(&self, name: &str) -> Option<Vec<Portion>> {
        match self {
            SpecialCase::Expand { item, into } if item == name => Some(into.clone()),
            SpecialCase::Expand { .. } => None,
            SpecialCase::StripPrefix { prefixes } => prefixes.iter().find_map(|prefix| {
                name.strip_prefix(prefix.as_str())
                    .filter(|base| !base.is_empty())
                    .map(|base| {
                        vec![Portion {
                            item: base.to_string(),
                            factor: 1.0,
                        }]
                    })
            }),
        }
    }
}

/// The first matching case's expansion.
pub fn intercept(cases: &[SpecialCase], name: &str) -> Option<Vec<Portion>> {
    cases.iter().find_map(|case| case.expand(name))
}
