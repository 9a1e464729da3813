//! Blocks without an item of the same name.
//!
//! A placed block is mapped to the item (or items) a player would spend to
//! place it. Pure name transform; costs come from the resolver.

use crate::normalize::{self, NameRewrite};
use serde::{Deserialize, Serialize};

/// One block that stands for more than one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSplit {
    /// A block whose name contains every marker is the listed items together
    /// (a candle on a cake).
    Composite {
        contains: Vec<String>,
        into: Vec<String>,
    },
    /// `{content}_{container}` is the empty container plus the content's
    /// own carrier (`{content}{content_suffix}`).
    FilledContainer {
        container: String,
        contents: Vec<String>,
        content_suffix: String,
    },
}

impl BlockSplit {
    fn split(&self, name: &str) -> Option<Vec<String>> {
        match self {
            BlockSplit::Composite { contains, into } => contains
                .iter()
                .all(|marker| name.contains(marker.as_str()))
                .then(|| into.clone()),
            BlockSplit::FilledContainer {
                container,
                contents,
                content_suffix,
            } => contents.iter().find_map(|content| {
                name.starts_with(&format!("{content}_{container}")).then(|| {
                    vec![container.clone(), format!("{content}{content_suffix}")]
                })
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecomposeRules {
    /// Applied in order to the lowercased block name.
    #[serde(default)]
    pub rewrites: Vec<NameRewrite>,
    #[serde(default)]
    pub splits: Vec<BlockSplit>,
}

impl DecomposeRules {
    /// Map `block` to one or more item names. Always returns at least one
    /// name; a block no rule knows about is its own item.
    pub fn decompose(&self, block: &str) -> Vec<String> {
        let cleaned = block.to_lowercase().replace('"', "");
        let name = normalize::rewrite(&self.rewrites, &cleaned);
        self.splits
            .iter()
            .find_map(|split| split.split(&name))
            .unwrap_or_else(|| vec![name.into_owned()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> DecomposeRules {
        crate::rules::RuleSet::standard().blocks
    }

    #[test]
    fn wall_variants_become_their_item() {
        assert_eq!(rules().decompose("wall_torch"), vec!["torch"]);
        assert_eq!(rules().decompose("oak_wall_sign"), vec!["oak_sign"]);
        assert_eq!(rules().decompose("potted_fern"), vec!["fern"]);
        assert_eq!(rules().decompose("attached_melon_stem"), vec!["melon_seeds"]);
    }

    #[test]
    fn render_states_use_their_item() {
        assert_eq!(rules().decompose("redstone_wire"), vec!["redstone"]);
        assert_eq!(rules().decompose("carrots"), vec!["carrot"]);
        assert_eq!(rules().decompose("weeping_vines_plant"), vec!["weeping_vines"]);
    }

    #[test]
    fn candle_cake_splits() {
        assert_eq!(rules().decompose("red_candle_cake"), vec!["candle", "cake"]);
    }

    #[test]
    fn filled_cauldron_splits() {
        assert_eq!(
            rules().decompose("powder_snow_cauldron"),
            vec!["cauldron", "powder_snow_bucket"]
        );
        assert_eq!(rules().decompose("lava_cauldron"), vec!["cauldron", "lava_bucket"]);
        assert_eq!(rules().decompose("cauldron"), vec!["cauldron"]);
    }

    #[test]
    fn quoted_and_uppercase_names_are_cleaned() {
        assert_eq!(rules().decompose("\"Stone\""), vec!["stone"]);
    }

    #[test]
    fn empty_rules_pass_through() {
        assert_eq!(DecomposeRules::default().decompose("wall_torch"), vec!["wall_torch"]);
    }
}
