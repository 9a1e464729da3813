//! The immutable rule set every pass reads.
//!
//! All domain exceptions live here as data: tag representatives, axiom
//! patterns, recipe priority, name rewrites, special cases, block
//! decomposition. A rule set is loaded once (or taken from
//! [`RuleSet::standard`]), validated, and then passed by reference into the
//! compiler, resolver and assembler.

use crate::axiom::{AxiomRules, PrefixRule};
use crate::bill::{Condensable, CondenseRules};
use crate::decompose::{BlockSplit, DecomposeRules};
use crate::normalize::{DisplayNames, NameRewrite, Replacement};
use crate::recipe::CraftType;
use crate::special::{Portion, SpecialCase};
use crate::tags::TagTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_MAX_DEPTH: usize = 64;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("required rule table '{0}' is missing or empty")]
    MissingTable(&'static str),
    #[error("invalid rule '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// Rule groups
// ---------------------------------------------------------------------------

/// Which recipes may replace an already-compiled recipe for the same product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRules {
    #[serde(default)]
    pub craft_types: BTreeSet<CraftType>,
    /// Products that keep their first recipe no matter what.
    #[serde(default)]
    pub exempt: BTreeSet<String>,
}

impl PriorityRules {
    pub fn may_overwrite(&self, product: &str, craft_type: CraftType) -> bool {
        self.craft_types.contains(&craft_type) && !self.exempt.contains(product)
    }
}

/// Ignore records whose name starts with `prefix` and ends with any of
/// `suffixes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreRule {
    pub prefix: String,
    pub suffixes: Vec<String>,
}

/// How a recipe file name becomes a product name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRules {
    #[serde(default)]
    pub ignored: Vec<IgnoreRule>,
    /// Everything from the first occurrence of this marker on names an
    /// alternate method (`torch_from_charcoal`).
    #[serde(default)]
    pub variant_marker: String,
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    #[serde(default)]
    pub strip_suffixes: Vec<String>,
}

impl RecordRules {
    pub fn is_ignored(&self, record_name: &str) -> bool {
        self.ignored.iter().any(|rule| {
            record_name.starts_with(&rule.prefix)
                && rule
                    .suffixes
                    .iter()
                    .any(|suffix| record_name.len() > rule.prefix.len() + suffix.len()
                        && record_name.ends_with(suffix.as_str()))
        })
    }

    /// The product a record name stands for.
    pub fn product_name<'a>(&self, record_name: &'a str) -> &'a str {
        let mut name = if self.variant_marker.is_empty() {
            record_name
        } else {
            record_name
                .split_once(self.variant_marker.as_str())
                .map_or(record_name, |(head, _)| head)
        };
        for prefix in &self.strip_prefixes {
            name = name.strip_prefix(prefix.as_str()).unwrap_or(name);
        }
        for suffix in &self.strip_suffixes {
            name = name.strip_suffix(suffix.as_str()).unwrap_or(name);
        }
        name
    }
}

/// Settings for the wool-dye record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WoolRules {
    pub group: String,
    pub default_wool: String,
    pub default_dye: String,
}

impl Default for WoolRules {
    fn default() -> Self {
        Self {
            group: "wool".to_string(),
            default_wool: "white_wool".to_string(),
            default_dye: "white_dye".to_string(),
        }
    }
}

/// Expose `current`'s entry under `legacy` too, unless the table already
/// has `legacy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyAlias {
    pub current: String,
    pub legacy: String,
}

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub tags: TagTable,
    pub axioms: AxiomRules,
    #[serde(default)]
    pub priority: PriorityRules,
    #[serde(default)]
    pub records: RecordRules,
    /// Applied to every resolution target before graph lookup.
    #[serde(default)]
    pub rewrites: Vec<NameRewrite>,
    #[serde(default)]
    pub special_cases: Vec<SpecialCase>,
    #[serde(default)]
    pub blocks: DecomposeRules,
    #[serde(default)]
    pub ignored_blocks: BTreeSet<String>,
    #[serde(default)]
    pub legacy_aliases: Vec<LegacyAlias>,
    /// Container assumed by transmute records that do not name their input.
    #[serde(default = "default_transmute_base")]
    pub transmute_base: String,
    #[serde(default)]
    pub wool: WoolRules,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Display-name cleanup for material lists exported from schematic tools.
    #[serde(default)]
    pub display_names: DisplayNames,
    /// Storage blocks used when a bill is reported in blocks.
    #[serde(default)]
    pub condense: CondenseRules,
}

fn default_transmute_base() -> String {
    "shulker_box".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl RuleSet {
    /// Check that the tables every pass depends on are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tags.is_empty() {
            return Err(ConfigError::MissingTable("tags"));
        }
        if self.axioms.is_empty() {
            return Err(ConfigError::MissingTable("axioms"));
        }
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_depth",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.transmute_base.is_empty() {
            return Err(ConfigError::Invalid {
                field: "transmute_base",
                reason: "must name a material".to_string(),
            });
        }
        Ok(())
    }

    /// The built-in rule set for the current game release.
    pub fn standard() -> Self {
        Self {
            tags: standard_tags(),
            axioms: standard_axioms(),
            priority: PriorityRules {
                craft_types: [
                    CraftType::CraftingShaped,
                    CraftType::CraftingShapeless,
                    CraftType::SmithingTransform,
                ]
                .into_iter()
                .collect(),
                // The planks stick recipe stays; the bamboo variant must not
                // replace it.
                exempt: strings(["stick"]),
            },
            records: RecordRules {
                ignored: vec![IgnoreRule {
                    prefix: "dye_".to_string(),
                    suffixes: vec!["_bed".to_string(), "_carpet".to_string()],
                }],
                variant_marker: "_from".to_string(),
                strip_prefixes: vec!["dye_".to_string()],
                strip_suffixes: vec!["_smithing".to_string()],
            },
            rewrites: vec![
                NameRewrite::Alias {
                    map: pairs([("chipped_anvil", "anvil"), ("damaged_anvil", "anvil")]),
                },
                NameRewrite::ExtendSuffix {
                    suffix: "_concrete".to_string(),
                    append: "_powder".to_string(),
                },
                NameRewrite::RemoveSegments {
                    segments: vec![
                        "exposed_".to_string(),
                        "weathered_".to_string(),
                        "oxidized_".to_string(),
                    ],
                },
                NameRewrite::Alias {
                    map: pairs([
                        ("copper", "copper_block"),
                        ("waxed_copper", "waxed_copper_block"),
                    ]),
                },
            ],
            special_cases: vec![
                SpecialCase::Expand {
                    item: "netherite_ingot".to_string(),
                    into: vec![
                        Portion {
                            item: "netherite_scrap".to_string(),
                            factor: 4.0,
                        },
                        Portion {
                            item: "gold_ingot".to_string(),
                            factor: 4.0,
                        },
                    ],
                },
                SpecialCase::Expand {
                    item: "sugar".to_string(),
                    into: vec![Portion {
                        item: "sugar_cane".to_string(),
                        factor: 1.0,
                    }],
                },
                SpecialCase::StripPrefix {
                    prefixes: vec!["stripped_".to_string(), "carved_".to_string()],
                },
            ],
            blocks: standard_blocks(),
            ignored_blocks: strings([
                "air",
                "void_air",
                "cave_air",
                "fire",
                "soul_fire",
                "nether_portal",
                "end_portal",
                "piston_head",
            ]),
            legacy_aliases: vec![LegacyAlias {
                current: "iron_chain".to_string(),
                legacy: "chain".to_string(),
            }],
            transmute_base: default_transmute_base(),
            wool: WoolRules::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            display_names: standard_display_names(),
            condense: standard_condense(),
        }
    }
}

fn strings<const N: usize>(items: [&str; N]) -> BTreeSet<String> {
    items.into_iter().map(str::to_string).collect()
}

fn pairs<const N: usize>(items: [(&str, &str); N]) -> BTreeMap<String, String> {
    items
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn standard_display_names() -> DisplayNames {
    DisplayNames {
        numbered_prefixes: vec!["music_disc_".to_string(), "disc_fragment_".to_string()],
        replacements: [("chiselled_", "chiseled_"), ("grey", "gray"), ("dised", "dized")]
            .into_iter()
            .map(|(from, to)| Replacement {
                from: from.to_string(),
                to: to.to_string(),
            })
            .collect(),
        block_of_prefix: "block_of_".to_string(),
        block_suffix: "_block".to_string(),
        aliases: pairs([
            ("redstone_comparator", "comparator"),
            ("redstone_repeater", "repeater"),
            ("redstone_dust", "redstone"),
            ("lapis_lazuli_block", "lapis_block"),
            ("deepslate_lapis_lazuli_ore", "deepslate_lapis_ore"),
            ("lapis_lazuli_ore", "lapis_ore"),
            ("smooth_quartz_block", "smooth_quartz"),
            ("jack_o'lantern", "jack_o_lantern"),
            ("vines", "vine"),
            ("hay_bale", "hay_block"),
            ("monster_spawner", "spawner"),
            ("jigsaw_block", "jigsaw"),
            ("scute", "turtle_scute"),
            ("grass", "short_grass"),
            ("compressed_ice", "packed_ice"),
            ("biscuit", "cookie"),
            ("beet_seeds", "beetroot_seeds"),
            ("moon_daisy", "oxeye_daisy"),
            ("watermelon", "melon"),
            ("watermelon_seeds", "melon_seeds"),
            ("ender_dragon_head", "dragon_head"),
        ]),
    }
}

fn standard_condense() -> CondenseRules {
    let extra = [
        ("redstone", "redstone_block", 9),
        ("lapis_lazuli", "lapis_block", 9),
        ("diamond", "diamond_block", 9),
        ("emerald", "emerald_block", 9),
        ("coal", "coal_block", 9),
        ("raw_iron", "raw_iron_block", 9),
        ("raw_gold", "raw_gold_block", 9),
        ("raw_copper", "raw_copper_block", 9),
        ("slime_ball", "slime_block", 9),
        ("quartz", "quartz_block", 4),
    ]
    .into_iter()
    .map(|(material, block, per_block)| {
        (
            material.to_string(),
            Condensable {
                block: block.to_string(),
                per_block,
            },
        )
    })
    .collect();
    CondenseRules {
        suffix: "_ingot".to_string(),
        block_suffix: "_block".to_string(),
        per_block: 9,
        extra,
    }
}

fn standard_tags() -> TagTable {
    [
        ("#logs", "oak_log"),
        ("#logs_that_burn", "oak_log"),
        ("#oak_logs", "oak_log"),
        ("#birch_logs", "birch_log"),
        ("#spruce_logs", "spruce_log"),
        ("#jungle_logs", "jungle_log"),
        ("#acacia_logs", "acacia_log"),
        ("#dark_oak_logs", "dark_oak_log"),
        ("#pale_oak_logs", "pale_oak_log"),
        ("#cherry_logs", "cherry_log"),
        ("#mangrove_logs", "mangrove_log"),
        ("#warped_stems", "warped_stem"),
        ("#crimson_stems", "crimson_stem"),
        ("#bamboo_blocks", "bamboo_block"),
        ("#planks", "oak_planks"),
        ("#wooden_slabs", "oak_slab"),
        ("#wooden_tool_materials", "oak_planks"),
        ("#stone_tool_materials", "cobblestone"),
        ("#iron_tool_materials", "iron_ingot"),
        ("#diamond_tool_materials", "diamond"),
        ("#netherite_tool_materials", "netherite_ingot"),
        ("#gold_tool_materials", "gold_ingot"),
        ("#stone_crafting_materials", "cobblestone"),
        ("#coals", "coal"),
        ("#soul_fire_base_blocks", "soul_sand"),
        ("#smelts_to_glass", "sand"),
        ("#leaves", "oak_leaves"),
        ("#eggs", "egg"),
        ("#wool", "white_wool"),
        ("#shulker_boxes", "shulker_box"),
        ("#bundles", "bundle"),
    ]
    .into_iter()
    .collect()
}

fn standard_axioms() -> AxiomRules {
    AxiomRules {
        exact: strings([
            "stone",
            "cobblestone",
            "slime_ball",
            "redstone",
            "bone_meal",
            "wheat",
            "quartz",
            "resin_clump",
            "coal",
            "diamond",
            "dried_kelp",
            "emerald",
            "honey_bottle",
            "lapis_lazuli",
            "white_wool",
            "leather",
        ]),
        suffixes: vec![
            "_ingot".to_string(),
            "smithing_template".to_string(),
            "dye".to_string(),
        ],
        prefixes: vec![PrefixRule {
            prefix: "raw_".to_string(),
            unless_suffix: Some("_block".to_string()),
        }],
        template_suffix: "_smithing_template".to_string(),
    }
}

fn standard_blocks() -> DecomposeRules {
    DecomposeRules {
        rewrites: vec![
            NameRewrite::RemoveSegments {
                segments: vec![
                    "wall_".to_string(),
                    "attached_".to_string(),
                    "potted_".to_string(),
                ],
            },
            NameRewrite::Alias {
                map: pairs([
                    ("redstone_wire", "redstone"),
                    ("tripwire", "string"),
                    ("carrots", "carrot"),
                    ("potatoes", "potato"),
                    ("cocoa", "cocoa_beans"),
                    ("beetroots", "beetroot"),
                    ("water", "water_bucket"),
                    ("lava", "lava_bucket"),
                    ("powder_snow", "powder_snow_bucket"),
                    ("bubble_column", "water_bucket"),
                    ("pumpkin_stem", "pumpkin_seeds"),
                    ("melon_stem", "melon_seeds"),
                    ("bamboo_sapling", "bamboo"),
                    ("big_dripleaf_stem", "big_dripleaf"),
                    ("small_dripleaf_stem", "small_dripleaf"),
                    ("kelp_plant", "kelp"),
                    ("pitcher_crop", "pitcher_pod"),
                    ("sweet_berry_bush", "sweet_berries"),
                    ("torchflower_crop", "torchflower_seeds"),
                    ("tall_seagrass", "seagrass"),
                    ("azalea_bush", "azalea"),
                    ("flowering_azalea_bush", "flowering_azalea"),
                    ("cave_vines", "vine"),
                    ("cave_vines_plant", "vine"),
                    ("moving_piston", "piston"),
                    ("weeping_vines_plant", "weeping_vines"),
                    ("twisting_vines_plant", "twisting_vines"),
                ]),
            },
        ],
        splits: vec![
            BlockSplit::Composite {
                contains: vec!["candle".to_string(), "cake".to_string()],
                into: vec!["candle".to_string(), "cake".to_string()],
            },
            BlockSplit::FilledContainer {
                container: "cauldron".to_string(),
                contents: vec![
                    "lava".to_string(),
                    "water".to_string(),
                    "powder_snow".to_string(),
                ],
                content_suffix: "_bucket".to_string(),
            },
        ],
    }
}
