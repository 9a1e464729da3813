//! Bills of materials: total raw materials for a list of requested items.
//!
//! Resolution keeps fractional quantities; this is the one place they are
//! rounded, and only the final per-material totals are.

use crate::resolver::{self, Totals};
use crate::table::RawMaterialsTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_STACK_SIZE: u64 = 64;
pub const SHULKER_BOX_SLOTS: u64 = 27;

/// Items that cannot go into a shulker box are counted plainly.
const UNBOXABLE_MARKER: &str = "shulker_box";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillError {
    #[error("quantity is empty")]
    EmptyQuantity,
    #[error("invalid quantity '{0}': expected counts like '3', '2s' or '1sb'")]
    InvalidQuantity(String),
}

// ---------------------------------------------------------------------------
// Stack sizes
// ---------------------------------------------------------------------------

/// Items that stack to fewer than 64 (16 or 1). Everything else stacks to
/// [`DEFAULT_STACK_SIZE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackSizes {
    limited: BTreeMap<String, u64>,
}

impl StackSizes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: &str, stack_size: u64) {
        self.limited.insert(item.to_string(), stack_size.max(1));
    }

    pub fn stack_size(&self, item: &str) -> u64 {
        self.limited.get(item).copied().unwrap_or(DEFAULT_STACK_SIZE)
    }
}

impl<'a> FromIterator<(&'a str, u64)> for StackSizes {
    fn from_iter<T: IntoIterator<Item = (&'a str, u64)>>(iter: T) -> Self {
        let mut sizes = StackSizes::new();
        for (item, size) in iter {
            sizes.insert(item, size);
        }
        sizes
    }
}

/// Parse a quantity such as `"3"`, `"2s"`, `"1sb 4s 10"` into units of
/// `item`. `s` is one stack, `sb` a full shulker box of stacks.
pub fn parse_quantity(input: &str, item: &str, sizes: &StackSizes) -> Result<u64, BillError> {
    let stack = sizes.stack_size(item);
    let invalid = || BillError::InvalidQuantity(input.to_string());
    let lower = input.to_ascii_lowercase();
    let mut chars = lower.chars().peekable();
    let mut total: u64 = 0;
    let mut seen = false;

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut number: u64 = 0;
        let mut digits = 0;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            number = number
                .checked_mul(10)
                .and_then(|n| n.checked_add(u64::from(digit)))
                .ok_or_else(invalid)?;
            digits += 1;
            chars.next();
        }
        if digits == 0 {
            return Err(invalid());
        }
        let multiplier = match chars.peek() {
            Some('s') => {
                chars.next();
                if chars.peek() == Some(&'b') {
                    chars.next();
                    stack * SHULKER_BOX_SLOTS
                } else {
                    stack
                }
            }
            _ => 1,
        };
        if chars.peek().is_some_and(|c| !c.is_whitespace() && !c.is_ascii_digit()) {
            return Err(invalid());
        }
        total = number
            .checked_mul(multiplier)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(invalid)?;
        seen = true;
    }

    if seen { Ok(total) } else { Err(BillError::EmptyQuantity) }
}

// ---------------------------------------------------------------------------
// Stack breakdown
// ---------------------------------------------------------------------------

/// A whole-unit quantity split into shulker boxes, stacks and loose items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBreakdown {
    pub quantity: u64,
    pub stack_size: u64,
    pub shulker_boxes: u64,
    pub stacks: u64,
    pub loose: u64,
    /// Counted plainly: shulker boxes cannot be stacked or boxed.
    pub plain: bool,
}

impl StackBreakdown {
    pub fn new(quantity: u64, item: &str, sizes: &StackSizes) -> Self {
        let stack_size = sizes.stack_size(item);
        if item.contains(UNBOXABLE_MARKER) {
            return Self {
                quantity,
                stack_size,
                shulker_boxes: 0,
                stacks: 0,
                loose: quantity,
                plain: true,
            };
        }
        let box_capacity = stack_size * SHULKER_BOX_SLOTS;
        let shulker_boxes = quantity / box_capacity;
        let rest = quantity % box_capacity;
        let (stacks, loose) = if stack_size > 1 {
            (rest / stack_size, rest % stack_size)
        } else {
            (0, rest)
        };
        Self {
            quantity,
            stack_size,
            shulker_boxes,
            stacks,
            loose,
            plain: false,
        }
    }

    /// Compact form used for typed quantities: `2sb 3s 5`.
    pub fn shorthand(&self) -> String {
        if self.plain {
            return self.quantity.to_string();
        }
        let mut parts = Vec::new();
        if self.shulker_boxes > 0 {
            parts.push(format!("{}sb", self.shulker_boxes));
        }
        if self.stacks > 0 {
            parts.push(format!("{}s", self.stacks));
        }
        if self.loose > 0 {
            parts.push(self.loose.to_string());
        }
        if parts.is_empty() {
            "0".to_string()
        } else {
            parts.join(" ")
        }
    }
}

impl fmt::Display for StackBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.quantity)?;
        if self.plain || (self.shulker_boxes == 0 && self.stacks == 0) {
            return Ok(());
        }
        let mut parts = Vec::new();
        if self.shulker_boxes > 0 {
            parts.push(format!("{} SB", self.shulker_boxes));
        }
        match self.stacks {
            0 => {}
            1 => parts.push("1 stack".to_string()),
            n => parts.push(format!("{n} stacks")),
        }
        if self.loose > 0 {
            parts.push(self.loose.to_string());
        }
        write!(f, " ({})", parts.join(" + "))
    }
}

// ---------------------------------------------------------------------------
// Storage-block condensing
// ---------------------------------------------------------------------------

/// A material that packs into a storage block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condensable {
    pub block: String,
    pub per_block: u64,
}

/// Which bill lines may be reported as storage blocks plus a remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CondenseRules {
    /// Materials ending in `suffix` pack into `<stem><block_suffix>`.
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub block_suffix: String,
    #[serde(default = "default_per_block")]
    pub per_block: u64,
    /// Materials outside the suffix rule, each with its own block.
    #[serde(default)]
    pub extra: BTreeMap<String, Condensable>,
}

fn default_per_block() -> u64 {
    9
}

impl Default for CondenseRules {
    fn default() -> Self {
        Self {
            suffix: String::new(),
            block_suffix: String::new(),
            per_block: default_per_block(),
            extra: BTreeMap::new(),
        }
    }
}

impl CondenseRules {
    /// The block `material` packs into and how many units one block holds.
    pub fn target(&self, material: &str) -> Option<(String, u64)> {
        if !self.suffix.is_empty()
            && let Some(stem) = material.strip_suffix(self.suffix.as_str())
            && !stem.is_empty()
        {
            return Some((format!("{stem}{}", self.block_suffix), self.per_block));
        }
        self.extra
            .get(material)
            .map(|condensable| (condensable.block.clone(), condensable.per_block))
    }
}

// ---------------------------------------------------------------------------
// Bill of materials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillLine {
    pub item: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillOfMaterials {
    /// Sorted by quantity descending, then name.
    pub lines: Vec<BillLine>,
    /// Requested names the table does not know; each was counted as raw.
    pub unknown: Vec<String>,
}

impl BillOfMaterials {
    pub fn compute<'a>(
        table: &RawMaterialsTable,
        requests: impl IntoIterator<Item = (&'a str, u64)>,
    ) -> Self {
        let mut totals = Totals::new();
        let mut unknown = Vec::new();
        for (item, count) in requests {
            let count = count as f64;
            match table.get(item) {
                Some(entries) => {
                    for entry in entries {
                        *totals.entry(entry.item.clone()).or_insert(0.0) += entry.quantity * count;
                    }
                }
                None => {
                    if !unknown.iter().any(|name| name == item) {
                        unknown.push(item.to_string());
                    }
                    *totals.entry(item.to_string()).or_insert(0.0) += count;
                }
            }
        }

        let lines = resolver::sorted_entries(totals)
            .into_iter()
            .map(|entry| BillLine {
                item: entry.item,
                quantity: entry.quantity.ceil() as u64,
            })
            .collect();
        Self { lines, unknown }
    }

    /// Pack condensable totals into storage blocks, leaving the remainder
    /// as loose units. Block counts merge with any block line already present.
    pub fn condensed(&self, rules: &CondenseRules) -> Self {
        let mut totals: BTreeMap<String, u64> = BTreeMap::new();
        for line in &self.lines {
            match rules.target(&line.item) {
                Some((block, per_block)) if per_block > 1 => {
                    let blocks = line.quantity / per_block;
                    let rest = line.quantity % per_block;
                    if blocks > 0 {
                        *totals.entry(block).or_insert(0) += blocks;
                    }
                    if rest > 0 {
                        *totals.entry(line.item.clone()).or_insert(0) += rest;
                    }
                }
                _ => *totals.entry(line.item.clone()).or_insert(0) += line.quantity,
            }
        }

        let mut lines: Vec<BillLine> = totals
            .into_iter()
            .map(|(item, quantity)| BillLine { item, quantity })
            .collect();
        lines.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.item.cmp(&b.item)));
        Self {
            lines,
            unknown: self.unknown.clone(),
        }
    }

    pub fn get(&self, item: &str) -> Option<u64> {
        self.lines
            .iter()
            .find(|line| line.item == item)
            .map(|line| line.quantity)
    }

    pub fn breakdown<'s>(
        &'s self,
        sizes: &'s StackSizes,
    ) -> impl Iterator<Item = (&'s str, StackBreakdown)> + 's {
        self.lines.iter().map(move |line| {
            (
                line.item.as_str(),
                StackBreakdown::new(line.quantity, &line.item, sizes),
            )
        })
    }
}
