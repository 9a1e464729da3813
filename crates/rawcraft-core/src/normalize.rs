//! Fixed textual rewrites applied to material names before graph lookup.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One rewrite step. Rewrites run in the order they are listed, each seeing
/// the output of the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NameRewrite {
    /// Replace a whole name by another.
    Alias { map: BTreeMap<String, String> },
    /// Append `append` to names ending in `suffix` (concrete becomes
    /// concrete powder).
    ExtendSuffix { suffix: String, append: String },
    /// Remove every occurrence of each segment (weathering stages).
    RemoveSegments { segments: Vec<String> },
}

impl NameRewrite {
    pub fn apply<'a>(&self, name: Cow<'a, str>) -> Cow<'a, str> {
        match self {
            NameRewrite::Alias { map } => match map.get(name.as_ref()) {
                Some(target) => Cow::Owned(target.clone()),
                None => name,
            },
            NameRewrite::ExtendSuffix { suffix, append } => {
                if name.ends_with(suffix.as_str()) {
                    Cow::Owned(format!("{name}{append}"))
                } else {
                    name
                }
            }
            NameRewrite::RemoveSegments { segments } => {
                let mut name = name;
                for segment in segments {
                    if name.contains(segment.as_str()) {
                        name = Cow::Owned(name.replace(segment.as_str(), ""));
                    }
                }
                name
            }
        }
    }
}

/// Run a chain of rewrites. Borrows the input when nothing matches.
pub fn rewrite<'a>(rewrites: &[NameRewrite], name: &'a str) -> Cow<'a, str> {
    rewrites
        .iter()
        .fold(Cow::Borrowed(name), |name, rule| rule.apply(name))
}

// ---------------------------------------------------------------------------
// Display names
// ---------------------------------------------------------------------------

/// A substring replacement (regional spellings).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub from: String,
    pub to: String,
}

/// Turns the names players see (material list exports, localized or
/// resource-pack renamed) into material ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayNames {
    /// Ids that legitimately end in digits (`music_disc_13`). Checked before
    /// digits are stripped.
    #[serde(default)]
    pub numbered_prefixes: Vec<String>,
    #[serde(default)]
    pub replacements: Vec<Replacement>,
    /// `block_of_iron` becomes `iron_block` when set to `block_of_`.
    #[serde(default)]
    pub block_of_prefix: String,
    #[serde(default)]
    pub block_suffix: String,
    /// Final whole-name aliases.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

/// Prefix of entity names that bypass the table.
pub const ENTITY_MARKER: char = '$';

impl DisplayNames {
    pub fn to_id(&self, display: &str) -> String {
        let display = display.trim();
        if display.starts_with(ENTITY_MARKER) {
            return display.to_string();
        }

        let name = keep_until(display, |c| c.is_ascii_alphanumeric() || is_name_punct(c))
            .to_lowercase();
        let joined = join_words(&name);
        if self.is_numbered(&joined) {
            return joined;
        }

        let name: String = name.chars().filter(|c| !c.is_ascii_digit()).collect();
        let name = keep_until(&name, |c| c.is_ascii_alphabetic() || is_name_punct(c));
        let mut name = join_words(&name);

        for replacement in &self.replacements {
            if name.contains(replacement.from.as_str()) {
                name = name.replace(replacement.from.as_str(), &replacement.to);
            }
        }
        if !self.block_of_prefix.is_empty()
            && let Some(at) = name.find(self.block_of_prefix.as_str())
        {
            let rest = &name[at + self.block_of_prefix.len()..];
            if !rest.is_empty() {
                name = format!("{}{rest}{}", &name[..at], self.block_suffix);
            }
        }

        match self.aliases.get(&name) {
            Some(id) => id.clone(),
            None => name,
        }
    }

    fn is_numbered(&self, name: &str) -> bool {
        self.numbered_prefixes.iter().any(|prefix| {
            name.strip_prefix(prefix.as_str())
                .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
        })
    }
}

fn is_name_punct(c: char) -> bool {
    c == '_' || c == '\'' || c.is_whitespace()
}

/// Drop control characters, then cut at the first character `keep` rejects.
fn keep_until(s: &str, keep: impl Fn(char) -> bool) -> String {
    s.chars()
        .filter(|c| !c.is_control())
        .take_while(|c| keep(*c))
        .collect()
}

/// Whitespace runs become `_`; trailing underscores go.
fn join_words(s: &str) -> String {
    let joined = s.split_whitespace().collect::<Vec<_>>().join("_");
    joined.trim_end_matches('_').to_string()
}
