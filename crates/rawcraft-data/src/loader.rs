//! Loading pipeline: reads the game data directory into recipe records,
//! catalogs and a validated rule set.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus the directory-level loaders built on them.
//!
//! Expected layout of a data directory:
//!
//! ```text
//! data/
//!   recipe/*.json               one record per file, stem = record name
//!   items.{ron,toml,json}       item names
//!   blocks.{ron,toml,json}      block names
//!   rules.{ron,toml,json}       optional; built-in rules when absent
//!   limited_stack_items.{...}   optional; item -> stack size
//! ```

use crate::materials::MaterialListError;
use rawcraft_core::bill::StackSizes;
use rawcraft_core::recipe::RecipeRecord;
use rawcraft_core::rules::{ConfigError, RuleSet};
use rawcraft_core::table::Catalog;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const RECIPE_DIR: &str = "recipe";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The rule file parsed but is unusable.
    #[error("invalid rules in {file}: {source}")]
    Rules {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// A material list export did not have the expected shape.
    #[error("invalid material list {file}: {source}")]
    MaterialList {
        file: PathBuf,
        #[source]
        source: MaterialListError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_str<T: DeserializeOwned>(format: Format, content: &str, path: &Path) -> Result<T, DataLoadError> {
    let parsed = match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    })
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_str(format, &content, path)
}

/// Deserialize a list from a file. TOML has no top-level arrays, so for TOML
/// files the array is taken from `toml_key` of the top-level table. RON and
/// JSON files hold the list directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    if format != Format::Toml {
        return parse_str(format, &content, path);
    }

    let table: toml::Value = parse_str(format, &content, path)?;
    let array = table
        .get(toml_key)
        .ok_or_else(|| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: format!("missing key '{toml_key}' in TOML file"),
        })?
        .clone();
    array
        .try_into()
        .map_err(|e: toml::de::Error| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        })
}

// ===========================================================================
// Recipes
// ===========================================================================

/// Every record from a recipe directory, keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct RecipeSet {
    pub records: BTreeMap<String, RecipeRecord>,
    /// Files that could not be parsed, with the reason. Not fatal.
    pub rejected: Vec<(String, String)>,
}

/// Load every `*.json` file in `dir`. Unreadable directories fail; a single
/// malformed file is logged and reported instead.
pub fn load_recipe_dir(dir: &Path) -> Result<RecipeSet, DataLoadError> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut set = RecipeSet::default();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match deserialize_file::<RecipeRecord>(&path) {
            Ok(record) => {
                set.records.insert(stem.to_string(), record);
            }
            Err(error) => {
                warn!(file = %path.display(), %error, "recipe file skipped");
                set.rejected.push((stem.to_string(), error.to_string()));
            }
        }
    }

    info!(
        dir = %dir.display(),
        records = set.records.len(),
        rejected = set.rejected.len(),
        "recipe records loaded"
    );
    Ok(set)
}

// ===========================================================================
// Catalog, rules, stack sizes
// ===========================================================================

/// Load the item and block name lists.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let items: Vec<String> = deserialize_list(&require_data_file(dir, "items")?, "items")?;
    let blocks: Vec<String> = deserialize_list(&require_data_file(dir, "blocks")?, "blocks")?;
    debug!(items = items.len(), blocks = blocks.len(), "catalog loaded");
    Ok(Catalog::new(items, blocks))
}

/// Load and validate `rules.*`, or fall back to the built-in rule set.
pub fn load_rules(dir: &Path) -> Result<RuleSet, DataLoadError> {
    match find_data_file(dir, "rules")? {
        Some(path) => load_rules_file(&path),
        None => {
            debug!(dir = %dir.display(), "no rules file; using built-in rules");
            Ok(RuleSet::standard())
        }
    }
}

/// Load and validate a rule file at an explicit path.
pub fn load_rules_file(path: &Path) -> Result<RuleSet, DataLoadError> {
    let rules: RuleSet = deserialize_file(path)?;
    rules.validate().map_err(|source| DataLoadError::Rules {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(rules)
}

/// Load `limited_stack_items.*` when present.
pub fn load_stack_sizes(dir: &Path) -> Result<StackSizes, DataLoadError> {
    match find_data_file(dir, "limited_stack_items")? {
        Some(path) => deserialize_file(&path),
        None => Ok(StackSizes::new()),
    }
}

// ===========================================================================
// Game data
// ===========================================================================

/// Everything a table build needs, loaded from one data directory.
#[derive(Debug, Clone)]
pub struct GameData {
    pub recipes: RecipeSet,
    pub catalog: Catalog,
    pub rules: RuleSet,
    pub stack_sizes: StackSizes,
}

pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let recipe_dir = dir.join(RECIPE_DIR);
    if !recipe_dir.is_dir() {
        return Err(DataLoadError::MissingRequired {
            file: RECIPE_DIR.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    Ok(GameData {
        recipes: load_recipe_dir(&recipe_dir)?,
        catalog: load_catalog(dir)?,
        rules: load_rules(dir)?,
        stack_sizes: load_stack_sizes(dir)?,
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Create a temporary directory with a unique name for test isolation.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rawcraft_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Clean up a test directory.
    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    const TORCH_JSON: &str = r##"{
        "type": "minecraft:crafting_shaped",
        "key": {"#": "minecraft:stick", "X": ["minecraft:coal", "minecraft:charcoal"]},
        "pattern": ["X", "#"],
        "result": {"count": 4, "id": "minecraft:torch"}
    }"##;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("items.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("items.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("items.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["items.yaml", "items"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file / require_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_json() {
        let dir = make_test_dir("find_json");
        fs::write(dir.join("items.json"), "[]").unwrap();

        let result = find_data_file(&dir, "items").unwrap();
        assert_eq!(result, Some(dir.join("items.json")));

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_missing() {
        let dir = make_test_dir("find_missing");

        assert_eq!(find_data_file(&dir, "items").unwrap(), None);

        cleanup(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = make_test_dir("find_conflict");
        fs::write(dir.join("items.ron"), "[]").unwrap();
        fs::write(dir.join("items.json"), "[]").unwrap();

        let result = find_data_file(&dir, "items");
        assert!(matches!(
            result,
            Err(DataLoadError::ConflictingFormats { .. })
        ));

        cleanup(&dir);
    }

    #[test]
    fn require_data_file_missing() {
        let dir = make_test_dir("require_missing");

        let result = require_data_file(&dir, "blocks");
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == "blocks"
        ));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // deserialize_list
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_list_all_formats() {
        let dir = make_test_dir("list_formats");
        fs::write(dir.join("a.ron"), r#"["stone", "torch"]"#).unwrap();
        fs::write(dir.join("b.json"), r#"["stone", "torch"]"#).unwrap();
        fs::write(dir.join("c.toml"), r#"items = ["stone", "torch"]"#).unwrap();

        for file in ["a.ron", "b.json", "c.toml"] {
            let items: Vec<String> = deserialize_list(&dir.join(file), "items").unwrap();
            assert_eq!(items, vec!["stone", "torch"]);
        }

        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_toml_missing_key() {
        let dir = make_test_dir("list_toml_missing");
        let path = dir.join("items.toml");
        fs::write(&path, r#"foo = "bar""#).unwrap();

        let result: Result<Vec<String>, _> = deserialize_list(&path, "items");
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error() {
        let dir = make_test_dir("deser_parse_err");
        let path = dir.join("bad.ron");
        fs::write(&path, "this is not valid RON {{{").unwrap();

        let result: Result<Vec<String>, _> = deserialize_file(&path);
        assert!(matches!(result, Err(DataLoadError::Parse { .. })));

        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_recipe_dir
    // -----------------------------------------------------------------------

    #[test]
    fn recipe_dir_keys_by_stem_and_collects_failures() {
        let dir = make_test_dir("recipe_dir");
        fs::write(dir.join("torch.json"), TORCH_JSON).unwrap();
        fs::write(dir.join("broken.json"), "{ not json").unwrap();
        fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let set = load_recipe_dir(&dir).unwrap();
        assert_eq!(set.records.len(), 1);
        assert!(set.records.contains_key("torch"));
        assert_eq!(set.rejected.len(), 1);
        assert_eq!(set.rejected[0].0, "broken");

        cleanup(&dir);
    }

    #[test]
    fn recipe_dir_missing_is_io_error() {
        let dir = make_test_dir("recipe_dir_missing");
        let result = load_recipe_dir(&dir.join("nope"));
        assert!(matches!(result, Err(DataLoadError::Io(_))));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_rules / load_stack_sizes
    // -----------------------------------------------------------------------

    #[test]
    fn rules_default_when_absent() {
        let dir = make_test_dir("rules_absent");
        assert_eq!(load_rules(&dir).unwrap(), RuleSet::standard());
        cleanup(&dir);
    }

    #[test]
    fn rules_file_is_loaded_and_validated() {
        let dir = make_test_dir("rules_file");
        fs::write(
            dir.join("rules.json"),
            r##"{"tags": {"#planks": "oak_planks"}, "axioms": {"exact": ["coal"]}, "max_depth": 8}"##,
        )
        .unwrap();
        let rules = load_rules(&dir).unwrap();
        assert_eq!(rules.max_depth, 8);
        assert_eq!(rules.tags.len(), 1);
        cleanup(&dir);
    }

    #[test]
    fn empty_rule_tables_are_rejected() {
        let dir = make_test_dir("rules_empty");
        fs::write(dir.join("rules.json"), r#"{"tags": {}, "axioms": {}}"#).unwrap();
        let result = load_rules(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::Rules {
                source: ConfigError::MissingTable("tags"),
                ..
            })
        ));
        cleanup(&dir);
    }

    #[test]
    fn rules_round_trip_through_ron() {
        let dir = make_test_dir("rules_ron");
        let text = ron::ser::to_string(&RuleSet::standard()).unwrap();
        fs::write(dir.join("rules.ron"), text).unwrap();
        assert_eq!(load_rules(&dir).unwrap(), RuleSet::standard());
        cleanup(&dir);
    }

    #[test]
    fn stack_sizes_load_when_present() {
        let dir = make_test_dir("stacks");
        fs::write(
            dir.join("limited_stack_items.json"),
            r#"{"ender_pearl": 16, "bucket": 1}"#,
        )
        .unwrap();
        let sizes = load_stack_sizes(&dir).unwrap();
        assert_eq!(sizes.stack_size("ender_pearl"), 16);
        assert_eq!(sizes.stack_size("stone"), 64);
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // load_game_data
    // -----------------------------------------------------------------------

    #[test]
    fn game_data_loads_full_directory() {
        let dir = make_test_dir("game_data");
        fs::create_dir_all(dir.join(RECIPE_DIR)).unwrap();
        fs::write(dir.join(RECIPE_DIR).join("torch.json"), TORCH_JSON).unwrap();
        fs::write(dir.join("items.json"), r#"["torch", "stick"]"#).unwrap();
        fs::write(dir.join("blocks.toml"), r#"blocks = ["torch", "wall_torch"]"#).unwrap();

        let data = load_game_data(&dir).unwrap();
        assert_eq!(data.recipes.records.len(), 1);
        assert_eq!(data.catalog.items(), ["stick", "torch"]);
        assert_eq!(data.catalog.block_only().collect::<Vec<_>>(), vec!["wall_torch"]);
        assert_eq!(data.rules, RuleSet::standard());

        cleanup(&dir);
    }

    #[test]
    fn game_data_requires_recipe_dir() {
        let dir = make_test_dir("game_data_no_recipes");
        let result = load_game_data(&dir);
        assert!(matches!(
            result,
            Err(DataLoadError::MissingRequired { ref file, .. }) if file == RECIPE_DIR
        ));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Error display messages
    // -----------------------------------------------------------------------

    #[test]
    fn error_display_messages() {
        let e = DataLoadError::MissingRequired {
            file: "items".to_string(),
            dir: PathBuf::from("/data"),
        };
        assert!(format!("{e}").contains("items"));
        assert!(format!("{e}").contains("/data"));

        let e = DataLoadError::Parse {
            file: PathBuf::from("bad.ron"),
            detail: "syntax error".to_string(),
        };
        assert!(format!("{e}").contains("bad.ron"));
        assert!(format!("{e}").contains("syntax error"));

        let e = DataLoadError::Rules {
            file: PathBuf::from("rules.toml"),
            source: ConfigError::MissingTable("axioms"),
        };
        assert!(format!("{e}").contains("axioms"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let data_err: DataLoadError = io_err.into();
        assert!(matches!(data_err, DataLoadError::Io(_)));
        assert!(format!("{data_err}").contains("file not found"));
    }
}
