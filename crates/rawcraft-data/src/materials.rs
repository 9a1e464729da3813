//! Material lists exported by the Litematica schematic mod.
//!
//! Two export shapes are accepted. The text export is an ASCII table:
//!
//! ```text
//! +--------------+-------+---------+-----------+
//! | Material List for schematic 'house'        |
//! +--------------+-------+---------+-----------+
//! | Item         | Total | Missing | Available |
//! +--------------+-------+---------+-----------+
//! | Oak Planks   |   120 |     120 |         0 |
//! +--------------+-------+---------+-----------+
//! | Item         | Total | Missing | Available |
//! +--------------+-------+---------+-----------+
//! ```
//!
//! The CSV export has a fixed header and one quoted name per row. Both carry
//! display names, which go through [`DisplayNames::to_id`]. The `Total`
//! column is the quantity; repeated names are summed.

use crate::loader::DataLoadError;
use rawcraft_core::normalize::DisplayNames;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

pub const CSV_HEADER: &str = r#""Item","Total","Missing","Available""#;

/// Rows above the first material row in a text export.
const TXT_HEAD_ROWS: usize = 5;
/// Rows below the last material row in a text export.
const TXT_TAIL_ROWS: usize = 3;

/// Material id to requested count.
pub type MaterialList = BTreeMap<String, u64>;

#[derive(Debug, thiserror::Error)]
pub enum MaterialListError {
    #[error("not a material list export: {0}")]
    Format(String),

    #[error("line {line}: bad quantity {value:?}")]
    Quantity { line: usize, value: String },
}

// ===========================================================================
// Text export
// ===========================================================================

/// Parse the ASCII-table export.
pub fn parse_txt_material_list(text: &str, names: &DisplayNames) -> Result<MaterialList, MaterialListError> {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    verify_txt(&lines)?;

    let mut materials = MaterialList::new();
    let rows = &lines[TXT_HEAD_ROWS..lines.len() - TXT_TAIL_ROWS];
    for (offset, row) in rows.iter().enumerate() {
        let line = TXT_HEAD_ROWS + offset + 1;
        let mut cells = row.split('|').skip(1);
        let (Some(name), Some(total)) = (cells.next(), cells.next()) else {
            return Err(MaterialListError::Format(format!("line {line}: expected table cells")));
        };
        let quantity = parse_count(total, line)?;
        add(&mut materials, names.to_id(name), quantity);
    }
    Ok(materials)
}

fn verify_txt(lines: &[&str]) -> Result<(), MaterialListError> {
    if lines.len() < TXT_HEAD_ROWS + TXT_TAIL_ROWS {
        return Err(MaterialListError::Format("text export is truncated".to_string()));
    }
    if !lines[0].starts_with("+-") {
        return Err(MaterialListError::Format("missing top border".to_string()));
    }
    let title = lines[1];
    if !(title.starts_with("| Material List for ") || title.starts_with("| Area Analysis for ")) {
        return Err(MaterialListError::Format(format!("unexpected title {title:?}")));
    }
    let footer = lines[lines.len() - 2];
    if !footer.starts_with("| Item ") || !footer.contains("Available") {
        return Err(MaterialListError::Format("missing column footer".to_string()));
    }
    if !lines[lines.len() - 1].starts_with("+-") {
        return Err(MaterialListError::Format("missing bottom border".to_string()));
    }
    Ok(())
}

// ===========================================================================
// CSV export
// ===========================================================================

/// Parse the CSV export.
pub fn parse_csv_material_list(text: &str, names: &DisplayNames) -> Result<MaterialList, MaterialListError> {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    verify_csv(&lines)?;

    let mut materials = MaterialList::new();
    for (offset, row) in lines.iter().enumerate().skip(1) {
        let line = offset + 1;
        let (name, rest) = split_quoted(row)
            .ok_or_else(|| MaterialListError::Format(format!("line {line}: expected a quoted name")))?;
        let total = rest.split(',').nth(1).unwrap_or_default();
        let quantity = parse_count(total, line)?;
        add(&mut materials, names.to_id(name), quantity);
    }
    Ok(materials)
}

fn verify_csv(lines: &[&str]) -> Result<(), MaterialListError> {
    let Some(header) = lines.first() else {
        return Err(MaterialListError::Format("csv export is empty".to_string()));
    };
    if header.trim() != CSV_HEADER {
        return Err(MaterialListError::Format(format!("unexpected header {header:?}")));
    }
    let Some(first) = lines.get(1) else {
        return Err(MaterialListError::Format("csv export has no rows".to_string()));
    };
    let name_ok = split_quoted(first).is_some_and(|(name, _)| {
        !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == ' ')
    });
    if !name_ok {
        return Err(MaterialListError::Format(format!("unexpected first row {first:?}")));
    }
    let counts: Vec<&str> = first.rsplitn(4, ',').collect();
    let all_digits = counts.len() == 4
        && counts[..3]
            .iter()
            .all(|field| !field.trim().is_empty() && field.trim().chars().all(|c| c.is_ascii_digit()));
    if !all_digits {
        return Err(MaterialListError::Format(format!("unexpected first row {first:?}")));
    }
    Ok(())
}

/// Split `"name",rest` into the name and everything after its closing quote.
fn split_quoted(row: &str) -> Option<(&str, &str)> {
    let inner = row.strip_prefix('"')?;
    inner.split_once('"')
}

// ===========================================================================
// Shared
// ===========================================================================

fn parse_count(cell: &str, line: usize) -> Result<u64, MaterialListError> {
    let cell = cell.trim();
    cell.parse().map_err(|_| MaterialListError::Quantity {
        line,
        value: cell.to_string(),
    })
}

fn add(materials: &mut MaterialList, id: String, quantity: u64) {
    debug!(item = id.as_str(), quantity, "material list row");
    *materials.entry(id).or_insert(0) += quantity;
}

/// Read a material list export, picking the parser from the extension.
pub fn load_material_list(path: &Path, names: &DisplayNames) -> Result<MaterialList, DataLoadError> {
    let parse: fn(&str, &DisplayNames) -> Result<MaterialList, MaterialListError> =
        match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => parse_txt_material_list,
            Some("csv") => parse_csv_material_list,
            _ => {
                return Err(DataLoadError::UnsupportedFormat {
                    file: path.to_path_buf(),
                });
            }
        };
    let text = std::fs::read_to_string(path)?;
    let materials = parse(&text, names).map_err(|source| DataLoadError::MaterialList {
        file: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), materials = materials.len(), "material list loaded");
    Ok(materials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rawcraft_core::rules::RuleSet;
    use std::fs;
    use std::path::PathBuf;

    const TXT_EXPORT: &str = "\
+----------------------------------------------+-------+---------+-----------+
| Material List for schematic 'Starter House' (1 of 1 regions)             |
+----------------------------------------------+-------+---------+-----------+
| Item                                         | Total | Missing | Available |
+----------------------------------------------+-------+---------+-----------+
| Oak Planks                                   |   120 |     120 |         0 |
| Block of Iron                                |     2 |       2 |         0 |
| Light Grey Wool                              |    16 |      16 |         0 |
| Redstone Repeater (4 ticks)                  |     3 |       3 |         0 |
| Oak Planks                                   |     8 |       8 |         0 |
+----------------------------------------------+-------+---------+-----------+
| Item                                         | Total | Missing | Available |
+----------------------------------------------+-------+---------+-----------+
";

    const CSV_EXPORT: &str = "\
\"Item\",\"Total\",\"Missing\",\"Available\"
\"Oak Planks\",120,120,0
\"Jack o'Lantern\",4,4,0
\"Redstone Dust\",30,12,18
";

    fn names() -> DisplayNames {
        RuleSet::standard().display_names
    }

    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rawcraft_materials_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn text_export_rows_become_ids() {
        let list = parse_txt_material_list(TXT_EXPORT, &names()).unwrap();
        assert_eq!(list.get("oak_planks"), Some(&128));
        assert_eq!(list.get("iron_block"), Some(&2));
        assert_eq!(list.get("light_gray_wool"), Some(&16));
        assert_eq!(list.get("repeater"), Some(&3));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn area_analysis_title_is_accepted() {
        let text = TXT_EXPORT.replace("| Material List for", "| Area Analysis for");
        assert!(parse_txt_material_list(&text, &names()).is_ok());
    }

    #[test]
    fn text_export_without_footer_is_rejected() {
        let text: String = TXT_EXPORT.lines().take(8).map(|l| format!("{l}\n")).collect();
        let err = parse_txt_material_list(&text, &names()).unwrap_err();
        assert!(matches!(err, MaterialListError::Format(_)));
    }

    #[test]
    fn text_export_with_foreign_title_is_rejected() {
        let text = TXT_EXPORT.replace("| Material List for", "| Shopping list for");
        assert!(parse_txt_material_list(&text, &names()).is_err());
        assert!(parse_txt_material_list("", &names()).is_err());
    }

    #[test]
    fn text_row_with_bad_total_reports_its_line() {
        let text = TXT_EXPORT.replace("|     2 |       2 |", "|   two |       2 |");
        let err = parse_txt_material_list(&text, &names()).unwrap_err();
        assert!(matches!(err, MaterialListError::Quantity { line: 7, ref value } if value == "two"));
    }

    #[test]
    fn csv_export_uses_total_column() {
        let list = parse_csv_material_list(CSV_EXPORT, &names()).unwrap();
        assert_eq!(list.get("oak_planks"), Some(&120));
        assert_eq!(list.get("jack_o_lantern"), Some(&4));
        assert_eq!(list.get("redstone"), Some(&30));
    }

    #[test]
    fn csv_header_must_match() {
        let text = CSV_EXPORT.replace("\"Available\"", "\"Spare\"");
        assert!(parse_csv_material_list(&text, &names()).is_err());
    }

    #[test]
    fn csv_first_row_must_be_numeric() {
        let text = CSV_EXPORT.replace("\"Oak Planks\",120,120,0", "\"Oak Planks\",lots,120,0");
        assert!(parse_csv_material_list(&text, &names()).is_err());
    }

    #[test]
    fn csv_header_alone_is_rejected() {
        let err = parse_csv_material_list(&format!("{CSV_HEADER}\n"), &names()).unwrap_err();
        assert!(matches!(err, MaterialListError::Format(_)));
    }

    #[test]
    fn load_dispatches_on_extension() {
        let dir = make_test_dir("dispatch");
        fs::write(dir.join("house.txt"), TXT_EXPORT).unwrap();
        fs::write(dir.join("house.csv"), CSV_EXPORT).unwrap();
        fs::write(dir.join("house.xlsx"), "").unwrap();

        let txt = load_material_list(&dir.join("house.txt"), &names()).unwrap();
        assert_eq!(txt.get("oak_planks"), Some(&128));
        let csv = load_material_list(&dir.join("house.csv"), &names()).unwrap();
        assert_eq!(csv.get("oak_planks"), Some(&120));
        let err = load_material_list(&dir.join("house.xlsx"), &names()).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat { .. }));

        cleanup(&dir);
    }

    #[test]
    fn malformed_file_error_names_the_file() {
        let dir = make_test_dir("malformed");
        let path = dir.join("broken.csv");
        fs::write(&path, "Item,Total\n").unwrap();

        let err = load_material_list(&path, &names()).unwrap_err();
        assert!(matches!(err, DataLoadError::MaterialList { ref file, .. } if file == &path));

        cleanup(&dir);
    }
}
