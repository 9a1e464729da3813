use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use rawcraft_core::bill::{BillOfMaterials, StackBreakdown, StackSizes, parse_quantity};
use rawcraft_core::compile::compile_recipes;
use rawcraft_core::resolver::Resolver;
use rawcraft_core::rules::RuleSet;
use rawcraft_core::table::{AssembleOptions, build_table};
use rawcraft_data::loader::{self, GameData};
use rawcraft_data::materials::{CSV_HEADER, parse_csv_material_list, parse_txt_material_list};
use rawcraft_data::{JsonTableWriter, TableSink, read_table};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "rawcraft")]
#[command(author, version, about = "Raw-material cost tables for a crafting recipe book", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the raw-materials table for the whole catalog
    Build {
        /// Data directory holding recipe/, items and blocks
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        /// Rule file overriding the data directory's rules
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Where to write the table
        #[arg(short, long, default_value = "raw_materials.json")]
        output: PathBuf,
        /// Recursion depth limit
        #[arg(long)]
        max_depth: Option<usize>,
        /// Abort the batch after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// Resolve individual items without building the full table
    Resolve {
        #[arg(short, long, default_value = "data")]
        data: PathBuf,
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Items to resolve
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Total the raw materials for a list of items
    Bill {
        /// A table written by `build`
        #[arg(short, long, default_value = "raw_materials.json")]
        table: PathBuf,
        /// One `item quantity` per line; quantity may end in `s` or `sb`.
        /// Litematica text and CSV exports are recognized by their first line.
        #[arg(short, long)]
        list: PathBuf,
        /// Rule file for display names and storage blocks
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Limited stack sizes (item -> 16 or 1); everything else stacks to 64
        #[arg(long)]
        stack_sizes: Option<PathBuf>,
        /// Print the stack breakdown shorthand instead of the long form
        #[arg(long)]
        short: bool,
        /// Report ingots and similar materials as storage blocks where possible
        #[arg(long)]
        blocks: bool,
    },
}

fn load(data: &Path, rules: Option<&Path>) -> Result<GameData> {
    let mut game = loader::load_game_data(data)
        .with_context(|| format!("loading game data from {}", data.display()))?;
    if let Some(path) = rules {
        game.rules = loader::load_rules_file(path)
            .with_context(|| format!("loading rules from {}", path.display()))?;
    }
    for (name, reason) in &game.recipes.rejected {
        println!("skipped recipe file {name}: {reason}");
    }
    Ok(game)
}

fn build(
    data: &Path,
    rules: Option<&Path>,
    output: &Path,
    max_depth: Option<usize>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let game = load(data, rules)?;
    let options = AssembleOptions {
        max_depth,
        deadline: timeout_secs.map(|secs| Instant::now() + Duration::from_secs(secs)),
    };

    let assembly = build_table(&game.recipes.records, &game.catalog, &game.rules, &options)
        .context("building raw-materials table")?;

    if let Some(compile) = &assembly.report.compile {
        for rejected in &compile.rejected {
            println!("skipped recipe {}: {}", rejected.record, rejected.error);
        }
    }
    for skipped in &assembly.report.skipped {
        println!("skipped {}: {}", skipped.name, skipped.reason);
    }

    JsonTableWriter::new(output)
        .write_table(&assembly.table)
        .with_context(|| format!("writing table to {}", output.display()))?;
    println!("{}", assembly.report);
    Ok(())
}

fn resolve_items(data: &Path, rules: Option<&Path>, items: &[String]) -> Result<()> {
    let game = load(data, rules)?;
    let (book, _) = compile_recipes(&game.recipes.records, &game.rules);
    let graph = book.to_graph();
    let resolver = Resolver::new(&graph, &game.rules);

    for item in items {
        let entries = resolver
            .resolve(item)
            .with_context(|| format!("resolving {item}"))?;
        println!("{item}:");
        for entry in entries {
            println!("  {} {}", entry.item, entry.quantity);
        }
    }
    Ok(())
}

fn parse_list(text: &str, sizes: &StackSizes) -> Result<Vec<(String, u64)>> {
    let mut requests = Vec::new();
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((item, quantity)) = line.split_once(char::is_whitespace) else {
            bail!("line {}: expected `item quantity`, got {line:?}", number + 1);
        };
        let quantity = parse_quantity(quantity, item, sizes)
            .with_context(|| format!("line {}", number + 1))?;
        requests.push((item.to_string(), quantity));
    }
    Ok(requests)
}

#[derive(Debug, PartialEq, Eq)]
enum ListKind {
    Plain,
    LitematicaText,
    LitematicaCsv,
}

fn list_kind(text: &str) -> ListKind {
    let first = text.lines().next().unwrap_or_default().trim();
    if first.starts_with("+-") {
        ListKind::LitematicaText
    } else if first == CSV_HEADER {
        ListKind::LitematicaCsv
    } else {
        ListKind::Plain
    }
}

struct BillOptions<'a> {
    stack_sizes: Option<&'a Path>,
    rules: Option<&'a Path>,
    short: bool,
    blocks: bool,
}

fn bill(table: &Path, list: &Path, options: &BillOptions) -> Result<()> {
    let table = read_table(table).with_context(|| format!("reading table {}", table.display()))?;
    let sizes = match options.stack_sizes {
        Some(path) => loader::deserialize_file(path)
            .with_context(|| format!("reading stack sizes {}", path.display()))?,
        None => StackSizes::new(),
    };
    let rules = match options.rules {
        Some(path) => loader::load_rules_file(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => RuleSet::standard(),
    };

    let text = std::fs::read_to_string(list)
        .with_context(|| format!("reading list {}", list.display()))?;
    let requests: Vec<(String, u64)> = match list_kind(&text) {
        ListKind::Plain => parse_list(&text, &sizes)?,
        ListKind::LitematicaText => parse_txt_material_list(&text, &rules.display_names)
            .with_context(|| format!("reading material list {}", list.display()))?
            .into_iter()
            .collect(),
        ListKind::LitematicaCsv => parse_csv_material_list(&text, &rules.display_names)
            .with_context(|| format!("reading material list {}", list.display()))?
            .into_iter()
            .collect(),
    };

    let mut bill = BillOfMaterials::compute(
        &table,
        requests.iter().map(|(item, count)| (item.as_str(), *count)),
    );
    if options.blocks {
        bill = bill.condensed(&rules.condense);
    }
    for name in &bill.unknown {
        info!(item = name.as_str(), "not in table; counted as raw");
    }
    for (item, breakdown) in bill.breakdown(&sizes) {
        println!("{item}: {}", render(&breakdown, options.short));
    }
    Ok(())
}

fn render(breakdown: &StackBreakdown, short: bool) -> String {
    if short {
        breakdown.shorthand()
    } else {
        breakdown.to_string()
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            data,
            rules,
            output,
            max_depth,
            timeout_secs,
        } => {
            info!("Building raw-materials table from {}", data.display());
            build(&data, rules.as_deref(), &output, max_depth, timeout_secs)
        }
        Commands::Resolve { data, rules, items } => resolve_items(&data, rules.as_deref(), &items),
        Commands::Bill {
            table,
            list,
            rules,
            stack_sizes,
            short,
            blocks,
        } => bill(
            &table,
            &list,
            &BillOptions {
                stack_sizes: stack_sizes.as_deref(),
                rules: rules.as_deref(),
                short,
                blocks,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_lines_parse_with_stack_suffixes() {
        let sizes: StackSizes = [("ender_pearl", 16)].into_iter().collect();
        let text = "torch 10\n# comment\n\nender_pearl 2s\nstone 1sb 1s 3\n";
        let requests = parse_list(text, &sizes).unwrap();
        assert_eq!(
            requests,
            vec![
                ("torch".to_string(), 10),
                ("ender_pearl".to_string(), 32),
                ("stone".to_string(), 64 * 27 + 64 + 3),
            ]
        );
    }

    #[test]
    fn list_line_without_quantity_fails() {
        assert!(parse_list("torch", &StackSizes::new()).is_err());
    }

    #[test]
    fn schematic_exports_are_told_apart_from_plain_lists() {
        assert_eq!(list_kind("+-----+\n| Material List for x |\n"), ListKind::LitematicaText);
        assert_eq!(
            list_kind("\"Item\",\"Total\",\"Missing\",\"Available\"\n\"Stone\",1,1,0\n"),
            ListKind::LitematicaCsv
        );
        assert_eq!(list_kind("torch 10\n"), ListKind::Plain);
        assert_eq!(list_kind(""), ListKind::Plain);
    }
}
