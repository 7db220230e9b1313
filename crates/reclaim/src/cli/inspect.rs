use crate::cli::output::{print_json, tier_cell};
use crate::cli::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use reclaim_lib::index::tally;
use reclaim_lib::util::{expand_path, format_bytes};
use reclaim_lib::Result;
use serde_json::json;

pub fn handle_measure_command(ctx: &Context, path: &str) -> Result<()> {
    let resolved = expand_path(path)?;
    let stats = tally(&resolved);

    if ctx.json {
        return print_json(&json!({
            "path": resolved,
            "size": stats.bytes,
            "files": stats.files,
            "directories": stats.dirs,
            "unreadable": stats.errors,
        }));
    }

    if !resolved.exists() {
        println!("{} {} does not exist", style("!").yellow(), resolved.display());
    }
    println!("{}  {}", style(format_bytes(stats.bytes)).cyan().bold(), resolved.display());
    if ctx.verbose {
        println!(
            "  {} file(s), {} director(ies), {} unreadable",
            stats.files, stats.dirs, stats.errors
        );
    }
    Ok(())
}

pub fn handle_classify_command(ctx: &Context, paths: &[String]) -> Result<()> {
    let results: Vec<_> = paths
        .iter()
        .map(|p| (p.as_str(), ctx.ops.classify(p)))
        .collect();

    if ctx.json {
        let values: Vec<_> = results
            .iter()
            .map(|(path, c)| json!({ "path": path, "classification": c }))
            .collect();
        return print_json(&values);
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Tier").fg(Color::Cyan),
        Cell::new("Label").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);

    for (path, classification) in &results {
        table.add_row(vec![
            Cell::new(path),
            tier_cell(classification.tier),
            Cell::new(&classification.label),
            Cell::new(&classification.description),
        ]);
    }

    println!("{}", table);
    Ok(())
}
