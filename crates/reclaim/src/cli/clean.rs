use crate::cli::output::print_json;
use crate::cli::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use dialoguer::Confirm;
use reclaim_lib::suggest::smart_suggestions;
use reclaim_lib::targets::{self, clean_target, measure_target, reclaimable_total, CleanupTarget};
use reclaim_lib::util::{create_progress_bar, expand_path, format_bytes, home_dir};
use reclaim_lib::{ReclaimError, Result};
use serde_json::json;

pub fn handle_targets_command(ctx: &Context) -> Result<()> {
    let reports: Vec<_> = targets::catalog().iter().map(measure_target).collect();

    if ctx.json {
        return print_json(&json!({
            "targets": reports,
            "reclaimable": reclaimable_total(&reports),
        }));
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
        Cell::new("Safe").fg(Color::Cyan),
        Cell::new("Path").fg(Color::Cyan),
    ]);

    for report in reports.iter().filter(|r| r.exists || ctx.verbose) {
        table.add_row(vec![
            Cell::new(&report.id),
            Cell::new(&report.name),
            Cell::new(format_bytes(report.size)),
            if report.safe {
                Cell::new("yes").fg(Color::Green)
            } else {
                Cell::new("no").fg(Color::Red)
            },
            Cell::new(report.path.display()),
        ]);
    }

    println!("{}", table);
    println!(
        "\nReclaimable without confirmation: {}",
        style(format_bytes(reclaimable_total(&reports))).green().bold()
    );
    Ok(())
}

fn confirm_unsafe(target: &CleanupTarget) -> Result<bool> {
    let location = target
        .resolved_path()
        .unwrap_or_else(|_| std::path::PathBuf::from(target.path));
    Ok(Confirm::new()
        .with_prompt(format!(
            "{} holds user data ({}). Empty it anyway?",
            target.name,
            location.display()
        ))
        .default(false)
        .interact()?)
}

pub async fn handle_clean_command(ctx: &Context, ids: &[String], yes: bool) -> Result<()> {
    let selected = ids
        .iter()
        .map(|id| {
            targets::find(id).ok_or_else(|| {
                ReclaimError::UserInput(format!("unknown cleanup target '{}'", id))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let pb = (!ctx.json).then(|| create_progress_bar(selected.len() as u64, "Cleaning targets"));
    let mut results = Vec::new();
    let mut total_freed = 0u64;

    for target in selected {
        if let Some(pb) = &pb {
            pb.set_message(format!("Cleaning {}", target.name));
        }

        let confirmed = yes
            || target.safe
            || match &pb {
                Some(pb) => pb.suspend(|| confirm_unsafe(target))?,
                None => false,
            };

        match clean_target(target, confirmed, ctx.ops.delete_options()).await {
            Ok(outcome) => {
                total_freed += outcome.freed;
                results.push(json!({ "id": target.id, "success": true, "freedSpace": outcome.freed }));
            }
            Err(e) => {
                log::warn!("Cleaning {} failed: {}", target.id, e);
                results.push(json!({ "id": target.id, "success": false, "error": e.to_string() }));
            }
        }

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if ctx.json {
        return print_json(&json!({ "results": results, "freedSpace": total_freed }));
    }

    for result in &results {
        let id = result["id"].as_str().unwrap_or_default();
        match result["error"].as_str() {
            None => println!(
                "{} {} ({})",
                style("✓").green(),
                id,
                format_bytes(result["freedSpace"].as_u64().unwrap_or(0))
            ),
            Some(error) => println!("{} {}: {}", style("✗").red(), id, error),
        }
    }
    println!("\nFreed {}", style(format_bytes(total_freed)).green().bold());
    Ok(())
}

pub fn handle_suggest_command(ctx: &Context) -> Result<()> {
    let suggestions = smart_suggestions(&home_dir()?);

    if ctx.json {
        return print_json(&suggestions);
    }

    if suggestions.is_empty() {
        println!("{}", style("No suggestions right now").green());
        return Ok(());
    }

    for suggestion in &suggestions {
        println!("{} {}", style("•").cyan(), style(&suggestion.title).bold());
        println!("  {}", suggestion.description);
        println!("  {}", style(suggestion.path.display()).dim());
        if suggestion.size > 0 {
            println!("  Reclaimable: {}", style(format_bytes(suggestion.size)).green());
        }
    }
    Ok(())
}

pub async fn handle_delete_command(ctx: &Context, path: &str, yes: bool) -> Result<()> {
    let resolved = expand_path(path)?;
    let classification = ctx.ops.classify(path);

    if !yes && !ctx.json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete {} ({} tier, {})?",
                resolved.display(),
                classification.tier,
                format_bytes(ctx.ops.measure_directory(path))
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Aborted").yellow());
            return Ok(());
        }
    }

    let response = ctx.ops.delete_path(path).await;

    if ctx.json {
        return print_json(&response);
    }

    match &response.error {
        None if response.removed => println!(
            "{} Freed {} from {}",
            style("✓").green(),
            style(format_bytes(response.freed_space)).bold(),
            resolved.display()
        ),
        None => println!(
            "{} Freed {} from {} but some items are in use and remain",
            style("!").yellow(),
            format_bytes(response.freed_space),
            resolved.display()
        ),
        Some(error) => println!("{} {}: {}", style("✗").red(), resolved.display(), error),
    }
    Ok(())
}
