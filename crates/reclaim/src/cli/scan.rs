use crate::cli::output::{print_json, tier_cell};
use crate::cli::Context;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use dialoguer::{Confirm, MultiSelect};
use reclaim_lib::delete::{dispose, Disposal};
use reclaim_lib::util::{create_spinner, format_bytes, format_duration, show_scan_progress};
use reclaim_lib::{Result, ScanGate, ScanHit, ScanKind};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;

pub struct ScanArgs {
    pub roots: Vec<PathBuf>,
    pub min_size: Option<u64>,
    pub max_results: Option<usize>,
    pub exclude: Vec<String>,
    pub no_default_excludes: bool,
    pub dispose: bool,
}

/// Cancels the running scan of `kind` when the operator presses Ctrl-C.
fn cancel_on_interrupt(gate: ScanGate, kind: ScanKind) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{} Cancelling {} scan...", style("!").yellow(), kind);
            gate.cancel(kind);
        }
    })
}

pub async fn handle_scan_command(ctx: &Context, args: ScanArgs) -> Result<()> {
    let mut options = ctx.ops.settings().scan.clone();
    if !args.roots.is_empty() {
        options.roots = args.roots;
    }
    if let Some(min_size) = args.min_size {
        options.min_size = min_size;
    }
    if let Some(max_results) = args.max_results {
        options.max_results = max_results;
    }
    if args.no_default_excludes {
        options.exclude_dirs.clear();
    }
    options.exclude_dirs.extend(args.exclude);

    if !ctx.json {
        println!(
            "{} Scanning {} root(s) for items of at least {}...",
            style(">>>").cyan(),
            options.roots.len(),
            style(format_bytes(options.min_size)).bold()
        );
    }

    let interrupt = cancel_on_interrupt(ctx.ops.gate(), ScanKind::LargeItems);
    let spinner = (!ctx.json).then(|| create_spinner("Starting scan"));

    let response = ctx
        .ops
        .scan_large_items(&options, |progress| {
            if let Some(spinner) = &spinner {
                show_scan_progress(spinner, progress);
            }
        })
        .await;

    interrupt.abort();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if ctx.json {
        return print_json(&response);
    }

    if let Some(error) = &response.error {
        println!("{} {}", style("✗").red(), error);
        return Ok(());
    }

    if response.cancelled {
        println!(
            "{} Scan cancelled, showing {} partial result(s)",
            style("!").yellow(),
            response.results.len()
        );
    }

    if response.results.is_empty() {
        println!("{}", style("No large items found").yellow());
    } else {
        print_hits(&response.results);
    }

    println!("\n{} Scan finished", style("✓").green());
    println!("  Entries scanned: {}", style(response.scanned_count).cyan());
    println!("  Items found: {}", style(response.results.len()).cyan());
    println!("  Total size: {}", style(format_bytes(response.total_size)).cyan());
    println!(
        "  Duration: {}",
        style(format_duration(Duration::from_secs(response.duration_secs))).dim()
    );
    if response.error_count > 0 {
        println!("  Unreadable entries: {}", style(response.error_count).yellow());
    }

    if args.dispose && !response.results.is_empty() {
        dispose_hits(ctx, &response.results).await?;
    }

    Ok(())
}

fn print_hits(hits: &[ScanHit]) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Tier").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
        Cell::new("Kind").fg(Color::Cyan),
        Cell::new("Path").fg(Color::Cyan),
        Cell::new("Note").fg(Color::Cyan),
    ]);

    for (i, hit) in hits.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            tier_cell(hit.classification.tier),
            Cell::new(format_bytes(hit.size)),
            Cell::new(if hit.is_directory { "dir" } else { "file" }),
            Cell::new(hit.path.display()),
            Cell::new(&hit.classification.description),
        ]);
    }

    println!("{}", table);
}

async fn dispose_hits(ctx: &Context, hits: &[ScanHit]) -> Result<()> {
    let labels: Vec<String> = hits
        .iter()
        .map(|h| {
            format!(
                "[{}] {} {}",
                h.classification.tier,
                format_bytes(h.size),
                h.path.display()
            )
        })
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt("Select items to remove (safe: delete, caution: quarantine)")
        .items(&labels)
        .interact()?;

    let mut freed = 0u64;
    for index in chosen {
        let hit = &hits[index];
        let confirmed = if hit.classification.tier.needs_confirmation() {
            let ok = Confirm::new()
                .with_prompt(format!(
                    "{} is classified {}. Quarantine it anyway?",
                    hit.path.display(),
                    hit.classification.tier
                ))
                .default(false)
                .interact()?;
            if !ok {
                println!("  {} Skipped {}", style("-").dim(), hit.path.display());
                continue;
            }
            true
        } else {
            false
        };

        match dispose(hit, confirmed, ctx.ops.store(), ctx.ops.delete_options()).await {
            Ok(disposal) => {
                freed += disposal.freed();
                match disposal {
                    Disposal::Deleted(outcome) => println!(
                        "  {} Deleted {} ({})",
                        style("✓").green(),
                        hit.path.display(),
                        format_bytes(outcome.freed)
                    ),
                    Disposal::Quarantined(entry) => println!(
                        "  {} Quarantined {} as {}",
                        style("✓").green(),
                        hit.path.display(),
                        style(&entry.id).dim()
                    ),
                }
            }
            Err(e) => println!("  {} {}: {}", style("✗").red(), hit.path.display(), e),
        }
    }

    println!("\n{} Freed {}", style("✓").green(), style(format_bytes(freed)).cyan());
    Ok(())
}

pub async fn handle_overview_command(ctx: &Context, roots: Vec<PathBuf>) -> Result<()> {
    let mut options = ctx.ops.settings().overview.clone();
    if !roots.is_empty() {
        options.roots = roots;
    }

    let interrupt = cancel_on_interrupt(ctx.ops.gate(), ScanKind::Overview);
    let spinner = (!ctx.json).then(|| create_spinner("Measuring top-level folders"));
    let response = ctx.ops.scan_volume_overview(&options).await;
    interrupt.abort();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    if ctx.json {
        return print_json(&response);
    }

    if let Some(error) = &response.error {
        println!("{} {}", style("✗").red(), error);
        return Ok(());
    }
    if response.cancelled {
        println!("{} Overview cancelled, results are partial", style("!").yellow());
    }

    for node in &response.nodes {
        println!(
            "\n{} {}",
            style(node.path.display()).bold(),
            style(format_bytes(node.total_size)).cyan()
        );
        println!("{}", style("─".repeat(80)).dim());

        if node.children.is_empty() {
            println!("{}", style("Nothing above the reporting threshold").dim());
            continue;
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            Cell::new("Folder").fg(Color::Cyan),
            Cell::new("Size").fg(Color::Cyan),
            Cell::new("Path").fg(Color::Cyan),
        ]);
        for child in &node.children {
            table.add_row(vec![
                Cell::new(&child.name),
                Cell::new(format_bytes(child.total_size)),
                Cell::new(child.path.display()),
            ]);
        }
        println!("{}", table);
    }

    Ok(())
}
