use crate::cli::output::print_json;
use crate::cli::Context;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use dialoguer::Confirm;
use reclaim_lib::util::{expand_path, format_bytes, format_timestamp};
use reclaim_lib::{MetadataLayout, Result};

#[derive(Subcommand)]
pub enum QuarantineCommands {
    #[command(about = "List quarantined items, newest first")]
    List,

    #[command(about = "Move a path into quarantine")]
    Add {
        path: String,
    },

    #[command(about = "Move a quarantined item back to its original location")]
    Restore {
        #[arg(help = "Entry id or quarantine path")]
        entry: String,
    },

    #[command(about = "Delete a quarantined item permanently")]
    Purge {
        #[arg(help = "Entry id or quarantine path")]
        entry: String,

        #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle_quarantine_command(ctx: &Context, action: QuarantineCommands) -> Result<()> {
    match action {
        QuarantineCommands::List => list_entries(ctx),
        QuarantineCommands::Add { path } => add_entry(ctx, &path),
        QuarantineCommands::Restore { entry } => restore_entry(ctx, &entry),
        QuarantineCommands::Purge { entry, yes } => purge_entry(ctx, &entry, yes).await,
    }
}

fn list_entries(ctx: &Context) -> Result<()> {
    let entries = ctx.ops.list_quarantine();

    if ctx.json {
        return print_json(&entries);
    }

    if entries.is_empty() {
        println!(
            "{} (quarantine area: {})",
            style("Nothing in quarantine").yellow(),
            ctx.ops.store().root().display()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Original Path").fg(Color::Cyan),
        Cell::new("Size").fg(Color::Cyan),
        Cell::new("Moved").fg(Color::Cyan),
        Cell::new("Format").fg(Color::Cyan),
    ]);

    let mut total = 0u64;
    for entry in &entries {
        total += entry.size;
        table.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(entry.original_path.display()),
            Cell::new(format_bytes(entry.size)),
            Cell::new(format_timestamp(&entry.moved_at)),
            Cell::new(match entry.layout {
                MetadataLayout::Sidecar => "current",
                MetadataLayout::Legacy => "legacy",
            }),
        ]);
    }

    println!("{}", table);
    println!(
        "\n{} item(s), {} held in {}",
        entries.len(),
        style(format_bytes(total)).cyan(),
        ctx.ops.store().root().display()
    );
    Ok(())
}

fn add_entry(ctx: &Context, path: &str) -> Result<()> {
    let path = expand_path(path)?;
    let response = ctx.ops.relocate_to_quarantine(&path, path.is_dir());

    if ctx.json {
        return print_json(&response);
    }

    match (&response.error, &response.quarantine_path) {
        (None, Some(dest)) => println!(
            "{} Quarantined {} ({}) to {}",
            style("✓").green(),
            path.display(),
            format_bytes(response.freed_space),
            dest.display()
        ),
        (error, _) => println!(
            "{} Could not quarantine {}: {}",
            style("✗").red(),
            path.display(),
            error.as_deref().unwrap_or("unknown error")
        ),
    }
    Ok(())
}

fn restore_entry(ctx: &Context, entry: &str) -> Result<()> {
    let response = ctx.ops.restore_from_quarantine(entry);

    if ctx.json {
        return print_json(&response);
    }

    if response.success {
        println!(
            "{} Restored {} ({})",
            style("✓").green(),
            entry,
            format_bytes(response.restored_size)
        );
    } else {
        println!(
            "{} Could not restore {}: {}",
            style("✗").red(),
            entry,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn purge_entry(ctx: &Context, entry: &str, yes: bool) -> Result<()> {
    if !yes && !ctx.json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Permanently delete {}? This cannot be undone", entry))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", style("Aborted").yellow());
            return Ok(());
        }
    }

    let response = ctx.ops.purge_from_quarantine(entry).await;

    if ctx.json {
        return print_json(&response);
    }

    if response.success {
        println!(
            "{} Purged {} ({})",
            style("✓").green(),
            entry,
            format_bytes(response.deleted_size)
        );
    } else {
        println!(
            "{} Could not purge {}: {}",
            style("✗").red(),
            entry,
            response.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
