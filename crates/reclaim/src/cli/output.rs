use comfy_table::{Cell, Color};
use reclaim_lib::{Result, Tier};
use serde::Serialize;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn tier_color(tier: Tier) -> Color {
    match tier {
        Tier::Safe => Color::Green,
        Tier::Caution => Color::Yellow,
        Tier::Danger => Color::Red,
        Tier::Unknown => Color::Grey,
    }
}

pub fn tier_cell(tier: Tier) -> Cell {
    Cell::new(tier.as_str()).fg(tier_color(tier))
}
