use crate::index::ScanProgress;
use crate::util::format::format_bytes;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len}")
            .expect("valid progress template")
            .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("valid spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(message.to_string());
    spinner
}

/// Renders a scanner progress report onto a spinner line.
pub fn show_scan_progress(spinner: &ProgressBar, progress: &ScanProgress) {
    spinner.set_message(format!(
        "{} entries, {} found ({}) in {}",
        progress.scanned_count,
        progress.found_count,
        format_bytes(progress.found_bytes),
        progress.current_path.display()
    ));
}
