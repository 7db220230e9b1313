pub mod expand;
pub mod format;
pub mod progress;

pub use expand::{expand_path, home_dir};
pub use format::{format_bytes, format_duration, format_timestamp, parse_size};
pub use progress::{create_progress_bar, create_spinner, show_scan_progress};
