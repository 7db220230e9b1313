pub mod clean;
pub mod inspect;
pub mod quarantine;
pub mod scan;
mod output;

use clap::{Parser, Subcommand};
use reclaim_lib::{Config, Operations, Result};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "reclaim")]
#[command(about = "Find reclaimable disk space and remove it safely", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Quarantine directory (overrides RECLAIM_QUARANTINE)")]
    pub quarantine: Option<PathBuf>,

    #[arg(long, global = true, help = "Path to reclaim.toml")]
    pub config: Option<PathBuf>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Print machine-readable JSON instead of tables")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Measure the total size of a path")]
    Measure {
        #[arg(help = "Path to measure (~ and environment variables are expanded)")]
        path: String,
    },

    #[command(about = "Show the largest top-level folders of the volume")]
    Overview {
        #[arg(help = "Top-level directories to measure (defaults from settings)")]
        roots: Vec<PathBuf>,
    },

    #[command(about = "Find large files and cache folders")]
    Scan {
        #[arg(help = "Directories to scan (defaults from settings)")]
        roots: Vec<PathBuf>,

        #[arg(long, value_parser = reclaim_lib::util::parse_size, help = "Minimum item size, e.g. 500MB")]
        min_size: Option<u64>,

        #[arg(long, help = "Maximum number of results")]
        max_results: Option<usize>,

        #[arg(long = "exclude", help = "Additional path substring to skip (repeatable)")]
        exclude: Vec<String>,

        #[arg(long, help = "Do not apply the built-in exclusion list")]
        no_default_excludes: bool,

        #[arg(long, help = "Pick results to delete or quarantine after the scan")]
        dispose: bool,
    },

    #[command(about = "Show the safety tier of one or more paths")]
    Classify {
        #[arg(required = true, help = "Paths to classify")]
        paths: Vec<String>,
    },

    #[command(about = "Measure the built-in cleanup targets")]
    Targets,

    #[command(about = "Empty cleanup targets by id")]
    Clean {
        #[arg(required = true, help = "Target ids (see `reclaim targets`)")]
        ids: Vec<String>,

        #[arg(long, short = 'y', help = "Do not ask before emptying targets that hold user data")]
        yes: bool,
    },

    #[command(about = "Suggest old downloads and large desktop files")]
    Suggest,

    #[command(about = "Permanently delete a path, reporting the space freed")]
    Delete {
        path: String,

        #[arg(long, short = 'y', help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "Manage the quarantine area")]
    Quarantine {
        #[command(subcommand)]
        action: quarantine::QuarantineCommands,
    },
}

/// Resolved configuration shared by every subcommand handler.
pub struct Context {
    pub ops: Operations,
    pub json: bool,
    pub verbose: bool,
}

impl Context {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = Config::new(cli.quarantine.clone(), cli.config.clone())?;
        let settings = config.load_settings()?;
        let ops = Operations::new(&config, settings)?;
        Ok(Self {
            ops,
            json: cli.json,
            verbose: cli.verbose,
        })
    }
}
