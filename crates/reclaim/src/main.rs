mod cli;

use clap::Parser;
use cli::scan::ScanArgs;
use cli::{Cli, Commands, Context};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let ctx = Context::new(&cli)?;

    match cli.command {
        Commands::Measure { path } => cli::inspect::handle_measure_command(&ctx, &path)?,

        Commands::Classify { paths } => cli::inspect::handle_classify_command(&ctx, &paths)?,

        Commands::Overview { roots } => cli::scan::handle_overview_command(&ctx, roots).await?,

        Commands::Scan {
            roots,
            min_size,
            max_results,
            exclude,
            no_default_excludes,
            dispose,
        } => {
            let args = ScanArgs {
                roots,
                min_size,
                max_results,
                exclude,
                no_default_excludes,
                dispose,
            };
            cli::scan::handle_scan_command(&ctx, args).await?
        }

        Commands::Targets => cli::clean::handle_targets_command(&ctx)?,

        Commands::Clean { ids, yes } => cli::clean::handle_clean_command(&ctx, &ids, yes).await?,

        Commands::Suggest => cli::clean::handle_suggest_command(&ctx)?,

        Commands::Delete { path, yes } => {
            cli::clean::handle_delete_command(&ctx, &path, yes).await?
        }

        Commands::Quarantine { action } => {
            cli::quarantine::handle_quarantine_command(&ctx, action).await?
        }
    }

    Ok(())
}
