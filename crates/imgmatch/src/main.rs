mod cli;
mod commands;
mod config;
mod report;

use clap::Parser;
use config::{CliOverrides, ResolvedConfig};
use tracing_subscriber::EnvFilter;

use crate::commands::SearchView;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("imgmatch=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    let code = match cli.command {
        cli::Command::Init { corpus, force } => {
            commands::init(&corpus, force)?;
            0
        }
        cli::Command::Compare {
            first,
            second,
            diff,
            always_diff,
            json,
            options,
        } => {
            let overrides = CliOverrides {
                diff: options,
                ..CliOverrides::default()
            };
            let config = ResolvedConfig::new(overrides)?;
            let output = commands::DiffOutput::new(diff, always_diff);
            commands::compare(config, &first, &second, output, json).await?
        }
        cli::Command::Search {
            query,
            top,
            min_similarity,
            json,
            search,
            options,
        } => {
            let overrides = CliOverrides {
                diff: options,
                search,
            };
            let config = ResolvedConfig::new(overrides)?;
            let view = SearchView::from_flags(top, min_similarity);
            commands::search(config, &query, view, json).await?
        }
        cli::Command::Convert {
            input,
            output,
            quality,
        } => {
            commands::convert(&input, output.as_deref(), quality)?;
            0
        }
    };

    std::process::exit(code);
}
