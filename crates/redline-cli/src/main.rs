//! Redline CLI - rewrite suggestions for flagged writing issues.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the stderr log subscriber. `REDLINE_LOG` takes precedence.
fn init_tracing(verbose: bool) {
    let default = if verbose { "redline=debug" } else { "redline=warn" };
    let filter = EnvFilter::try_from_env("REDLINE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Suggest {
            issues,
            config,
            kb,
            cache,
            no_cache,
            mock,
            endpoint,
            model_host,
            workers,
            output,
            json,
        } => commands::suggest::run(commands::suggest::SuggestArgs {
            issues,
            config,
            kb,
            cache,
            no_cache,
            mock,
            endpoint: endpoint.map(Into::into),
            model_host,
            workers,
            output,
            json,
            verbose: cli.verbose,
        }),

        Commands::Classify { issues, kb, json } => commands::classify::run(issues, kb, json),

        Commands::Prompt { issues, index, kb } => commands::prompt::run(issues, index, kb),

        Commands::Kb { kb } => commands::kb::run(kb, cli.verbose),

        Commands::Cache { action, cache } => commands::cache::run(action, cache),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
