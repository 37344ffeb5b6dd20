//! davsearch CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use davsearch_cli::cli::{Cli, Command, ConfigAction};
use davsearch_cli::commands::{self, search::SearchArgs};
use davsearch_cli::config::AppConfig;
use davsearch_cli::error::CliResult;
use davsearch_core::init_tracing;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    if let Err(e) = init_tracing(config.tracing_config(cli.debug)?) {
        eprintln!("warning: {}", e);
    }

    let root = cli.root.clone().unwrap_or_else(|| config.store_root());

    match cli.command {
        Command::Search {
            user,
            term,
            kind,
            limit,
            cursor,
            json,
        } => {
            let args = SearchArgs {
                user,
                term,
                kind,
                limit,
                cursor,
                json,
            };
            commands::search::run(&config, &root, args).await
        }
        Command::Containers { user, json } => {
            commands::containers::run(&config, &root, &user, json).await
        }
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(),
        },
    }
}
