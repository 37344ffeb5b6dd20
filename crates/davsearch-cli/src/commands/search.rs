//! The `search` command.

use std::fmt::Write;
use std::path::Path;
use std::sync::Arc;

use davsearch_engine::PrincipalSearch;
use davsearch_providers::{
    EventsSearchProvider, FeatureGate, ProviderQuery, SearchProvider, SearchResult,
    TasksSearchProvider, UrlGenerator, User,
};

use crate::cli::SearchKind;
use crate::commands::open_engine;
use crate::config::AppConfig;
use crate::error::CliResult;

/// Arguments of one search.
#[derive(Debug, Clone)]
pub struct SearchArgs {
    /// User id.
    pub user: String,
    /// Search term.
    pub term: String,
    /// Providers to run.
    pub kind: SearchKind,
    /// Page size; `None` uses the configured default.
    pub limit: Option<usize>,
    /// Offset of the page.
    pub cursor: usize,
    /// Print JSON instead of text.
    pub json: bool,
}

/// Builds the providers selected by `kind`, in provider order.
pub fn providers(
    config: &AppConfig,
    engine: Arc<dyn PrincipalSearch>,
    kind: SearchKind,
) -> CliResult<Vec<Box<dyn SearchProvider>>> {
    let features: Arc<dyn FeatureGate> = Arc::new(config.feature_gate());
    let urls: Arc<dyn UrlGenerator> = Arc::new(config.url_generator()?);

    let mut providers: Vec<Box<dyn SearchProvider>> = Vec::new();
    if kind.events() {
        providers.push(Box::new(
            EventsSearchProvider::events(engine.clone(), features.clone(), urls.clone())
                .with_options(config.display.clone()),
        ));
    }
    if kind.tasks() {
        providers.push(Box::new(
            TasksSearchProvider::tasks(engine, features, urls).with_options(config.display.clone()),
        ));
    }
    providers.sort_by_key(|provider| provider.order());
    Ok(providers)
}

/// Runs every provider for the same request, stopping at the first error.
pub async fn collect(
    providers: &[Box<dyn SearchProvider>],
    user: &User,
    query: &ProviderQuery,
) -> CliResult<Vec<SearchResult>> {
    let mut results = Vec::with_capacity(providers.len());
    for provider in providers {
        results.push(provider.search(user, query).await?);
    }
    Ok(results)
}

/// Renders results for a terminal.
pub fn render(results: &[SearchResult]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", result.name);
        if result.is_empty() {
            let _ = writeln!(out, "  no results");
        }
        for entry in &result.entries {
            if entry.subline.is_empty() {
                let _ = writeln!(out, "  {}", entry.title);
            } else {
                let _ = writeln!(out, "  {}  {}", entry.title, entry.subline);
            }
        }
        if let Some(cursor) = result.cursor {
            let _ = writeln!(out, "  next cursor: {cursor}");
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Search a user's calendar tree and print the results.
pub async fn run(config: &AppConfig, root: &Path, args: SearchArgs) -> CliResult<()> {
    let engine = open_engine(root, config.engine_config()?).await?;
    let providers = providers(config, Arc::new(engine), args.kind)?;

    let user = User::new(args.user);
    let query = ProviderQuery::new(args.term)
        .with_limit(args.limit.unwrap_or(config.search.default_limit))
        .with_cursor(args.cursor);
    let results = collect(&providers, &user, &query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        println!("{}", render(&results));
    }
    Ok(())
}
