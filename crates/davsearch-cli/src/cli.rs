//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// davsearch - search the calendars and task lists of a user
#[derive(Debug, Parser)]
#[command(name = "davsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DAVSEARCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the calendar tree (overrides `[store] root`)
    #[arg(long, env = "DAVSEARCH_ROOT")]
    pub root: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Which providers a search runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SearchKind {
    /// Events only
    Events,
    /// Tasks only
    Tasks,
    /// Events, then tasks
    #[default]
    All,
}

impl SearchKind {
    /// Returns true if events are searched.
    pub fn events(&self) -> bool {
        matches!(self, Self::Events | Self::All)
    }

    /// Returns true if tasks are searched.
    pub fn tasks(&self) -> bool {
        matches!(self, Self::Tasks | Self::All)
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search events and tasks of a user
    Search {
        /// User id (the principal is principals/users/<USER>)
        user: String,

        /// Search term
        term: String,

        /// What to search
        #[arg(long, value_enum, default_value_t = SearchKind::All)]
        kind: SearchKind,

        /// Page size (defaults to `[search] default_limit`)
        #[arg(long)]
        limit: Option<usize>,

        /// Cursor returned by a previous search
        #[arg(long, default_value_t = 0)]
        cursor: usize,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// List the calendars and subscriptions of a user
    Containers {
        /// User id
        user: String,

        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Dump,
    /// Check the configuration
    Validate,
    /// Print the configuration file path
    Path,
}
