//! CLI argument definitions for Orgdesk.

use crate::search::EntityKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("OD_GIT_COMMIT"),
    ", built ",
    env!("OD_BUILD_TIMESTAMP"),
    ")"
);

/// Orgdesk - Search state and hierarchy tooling for organization data.
///
/// Search state (query, filters, page) is kept per entity kind and persists
/// between invocations. Entity data is read from JSON exports with `--data`.
#[derive(Parser, Debug)]
#[command(name = "od")]
#[command(author, version, long_version = LONG_VERSION, about = "Search, filter and assemble hierarchies over organization data", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Run as if od was started in <path> instead of the current directory.
    /// Selects which session directory holds the search state.
    /// Can also be set via OD_WORKSPACE environment variable.
    #[arg(short = 'C', long = "workspace", global = true, env = "OD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Override the default page size for this invocation
    #[arg(long = "page-size", global = true)]
    pub page_size: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search, filter and pagination state per entity kind
    Search {
        #[command(subcommand)]
        command: SearchCommands,
    },

    /// Build and inspect parent/child hierarchies
    Tree {
        #[command(subcommand)]
        command: TreeCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Search subcommands
///
/// `<kind>` is one of: employees, departments, job-titles, tasks, attachments.
#[derive(Subcommand, Debug)]
pub enum SearchCommands {
    /// Show the current search state
    Show {
        /// Entity kind
        kind: EntityKind,
    },

    /// List searchable fields and available filters
    Options {
        /// Entity kind
        kind: EntityKind,
    },

    /// Set the search query (returns to page 1)
    Query {
        /// Entity kind
        kind: EntityKind,
        /// Search text (empty clears the query)
        #[arg(default_value = "")]
        text: String,
    },

    /// Set or clear one filter (returns to page 1)
    Filter {
        /// Entity kind
        kind: EntityKind,
        /// Filter key (e.g., status, isActive)
        key: String,
        /// Filter value; "null", "none" or "" clears it
        #[arg(default_value = "")]
        value: String,
    },

    /// Clear all filters (returns to page 1)
    ResetFilters {
        /// Entity kind
        kind: EntityKind,
    },

    /// Go to a page
    Page {
        /// Entity kind
        kind: EntityKind,
        /// 1-based page number
        page: usize,
    },

    /// Set items per page (returns to page 1)
    PerPage {
        /// Entity kind
        kind: EntityKind,
        /// Items per page
        count: usize,
    },

    /// Reset query, filters and paging to defaults
    Reset {
        /// Entity kind
        kind: EntityKind,
    },

    /// Show the current page of a data file under the saved search state
    View {
        /// Entity kind
        kind: EntityKind,
        /// JSON file with an array of records (or {"data": [...]})
        #[arg(long)]
        data: PathBuf,
    },
}

/// Tree subcommands
#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Render records as an indented forest, depth-first
    Show {
        /// JSON file with an array of records (or {"data": [...]})
        #[arg(long)]
        data: PathBuf,
        /// Field holding the parent id (default: parentId)
        #[arg(long = "parent-field")]
        parent_field: Option<String>,
    },

    /// Report duplicate ids, missing parents and cycles
    Check {
        /// JSON file with an array of records (or {"data": [...]})
        #[arg(long)]
        data: PathBuf,
        /// Field holding the parent id (default: parentId)
        #[arg(long = "parent-field")]
        parent_field: Option<String>,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration values and their sources
    Show,

    /// Set a configuration value in the session config
    Set {
        /// Configuration key (default-page-size, output-format, parent-field)
        key: String,
        /// Configuration value
        value: String,
    },
}
