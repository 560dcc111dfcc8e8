//! Orgdesk CLI - Search state and hierarchy tooling for organization data.

use clap::Parser;
use orgdesk::cli::{Cli, Commands, ConfigCommands, SearchCommands, TreeCommands};
use orgdesk::commands::{self, Output};
use orgdesk::config::{ConfigOverrides, OutputFormat, ResolvedConfig, resolve_config};
use orgdesk::search::SearchAction;
use orgdesk::storage::Session;
use std::env;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable controlling log verbosity (e.g. `OD_LOG=debug`).
const LOG_ENV: &str = "OD_LOG";

fn main() {
    init_logging();

    let cli = Cli::parse();
    let mut human = cli.human_readable;

    let result = resolve_workspace(cli.workspace).and_then(|workspace| {
        tracing::debug!(workspace = %workspace.display(), "opening session");
        let session = Session::open(&workspace)?;

        let mut overrides = ConfigOverrides::new();
        if let Some(size) = cli.page_size {
            overrides = overrides.with_default_page_size(size);
        }
        // `config set` repairs config.kdl, so it must not depend on parsing it
        let config = match &cli.command {
            Commands::Config {
                command: ConfigCommands::Set { .. },
            } => ResolvedConfig::default(),
            _ => resolve_config(&session, &overrides)?,
        };
        if *config.output_format() == OutputFormat::Human {
            human = true;
        }

        run_command(cli.command, &session, &config, &overrides, human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the workspace path.
///
/// Priority: -C/--workspace flag > OD_WORKSPACE env var > current directory.
/// An explicit path must exist.
fn resolve_workspace(explicit: Option<PathBuf>) -> orgdesk::Result<PathBuf> {
    match explicit {
        Some(path) if !path.exists() => Err(orgdesk::Error::NotFound(format!(
            "Workspace path does not exist: {}",
            path.display()
        ))),
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?),
    }
}

fn run_command(
    command: Commands,
    session: &Session,
    config: &ResolvedConfig,
    overrides: &ConfigOverrides,
    human: bool,
) -> orgdesk::Result<()> {
    match command {
        Commands::Search { command } => match command {
            SearchCommands::Show { kind } => {
                output(&commands::search_show(session, config, kind)?, human)
            }
            SearchCommands::Options { kind } => output(&commands::search_options(kind), human),
            SearchCommands::Query { kind, text } => output(
                &commands::search_apply(session, config, SearchAction::SetQuery { kind, query: text })?,
                human,
            ),
            SearchCommands::Filter { kind, key, value } => output(
                &commands::search_filter(session, config, kind, &key, &value)?,
                human,
            ),
            SearchCommands::ResetFilters { kind } => output(
                &commands::search_apply(session, config, SearchAction::ResetFilters { kind })?,
                human,
            ),
            SearchCommands::Page { kind, page } => output(
                &commands::search_apply(session, config, SearchAction::SetCurrentPage { kind, page })?,
                human,
            ),
            SearchCommands::PerPage { kind, count } => output(
                &commands::search_apply(
                    session,
                    config,
                    SearchAction::SetItemsPerPage { kind, count },
                )?,
                human,
            ),
            SearchCommands::Reset { kind } => output(
                &commands::search_apply(session, config, SearchAction::ResetEntitySearch { kind })?,
                human,
            ),
            SearchCommands::View { kind, data } => output(
                &commands::search_view(session, config, kind, &data)?,
                human,
            ),
        },
        Commands::Tree { command } => match command {
            TreeCommands::Show { data, parent_field } => {
                let field = parent_field_or_default(parent_field.as_deref(), config);
                output(&commands::tree_show(&data, field)?, human)
            }
            TreeCommands::Check { data, parent_field } => {
                let field = parent_field_or_default(parent_field.as_deref(), config);
                output(&commands::tree_check(&data, field)?, human)
            }
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(session, overrides)?, human),
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(session, &key, &value)?, human)
            }
        },
    }
    Ok(())
}

fn parent_field_or_default<'a>(flag: Option<&'a str>, config: &'a ResolvedConfig) -> &'a str {
    flag.unwrap_or_else(|| config.parent_field())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
