//! Configuration for Orgdesk.
//!
//! User preferences live in `config.kdl`, at two levels:
//! - System: `~/.config/orgdesk/config.kdl` (or `$OD_CONFIG_DIR/config.kdl`)
//! - Session: `<session-dir>/config.kdl`
//!
//! Recognised nodes:
//! - `default-page-size` - Items per page for fresh search state (1-1000)
//! - `output-format` - "json" or "human"
//! - `parent-field` - JSON key holding the parent reference for trees
//!
//! ## Precedence
//!
//! CLI flag > session config > system config > defaults
//!
//! Use the [`resolver`] module for unified precedence resolution.

pub mod resolver;
pub mod schema;

pub use resolver::{
    ConfigOverrides, Resolved, ResolvedConfig, ValueSource, resolve_config, resolve_from,
};
pub use schema::{CONFIG_KEYS, MAX_PAGE_SIZE, OrgdeskConfig, OutputFormat};
