//! Precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Session config.kdl (`<session-dir>/config.kdl`)
//! 3. System config.kdl (`~/.config/orgdesk/config.kdl`)
//! 4. Built-in defaults

use crate::Result;
use crate::config::{OrgdeskConfig, OutputFormat};
use crate::models::Record;
use crate::search::DEFAULT_ITEMS_PER_PAGE;
use crate::storage::Session;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from session-level config
    Session,
    /// Value from system-level config
    System,
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::Session => write!(f, "session"),
            ValueSource::System => write!(f, "system"),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub default_page_size: Resolved<usize>,
    pub output_format: Resolved<OutputFormat>,
    pub parent_field: Resolved<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            default_page_size: Resolved::new(DEFAULT_ITEMS_PER_PAGE, ValueSource::Default),
            output_format: Resolved::new(OutputFormat::Json, ValueSource::Default),
            parent_field: Resolved::new(
                Record::DEFAULT_PARENT_FIELD.to_string(),
                ValueSource::Default,
            ),
        }
    }
}

impl ResolvedConfig {
    pub fn default_page_size(&self) -> usize {
        self.default_page_size.value
    }

    pub fn output_format(&self) -> &OutputFormat {
        &self.output_format.value
    }

    pub fn parent_field(&self) -> &str {
        &self.parent_field.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub default_page_size: Option<usize>,
    pub output_format: Option<OutputFormat>,
    pub parent_field: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_page_size(mut self, size: usize) -> Self {
        self.default_page_size = Some(size);
        self
    }

    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn with_parent_field(mut self, field: impl Into<String>) -> Self {
        self.parent_field = Some(field.into());
        self
    }
}

/// Pick the highest-precedence value among override, session and system.
fn pick<T: Clone>(
    current: Resolved<T>,
    cli: Option<&T>,
    session: Option<&T>,
    system: Option<&T>,
) -> Resolved<T> {
    if let Some(v) = cli {
        Resolved::new(v.clone(), ValueSource::CliFlag)
    } else if let Some(v) = session {
        Resolved::new(v.clone(), ValueSource::Session)
    } else if let Some(v) = system {
        Resolved::new(v.clone(), ValueSource::System)
    } else {
        current
    }
}

/// Resolve already-loaded configs. Split out from [`resolve_config`] so the
/// precedence rules can be exercised without touching the filesystem.
pub fn resolve_from(
    system: &OrgdeskConfig,
    session: &OrgdeskConfig,
    overrides: &ConfigOverrides,
) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();
    let overridden_page_size = overrides.default_page_size.map(|s| s.max(1));
    ResolvedConfig {
        default_page_size: pick(
            defaults.default_page_size,
            overridden_page_size.as_ref(),
            session.default_page_size.as_ref(),
            system.default_page_size.as_ref(),
        ),
        output_format: pick(
            defaults.output_format,
            overrides.output_format.as_ref(),
            session.output_format.as_ref(),
            system.output_format.as_ref(),
        ),
        parent_field: pick(
            defaults.parent_field,
            overrides.parent_field.as_ref(),
            session.parent_field.as_ref(),
            system.parent_field.as_ref(),
        ),
    }
}

/// Resolve configuration with full precedence chain.
pub fn resolve_config(session: &Session, overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    let system_config = Session::read_system_config()?;
    let session_config = session.read_config()?;
    let resolved = resolve_from(&system_config, &session_config, overrides);
    tracing::debug!(
        page_size = resolved.default_page_size(),
        page_size_source = %resolved.default_page_size.source,
        output_format = %resolved.output_format(),
        parent_field = resolved.parent_field(),
        "resolved configuration"
    );
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_set() {
        let resolved = resolve_from(
            &OrgdeskConfig::new(),
            &OrgdeskConfig::new(),
            &ConfigOverrides::new(),
        );
        assert_eq!(resolved.default_page_size(), DEFAULT_ITEMS_PER_PAGE);
        assert_eq!(resolved.default_page_size.source, ValueSource::Default);
        assert_eq!(resolved.output_format(), &OutputFormat::Json);
        assert_eq!(resolved.parent_field(), "parentId");
    }

    #[test]
    fn test_system_config_used() {
        let system = OrgdeskConfig {
            default_page_size: Some(30),
            ..Default::default()
        };
        let resolved = resolve_from(&system, &OrgdeskConfig::new(), &ConfigOverrides::new());
        assert_eq!(resolved.default_page_size(), 30);
        assert_eq!(resolved.default_page_size.source, ValueSource::System);
    }

    #[test]
    fn test_session_beats_system() {
        let system = OrgdeskConfig {
            output_format: Some(OutputFormat::Json),
            ..Default::default()
        };
        let session = OrgdeskConfig {
            output_format: Some(OutputFormat::Human),
            ..Default::default()
        };
        let resolved = resolve_from(&system, &session, &ConfigOverrides::new());
        assert_eq!(resolved.output_format(), &OutputFormat::Human);
        assert_eq!(resolved.output_format.source, ValueSource::Session);
    }

    #[test]
    fn test_cli_beats_everything() {
        let session = OrgdeskConfig {
            parent_field: Some("managerId".to_string()),
            default_page_size: Some(20),
            ..Default::default()
        };
        let overrides = ConfigOverrides::new()
            .with_parent_field("parentTaskId")
            .with_default_page_size(5);
        let resolved = resolve_from(&OrgdeskConfig::new(), &session, &overrides);
        assert_eq!(resolved.parent_field(), "parentTaskId");
        assert_eq!(resolved.parent_field.source, ValueSource::CliFlag);
        assert_eq!(resolved.default_page_size(), 5);
    }

    #[test]
    fn test_zero_page_size_override_is_raised() {
        let overrides = ConfigOverrides::new().with_default_page_size(0);
        let resolved = resolve_from(&OrgdeskConfig::new(), &OrgdeskConfig::new(), &overrides);
        assert_eq!(resolved.default_page_size(), 1);
    }

    #[test]
    fn test_value_source_display() {
        assert_eq!(ValueSource::CliFlag.to_string(), "cli");
        assert_eq!(ValueSource::Default.to_string(), "default");
    }
}
