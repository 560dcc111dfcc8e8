//! KDL schema for config.kdl.
//!
//! This module provides:
//! - The Rust struct representing the KDL schema
//! - Serialization/deserialization to/from KDL format
//! - Validation and single-key updates for `od config set`

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys accepted in config.kdl.
pub const CONFIG_KEYS: &[&str] = &["default-page-size", "output-format", "parent-field"];

/// Largest page size accepted from configuration.
pub const MAX_PAGE_SIZE: usize = 1000;

/// User preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// default-page-size 25
/// output-format "human"  // or "json"
/// parent-field "parentId"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgdeskConfig {
    /// Items per page for fresh and reset search state
    pub default_page_size: Option<usize>,

    /// Default output format for CLI commands
    pub output_format: Option<OutputFormat>,

    /// JSON key holding the parent reference when building trees
    pub parent_field: Option<String>,
}

impl OrgdeskConfig {
    /// Create an empty config with no values set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    ///
    /// Returns an error message if any value is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(size) = self.default_page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&size) {
                return Err(format!(
                    "default-page-size must be 1-{}, got {}",
                    MAX_PAGE_SIZE, size
                ));
            }
        }
        if let Some(ref field) = self.parent_field {
            if field.trim().is_empty() {
                return Err("parent-field must not be empty".to_string());
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Out-of-range values are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        if let Some(node) = doc.get("default-page-size") {
            if let Some(entry) = node.entries().first() {
                if let Some(i) = entry.value().as_integer() {
                    if (1..=MAX_PAGE_SIZE as i128).contains(&i) {
                        config.default_page_size = Some(i as usize);
                    }
                }
            }
        }

        if let Some(node) = doc.get("output-format") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    config.output_format = OutputFormat::parse(s);
                }
            }
        }

        if let Some(node) = doc.get("parent-field") {
            if let Some(entry) = node.entries().first() {
                if let Some(s) = entry.value().as_string() {
                    if !s.trim().is_empty() {
                        config.parent_field = Some(s.to_string());
                    }
                }
            }
        }

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(size) = self.default_page_size {
            let mut node = KdlNode::new("default-page-size");
            node.push(KdlEntry::new(KdlValue::Integer(size as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(ref format) = self.output_format {
            let mut node = KdlNode::new("output-format");
            node.push(KdlEntry::new(KdlValue::String(format.as_str().to_string())));
            doc.nodes_mut().push(node);
        }

        if let Some(ref field) = self.parent_field {
            let mut node = KdlNode::new("parent-field");
            node.push(KdlEntry::new(KdlValue::String(field.clone())));
            doc.nodes_mut().push(node);
        }

        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &OrgdeskConfig) {
        if other.default_page_size.is_some() {
            self.default_page_size = other.default_page_size;
        }
        if other.output_format.is_some() {
            self.output_format = other.output_format.clone();
        }
        if other.parent_field.is_some() {
            self.parent_field = other.parent_field.clone();
        }
    }

    /// Set one key from its string form, as given to `od config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "default-page-size" => {
                let size = value
                    .parse::<usize>()
                    .map_err(|_| format!("default-page-size must be a number, got {}", value))?;
                self.default_page_size = Some(size);
            }
            "output-format" => {
                let format = OutputFormat::parse(value).ok_or_else(|| {
                    format!("output-format must be 'json' or 'human', got {}", value)
                })?;
                self.output_format = Some(format);
            }
            "parent-field" => self.parent_field = Some(value.to_string()),
            _ => {
                return Err(format!(
                    "Unknown config key: {} (expected one of: {})",
                    key,
                    CONFIG_KEYS.join(", ")
                ));
            }
        }
        self.validate()
    }
}
