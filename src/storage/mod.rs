//! Storage layer for Orgdesk sessions.
//!
//! Each workspace gets its own session directory holding:
//! - `search-state.json` - the persisted [`SearchStore`]
//! - `config.kdl` - session-level preferences
//!
//! The directory lives under `~/.local/share/orgdesk/<workspace-hash>/`
//! unless `OD_DATA_DIR` points elsewhere. Entity collections themselves are
//! never stored; they are read from JSON exports on demand with
//! [`load_records`].

use crate::config::OrgdeskConfig;
use crate::models::Record;
use crate::search::SearchStore;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use kdl::KdlDocument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Environment variable overriding the session directory.
pub const DATA_DIR_ENV: &str = "OD_DATA_DIR";

/// Environment variable overriding the system config directory.
pub const CONFIG_DIR_ENV: &str = "OD_CONFIG_DIR";

const SEARCH_STATE_FILE: &str = "search-state.json";
const CONFIG_FILE: &str = "config.kdl";

/// The on-disk form of the search store.
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    saved_at: DateTime<Utc>,
    store: SearchStore,
}

/// Session storage for a single workspace.
pub struct Session {
    /// Root directory for this workspace's data
    root: PathBuf,
}

impl Session {
    /// Open (creating if needed) the session for `workspace`.
    pub fn open(workspace: &Path) -> Result<Self> {
        let root = get_session_dir(workspace)?;
        Self::open_with_data_dir(&root)
    }

    /// Open a session rooted at an explicit directory.
    pub fn open_with_data_dir(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Get the root directory of this session.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn search_state_path(&self) -> PathBuf {
        self.root.join(SEARCH_STATE_FILE)
    }

    pub fn config_kdl_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Load the persisted search store, or a fresh one if none was saved.
    ///
    /// `default_page_size` becomes the store's reset target either way.
    pub fn load_search_store(&self, default_page_size: usize) -> Result<SearchStore> {
        let path = self.search_state_path();
        if !path.exists() {
            return Ok(SearchStore::new(default_page_size));
        }

        let content = fs::read_to_string(&path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;
        tracing::debug!(saved_at = %snapshot.saved_at, "loaded search state");

        let mut store = snapshot.store;
        store.set_default_page_size(default_page_size);
        Ok(store)
    }

    /// Persist the search store, replacing any previous snapshot.
    pub fn save_search_store(&self, store: &SearchStore) -> Result<()> {
        let snapshot = StoreSnapshot {
            saved_at: Utc::now(),
            store: store.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        // Uniquely named temp file, renamed over the snapshot in one step
        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.search_state_path())
            .map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Read the session config.kdl. Missing file means an empty config.
    pub fn read_config(&self) -> Result<OrgdeskConfig> {
        read_config_file(&self.config_kdl_path())
    }

    /// Write the session config.kdl.
    pub fn write_config(&self, config: &OrgdeskConfig) -> Result<()> {
        config.validate().map_err(Error::InvalidInput)?;
        fs::write(self.config_kdl_path(), config.to_kdl().to_string())?;
        Ok(())
    }

    /// Path of the system-level config.kdl.
    pub fn system_config_kdl_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join(CONFIG_FILE));
        }
        dirs::config_dir().map(|d| d.join("orgdesk").join(CONFIG_FILE))
    }

    /// Read the system-level config.kdl. Missing file means an empty config.
    pub fn read_system_config() -> Result<OrgdeskConfig> {
        match Self::system_config_kdl_path() {
            Some(path) => read_config_file(&path),
            None => Ok(OrgdeskConfig::new()),
        }
    }
}

fn read_config_file(path: &Path) -> Result<OrgdeskConfig> {
    if !path.exists() {
        return Ok(OrgdeskConfig::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|e| Error::Other(format!("Failed to read {}: {}", path.display(), e)))?;

    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Other(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;

    Ok(OrgdeskConfig::from_kdl(&doc))
}

/// Get the session directory for a workspace.
///
/// Uses `OD_DATA_DIR` when set, otherwise a hash of the canonical workspace
/// path under the platform data directory.
pub fn get_session_dir(workspace: &Path) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let data_dir = dirs::data_dir()
        .ok_or_else(|| Error::Other("Could not determine data directory".to_string()))?;

    let canonical = workspace
        .canonicalize()
        .map_err(|e| Error::Other(format!("Could not canonicalize workspace path: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let hash_hex = format!("{:x}", hasher.finalize());

    Ok(data_dir.join("orgdesk").join(&hash_hex[..12]))
}

/// Load records from a JSON export.
///
/// Accepts either a top-level array of objects or an object with a `data`
/// array (the backend's list envelope). Entries without a usable `id` are
/// skipped.
pub fn load_records(path: &Path, parent_field: &str) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::NotFound(format!("{}: {}", path.display(), e)))?;
    let value: Value = serde_json::from_str(&content)?;
    parse_records(value, parent_field)
}

/// Parse records out of an already-decoded JSON document.
pub fn parse_records(value: Value, parent_field: &str) -> Result<Vec<Record>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidInput(
                    "expected a JSON array or an object with a \"data\" array".to_string(),
                ));
            }
        },
        _ => {
            return Err(Error::InvalidInput(
                "expected a JSON array or an object with a \"data\" array".to_string(),
            ));
        }
    };

    let total = items.len();
    let records: Vec<Record> = items
        .into_iter()
        .filter_map(|item| Record::from_value(item, parent_field))
        .collect();
    if records.len() < total {
        tracing::warn!(
            skipped = total - records.len(),
            "skipped records without a usable id"
        );
    }
    Ok(records)
}
