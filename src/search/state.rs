//! Keyed search state and the actions that mutate it.
//!
//! One [`SearchState`] slice exists per [`EntityKind`]. Slices change only
//! through [`SearchAction`]s applied by [`reduce`]: each action reads the
//! current slice and replaces it whole, and every action except
//! `SetCurrentPage` sends the slice back to page 1.

use super::{FilterValue, Filters};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Page size used when nothing else is configured.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// The screen / domain a search slice belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Employees,
    Departments,
    JobTitles,
    Tasks,
    Attachments,
}

impl EntityKind {
    /// Get all entity kinds.
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Employees,
            EntityKind::Departments,
            EntityKind::JobTitles,
            EntityKind::Tasks,
            EntityKind::Attachments,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Employees => "employees",
            EntityKind::Departments => "departments",
            EntityKind::JobTitles => "job_titles",
            EntityKind::Tasks => "tasks",
            EntityKind::Attachments => "attachments",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "employees" => Ok(EntityKind::Employees),
            "departments" => Ok(EntityKind::Departments),
            "job_titles" => Ok(EntityKind::JobTitles),
            "tasks" => Ok(EntityKind::Tasks),
            "attachments" => Ok(EntityKind::Attachments),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

/// Query, filters and pagination for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    pub query: String,
    #[serde(default)]
    pub filters: Filters,
    pub current_page: usize,
    pub items_per_page: usize,
}

impl SearchState {
    /// Empty query, no filters, first page.
    pub fn new(items_per_page: usize) -> Self {
        Self {
            query: String::new(),
            filters: Filters::new(),
            current_page: 1,
            items_per_page: items_per_page.max(1),
        }
    }

    /// Filters that currently constrain results.
    pub fn active_filters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters
            .iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key.as_str(), v)))
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

/// A state change for one entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchAction {
    SetQuery {
        kind: EntityKind,
        query: String,
    },
    SetFilter {
        kind: EntityKind,
        key: String,
        value: Option<FilterValue>,
    },
    ResetFilters {
        kind: EntityKind,
    },
    SetCurrentPage {
        kind: EntityKind,
        page: usize,
    },
    SetItemsPerPage {
        kind: EntityKind,
        count: usize,
    },
    ResetEntitySearch {
        kind: EntityKind,
    },
}

impl SearchAction {
    /// The slice this action addresses.
    pub fn kind(&self) -> EntityKind {
        match self {
            SearchAction::SetQuery { kind, .. }
            | SearchAction::SetFilter { kind, .. }
            | SearchAction::ResetFilters { kind }
            | SearchAction::SetCurrentPage { kind, .. }
            | SearchAction::SetItemsPerPage { kind, .. }
            | SearchAction::ResetEntitySearch { kind } => *kind,
        }
    }
}

/// Compute the slice that replaces `state` after `action`.
///
/// `default_page_size` is what `ResetEntitySearch` restores. A page size of 0
/// is raised to 1.
pub fn reduce(state: &SearchState, action: &SearchAction, default_page_size: usize) -> SearchState {
    match action {
        SearchAction::SetQuery { query, .. } => SearchState {
            query: query.clone(),
            current_page: 1,
            ..state.clone()
        },
        SearchAction::SetFilter { key, value, .. } => {
            let mut filters = state.filters.clone();
            filters.insert(key.clone(), value.clone());
            SearchState {
                filters,
                current_page: 1,
                ..state.clone()
            }
        }
        SearchAction::ResetFilters { .. } => SearchState {
            filters: Filters::new(),
            current_page: 1,
            ..state.clone()
        },
        SearchAction::SetCurrentPage { page, .. } => SearchState {
            current_page: *page,
            ..state.clone()
        },
        SearchAction::SetItemsPerPage { kind, count } => {
            if *count == 0 {
                tracing::warn!(%kind, "items per page must be at least 1, using 1");
            }
            SearchState {
                items_per_page: (*count).max(1),
                current_page: 1,
                ..state.clone()
            }
        }
        SearchAction::ResetEntitySearch { .. } => SearchState::new(default_page_size),
    }
}

/// Search state for every entity kind, mutated only through actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStore {
    default_page_size: usize,
    slices: BTreeMap<EntityKind, SearchState>,
}

impl SearchStore {
    /// Create a store with a fresh slice for every entity kind.
    pub fn new(default_page_size: usize) -> Self {
        let default_page_size = default_page_size.max(1);
        let slices = EntityKind::all()
            .iter()
            .map(|kind| (*kind, SearchState::new(default_page_size)))
            .collect();
        Self {
            default_page_size,
            slices,
        }
    }

    pub fn default_page_size(&self) -> usize {
        self.default_page_size
    }

    /// Change the page size used by future resets. Existing slices keep theirs.
    pub fn set_default_page_size(&mut self, size: usize) {
        self.default_page_size = size.max(1);
    }

    /// Current state for `kind`.
    pub fn state(&self, kind: EntityKind) -> SearchState {
        self.slices
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| SearchState::new(self.default_page_size))
    }

    /// Apply one action and return the new slice.
    pub fn dispatch(&mut self, action: SearchAction) -> SearchState {
        let kind = action.kind();
        let next = reduce(&self.state(kind), &action, self.default_page_size);
        tracing::debug!(?action, "search state updated");
        self.slices.insert(kind, next.clone());
        next
    }

    pub fn set_query(&mut self, kind: EntityKind, query: impl Into<String>) -> SearchState {
        self.dispatch(SearchAction::SetQuery {
            kind,
            query: query.into(),
        })
    }

    pub fn set_filter(
        &mut self,
        kind: EntityKind,
        key: impl Into<String>,
        value: Option<FilterValue>,
    ) -> SearchState {
        self.dispatch(SearchAction::SetFilter {
            kind,
            key: key.into(),
            value,
        })
    }

    pub fn reset_filters(&mut self, kind: EntityKind) -> SearchState {
        self.dispatch(SearchAction::ResetFilters { kind })
    }

    /// Set the page verbatim. Clamping to the valid range is the caller's job.
    pub fn set_current_page(&mut self, kind: EntityKind, page: usize) -> SearchState {
        self.dispatch(SearchAction::SetCurrentPage { kind, page })
    }

    pub fn set_items_per_page(&mut self, kind: EntityKind, count: usize) -> SearchState {
        self.dispatch(SearchAction::SetItemsPerPage { kind, count })
    }

    pub fn reset_entity_search(&mut self, kind: EntityKind) -> SearchState {
        self.dispatch(SearchAction::ResetEntitySearch { kind })
    }
}

impl Default for SearchStore {
    fn default() -> Self {
        Self::new(DEFAULT_ITEMS_PER_PAGE)
    }
}

/// A [`SearchStore`] shared between threads with a single writer at a time.
///
/// Each dispatch holds the lock for exactly one action, so concurrent callers
/// observe actions applied one after another in lock order.
#[derive(Debug, Clone, Default)]
pub struct SharedSearchStore {
    inner: Arc<Mutex<SearchStore>>,
}

impl SharedSearchStore {
    pub fn new(store: SearchStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, SearchStore>> {
        self.inner
            .lock()
            .map_err(|_| Error::Other("search store lock poisoned".to_string()))
    }

    pub fn dispatch(&self, action: SearchAction) -> Result<SearchState> {
        Ok(self.lock()?.dispatch(action))
    }

    pub fn state(&self, kind: EntityKind) -> Result<SearchState> {
        Ok(self.lock()?.state(kind))
    }

    /// A copy of the whole store, e.g. for persistence.
    pub fn snapshot(&self) -> Result<SearchStore> {
        Ok(self.lock()?.clone())
    }
}
