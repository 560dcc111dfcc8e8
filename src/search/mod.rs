//! Search, filtering and pagination over entity collections.
//!
//! A [`SearchConfig`] declares, per screen, which fields are text-searchable
//! and which fields can be filtered. [`compute_filtered_view`] combines a
//! collection, the current [`SearchState`] and the config into a
//! [`FilteredView`]. State changes go through the reducer in [`state`].
//!
//! ## Matching rules
//!
//! Search fields are declared with a [`FieldKind`]:
//! - `Text` / `Enum`: case-insensitive substring match on string values
//! - `Number`: the number's canonical string form must contain the query
//! - `Boolean`: never matches a search query
//!
//! A value whose tag disagrees with the declared kind never matches. Filters
//! use strict equality, see [`FilterValue::matches`].

pub mod state;

pub use state::{
    DEFAULT_ITEMS_PER_PAGE, EntityKind, SearchAction, SearchState, SearchStore, SharedSearchStore,
};

use crate::models::{Entity, FieldValue, format_number};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How a searchable field is compared against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    Enum,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum => "enum",
        };
        write!(f, "{}", s)
    }
}

/// A field eligible for query matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchField {
    pub name: String,
    pub kind: FieldKind,
}

impl SearchField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    /// Does `value` contain the query?
    ///
    /// `query_lower` is the lowercased query, used for text comparisons;
    /// `query` is compared verbatim against numbers.
    fn matches(&self, value: &FieldValue, query: &str, query_lower: &str) -> bool {
        match (self.kind, value) {
            (FieldKind::Text | FieldKind::Enum, FieldValue::Text(s) | FieldValue::Enum(s)) => {
                s.to_lowercase().contains(query_lower)
            }
            (FieldKind::Number, FieldValue::Number(n)) => format_number(*n).contains(query),
            _ => false,
        }
    }
}

/// A filter value. `None` in [`Filters`] means the filter is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FilterValue {
    /// Infer a value from user input: `true`/`false`, then numbers, then text.
    ///
    /// Only input already in canonical number form becomes a number, so codes
    /// like `007` or `1e5` stay text. Wrapping the input in double quotes
    /// forces text (`"42"` is the string `42`).
    pub fn infer(raw: &str) -> Self {
        if let Some(inner) = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return FilterValue::Text(inner.to_string());
        }
        match raw {
            "true" => FilterValue::Bool(true),
            "false" => FilterValue::Bool(false),
            _ => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && format_number(*n) == raw)
                .map_or_else(|| FilterValue::Text(raw.to_string()), FilterValue::Number),
        }
    }

    /// Strict equality against an entity field.
    ///
    /// Text equals `Text` or `Enum` with the identical string, numbers equal
    /// numbers, booleans equal booleans. Nothing equals `Null`.
    pub fn matches(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (FilterValue::Text(a), FieldValue::Text(b) | FieldValue::Enum(b)) => a == b,
            (FilterValue::Number(a), FieldValue::Number(b)) => a == b,
            (FilterValue::Bool(a), FieldValue::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{}", b),
            FilterValue::Number(n) => write!(f, "{}", format_number(*n)),
            FilterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Active filters, keyed by field name. `None` means unset.
pub type Filters = BTreeMap<String, Option<FilterValue>>;

/// One selectable value of a filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterChoice {
    /// `None` is the "any" choice that clears the filter
    pub value: Option<FilterValue>,
    pub label: String,
}

impl FilterChoice {
    pub fn new(value: Option<FilterValue>, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// A filterable field and its allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub key: String,
    pub label: String,
    pub choices: Vec<FilterChoice>,
}

impl FilterOption {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            choices: Vec::new(),
        }
    }

    /// Append a choice.
    pub fn choice(mut self, value: Option<FilterValue>, label: impl Into<String>) -> Self {
        self.choices.push(FilterChoice::new(value, label));
        self
    }

    /// Find the choice whose value or label (case-insensitive) equals `raw`.
    pub fn find_choice(&self, raw: &str) -> Option<&FilterChoice> {
        self.choices.iter().find(|c| {
            c.label.eq_ignore_ascii_case(raw)
                || c.value.as_ref().is_some_and(|v| v.to_string() == raw)
        })
    }
}

/// A predicate that replaces per-field equality filtering.
pub type CustomFilterFn<E> = Arc<dyn Fn(&E, &Filters) -> bool + Send + Sync>;

/// Declarative search configuration for one entity kind.
pub struct SearchConfig<E> {
    pub search_fields: Vec<SearchField>,
    pub filter_options: Vec<FilterOption>,
    custom_filter: Option<CustomFilterFn<E>>,
}

impl<E> SearchConfig<E> {
    /// Create a config with no searchable fields and no filters.
    pub fn new() -> Self {
        Self {
            search_fields: Vec::new(),
            filter_options: Vec::new(),
            custom_filter: None,
        }
    }

    pub fn with_search_field(mut self, field: SearchField) -> Self {
        self.search_fields.push(field);
        self
    }

    pub fn with_filter(mut self, option: FilterOption) -> Self {
        self.filter_options.push(option);
        self
    }

    /// Replace default equality filtering with `predicate`.
    pub fn with_custom_filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E, &Filters) -> bool + Send + Sync + 'static,
    {
        self.custom_filter = Some(Arc::new(predicate));
        self
    }

    pub fn has_custom_filter(&self) -> bool {
        self.custom_filter.is_some()
    }

    pub fn filter_option(&self, key: &str) -> Option<&FilterOption> {
        self.filter_options.iter().find(|o| o.key == key)
    }
}

impl<E> Default for SearchConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for SearchConfig<E> {
    fn clone(&self) -> Self {
        Self {
            search_fields: self.search_fields.clone(),
            filter_options: self.filter_options.clone(),
            custom_filter: self.custom_filter.clone(),
        }
    }
}

impl<E> fmt::Debug for SearchConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("search_fields", &self.search_fields)
            .field("filter_options", &self.filter_options)
            .field("custom_filter", &self.custom_filter.is_some())
            .finish()
    }
}

/// A filtered, paginated slice of a collection.
///
/// Entities are borrowed from the input and keep their relative order.
#[derive(Debug)]
pub struct FilteredView<'a, E> {
    /// Every entity passing search and filters
    pub filtered: Vec<&'a E>,
    /// The current page of `filtered`
    pub paginated: Vec<&'a E>,
    pub total_items: usize,
    pub total_pages: usize,
    pub current_page: usize,
    pub items_per_page: usize,
}

impl<E> FilteredView<'_, E> {
    /// Is the current page one of the pages that holds data?
    pub fn page_in_range(&self) -> bool {
        self.current_page >= 1 && self.current_page <= self.total_pages
    }
}

fn matches_search<E: Entity>(entity: &E, query: &str, query_lower: &str, fields: &[SearchField]) -> bool {
    if query.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.matches(&entity.field(&field.name), query, query_lower))
}

fn matches_filters<E: Entity>(entity: &E, filters: &Filters, config: &SearchConfig<E>) -> bool {
    if let Some(predicate) = &config.custom_filter {
        return predicate(entity, filters);
    }
    filters.iter().all(|(key, value)| match value {
        Some(expected) => expected.matches(&entity.field(key)),
        None => true,
    })
}

/// Derive the filtered, paginated view of `entities` for `state`.
///
/// Never fails: an empty collection yields an empty view and a page outside
/// the valid range yields an empty `paginated` list. Page 0 lies before the
/// first page and is always empty.
pub fn compute_filtered_view<'a, E: Entity>(
    entities: &'a [E],
    state: &SearchState,
    config: &SearchConfig<E>,
) -> FilteredView<'a, E> {
    let query_lower = state.query.to_lowercase();

    let filtered: Vec<&E> = entities
        .iter()
        .filter(|e| matches_search(*e, &state.query, &query_lower, &config.search_fields))
        .filter(|e| matches_filters(*e, &state.filters, config))
        .collect();

    let total_items = filtered.len();
    let per_page = state.items_per_page;
    let total_pages = if per_page == 0 {
        0
    } else {
        total_items.div_ceil(per_page)
    };

    let paginated = match state.current_page.checked_sub(1) {
        Some(page_index) if per_page > 0 => filtered
            .iter()
            .skip(page_index.saturating_mul(per_page))
            .take(per_page)
            .copied()
            .collect(),
        _ => Vec::new(),
    };

    tracing::debug!(
        total_items,
        total_pages,
        page = state.current_page,
        "computed filtered view"
    );

    FilteredView {
        filtered,
        paginated,
        total_items,
        total_pages,
        current_page: state.current_page,
        items_per_page: per_page,
    }
}
