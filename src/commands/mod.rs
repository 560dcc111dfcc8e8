//! Command implementations for the Orgdesk CLI.
//!
//! This module contains the business logic for each CLI command.
//! Commands are organized by area:
//! - `search_*` - Search state actions and filtered views
//! - `tree_*` - Hierarchy rendering and integrity checks
//! - `config_*` - Configuration inspection and updates

use crate::config::{ConfigOverrides, OrgdeskConfig, ResolvedConfig, resolve_config};
use crate::models::hierarchy::{HierarchyAnomaly, build_forest, validate, walk};
use crate::models::{Entity, Record};
use crate::screens::config_for;
use crate::search::{
    EntityKind, FieldKind, FilterOption, FilterValue, SearchAction, SearchConfig, SearchState,
    compute_filtered_view,
};
use crate::storage::{Session, load_records};
use crate::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn json_or_error<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"error": "serialization failed: {}"}}"#, e))
}

fn describe_filters(state: &SearchState) -> String {
    let active: Vec<String> = state
        .active_filters()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    if active.is_empty() {
        "none".to_string()
    } else {
        active.join(", ")
    }
}

// === Search ===

/// The search state of one entity kind, optionally after an action.
#[derive(Serialize)]
pub struct SearchStateResult {
    pub kind: EntityKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
    pub state: SearchState,
}

impl Output for SearchStateResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if let Some(action) = self.action {
            lines.push(format!("Applied {} to {}.", action, self.kind));
        }
        lines.push(format!("Search state for {}:", self.kind));
        let query = if self.state.query.is_empty() {
            "(empty)".to_string()
        } else {
            format!("\"{}\"", self.state.query)
        };
        lines.push(format!("  Query:    {}", query));
        lines.push(format!("  Filters:  {}", describe_filters(&self.state)));
        lines.push(format!("  Page:     {}", self.state.current_page));
        lines.push(format!("  Per page: {}", self.state.items_per_page));
        lines.join("\n")
    }
}

fn action_name(action: &SearchAction) -> &'static str {
    match action {
        SearchAction::SetQuery { .. } => "set_query",
        SearchAction::SetFilter { .. } => "set_filter",
        SearchAction::ResetFilters { .. } => "reset_filters",
        SearchAction::SetCurrentPage { .. } => "set_current_page",
        SearchAction::SetItemsPerPage { .. } => "set_items_per_page",
        SearchAction::ResetEntitySearch { .. } => "reset_entity_search",
    }
}

/// Show the current search state for `kind`.
pub fn search_show(session: &Session, config: &ResolvedConfig, kind: EntityKind) -> Result<SearchStateResult> {
    let store = session.load_search_store(config.default_page_size())?;
    Ok(SearchStateResult {
        kind,
        action: None,
        state: store.state(kind),
    })
}

/// Apply one action to the persisted store.
pub fn search_apply(
    session: &Session,
    config: &ResolvedConfig,
    action: SearchAction,
) -> Result<SearchStateResult> {
    let mut store = session.load_search_store(config.default_page_size())?;
    let kind = action.kind();
    let name = action_name(&action);
    let state = store.dispatch(action);
    session.save_search_store(&store)?;
    Ok(SearchStateResult {
        kind,
        action: Some(name),
        state,
    })
}

/// Turn user input into a filter value for `key`.
///
/// `null`, `none` and the empty string unset the filter. Declared filters
/// only accept one of their choices, by value or label. Undeclared keys go
/// through [`FilterValue::infer`].
pub fn parse_filter_value<E>(
    config: &SearchConfig<E>,
    key: &str,
    raw: &str,
) -> Result<Option<FilterValue>> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("null") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match config.filter_option(key) {
        Some(option) => option
            .find_choice(raw)
            .map(|choice| choice.value.clone())
            .ok_or_else(|| {
                let allowed: Vec<String> = option
                    .choices
                    .iter()
                    .map(|c| match &c.value {
                        Some(v) => v.to_string(),
                        None => c.label.clone(),
                    })
                    .collect();
                Error::InvalidInput(format!(
                    "Invalid value '{}' for filter {} (expected one of: {})",
                    raw,
                    key,
                    allowed.join(", ")
                ))
            }),
        None => Ok(Some(FilterValue::infer(raw))),
    }
}

/// Set a filter, validating the value against the screen's declared choices.
pub fn search_filter(
    session: &Session,
    config: &ResolvedConfig,
    kind: EntityKind,
    key: &str,
    raw: &str,
) -> Result<SearchStateResult> {
    let value = parse_filter_value(&config_for::<Record>(kind), key, raw)?;
    search_apply(
        session,
        config,
        SearchAction::SetFilter {
            kind,
            key: key.to_string(),
            value,
        },
    )
}

/// A searchable field, as listed by `od search options`.
#[derive(Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub kind: FieldKind,
}

/// Searchable fields and filters declared for an entity kind.
#[derive(Serialize)]
pub struct SearchOptionsResult {
    pub kind: EntityKind,
    pub search_fields: Vec<FieldInfo>,
    pub filters: Vec<FilterOption>,
    pub custom_filter: bool,
}

impl Output for SearchOptionsResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Search options for {}:", self.kind)];
        lines.push("  Searchable fields:".to_string());
        for field in &self.search_fields {
            lines.push(format!("    {} ({})", field.name, field.kind));
        }
        if self.filters.is_empty() {
            lines.push("  No filters.".to_string());
        }
        for filter in &self.filters {
            lines.push(format!("  Filter {} [{}]:", filter.label, filter.key));
            for choice in &filter.choices {
                match &choice.value {
                    Some(value) => lines.push(format!("    {} = {}", choice.label, value)),
                    None => lines.push(format!("    {} (clears filter)", choice.label)),
                }
            }
        }
        if self.custom_filter {
            lines.push("  Uses a custom filter predicate.".to_string());
        }
        lines.join("\n")
    }
}

/// List the search configuration for `kind`.
pub fn search_options(kind: EntityKind) -> SearchOptionsResult {
    let config = config_for::<Record>(kind);
    SearchOptionsResult {
        kind,
        search_fields: config
            .search_fields
            .iter()
            .map(|f| FieldInfo {
                name: f.name.clone(),
                kind: f.kind,
            })
            .collect(),
        custom_filter: config.has_custom_filter(),
        filters: config.filter_options,
    }
}

/// One page of a filtered collection.
#[derive(Serialize)]
pub struct SearchViewResult {
    pub kind: EntityKind,
    pub query: String,
    pub filters: Vec<(String, FilterValue)>,
    pub current_page: usize,
    pub items_per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<Value>,
    #[serde(skip)]
    labels: Vec<(String, String)>,
}

impl Output for SearchViewResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        if self.total_items == 0 {
            return format!("No {} found.", self.kind);
        }
        let mut lines = Vec::new();
        let width = self.labels.iter().map(|(id, _)| id.len()).max().unwrap_or(0);
        for (id, label) in &self.labels {
            lines.push(format!("  {:<width$}  {}", id, label, width = width));
        }
        if self.labels.is_empty() {
            lines.push("  (no items on this page)".to_string());
        }
        lines.push(format!(
            "Page {} of {} ({} {} total)",
            self.current_page, self.total_pages, self.total_items, self.kind
        ));
        lines.join("\n")
    }
}

/// Compute the current page of `data_path` for `kind`.
pub fn search_view(
    session: &Session,
    config: &ResolvedConfig,
    kind: EntityKind,
    data_path: &Path,
) -> Result<SearchViewResult> {
    let store = session.load_search_store(config.default_page_size())?;
    let state = store.state(kind);
    let records = load_records(data_path, config.parent_field())?;
    let view = compute_filtered_view(&records, &state, &config_for(kind));

    Ok(SearchViewResult {
        kind,
        query: state.query.clone(),
        filters: state
            .active_filters()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        current_page: view.current_page,
        items_per_page: view.items_per_page,
        total_items: view.total_items,
        total_pages: view.total_pages,
        items: view
            .paginated
            .iter()
            .map(|r| Value::Object(r.fields().clone()))
            .collect(),
        labels: view
            .paginated
            .iter()
            .map(|r| (Entity::id(*r).to_string(), r.label()))
            .collect(),
    })
}

// === Tree ===

/// One rendered tree row.
#[derive(Serialize)]
pub struct TreeRow {
    pub id: String,
    pub label: String,
    pub depth: usize,
    pub children: usize,
}

/// A depth-first rendering of a record hierarchy.
#[derive(Serialize)]
pub struct TreeResult {
    pub roots: usize,
    pub count: usize,
    pub rows: Vec<TreeRow>,
}

impl Output for TreeResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        if self.rows.is_empty() {
            return "No records found.".to_string();
        }
        let mut lines: Vec<String> = self
            .rows
            .iter()
            .map(|row| format!("{}- {} [{}]", "  ".repeat(row.depth), row.label, row.id))
            .collect();
        lines.push(format!("{} record(s) in {} tree(s)", self.count, self.roots));
        lines.join("\n")
    }
}

/// Build and render the hierarchy in `data_path`.
pub fn tree_show(data_path: &Path, parent_field: &str) -> Result<TreeResult> {
    let records = load_records(data_path, parent_field)?;
    let forest = build_forest(records);

    let mut rows = Vec::new();
    walk(&forest, |node, depth| {
        rows.push(TreeRow {
            id: node.id().to_string(),
            label: node.item.label(),
            depth,
            children: node.children.len(),
        })
    });

    Ok(TreeResult {
        roots: forest.len(),
        count: rows.len(),
        rows,
    })
}

/// Integrity problems found in a hierarchy.
#[derive(Serialize)]
pub struct TreeCheckResult {
    pub count: usize,
    pub anomalies: Vec<HierarchyAnomaly>,
}

impl Output for TreeCheckResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        if self.anomalies.is_empty() {
            return "No hierarchy problems found.".to_string();
        }
        let mut lines = vec![format!("{} hierarchy problem(s):", self.count)];
        for anomaly in &self.anomalies {
            lines.push(format!("  - {}", anomaly));
        }
        lines.join("\n")
    }
}

/// Report duplicate ids, orphaned parents and cycles in `data_path`.
pub fn tree_check(data_path: &Path, parent_field: &str) -> Result<TreeCheckResult> {
    let records = load_records(data_path, parent_field)?;
    let anomalies = validate(&records);
    Ok(TreeCheckResult {
        count: anomalies.len(),
        anomalies,
    })
}

// === Config ===

/// One resolved configuration value.
#[derive(Serialize)]
pub struct ConfigEntry {
    pub key: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Serialize)]
pub struct ConfigShowResult {
    pub entries: Vec<ConfigEntry>,
}

impl Output for ConfigShowResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} = {} ({})", e.key, e.value, e.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Show resolved configuration and where each value came from.
pub fn config_show(session: &Session, overrides: &ConfigOverrides) -> Result<ConfigShowResult> {
    let resolved = resolve_config(session, overrides)?;
    Ok(ConfigShowResult {
        entries: vec![
            ConfigEntry {
                key: "default-page-size",
                value: resolved.default_page_size().to_string(),
                source: resolved.default_page_size.source.to_string(),
            },
            ConfigEntry {
                key: "output-format",
                value: resolved.output_format().to_string(),
                source: resolved.output_format.source.to_string(),
            },
            ConfigEntry {
                key: "parent-field",
                value: resolved.parent_field().to_string(),
                source: resolved.parent_field.source.to_string(),
            },
        ],
    })
}

#[derive(Serialize)]
pub struct ConfigSetResult {
    pub key: String,
    pub value: String,
    pub path: String,
}

impl Output for ConfigSetResult {
    fn to_json(&self) -> String {
        json_or_error(self)
    }

    fn to_human(&self) -> String {
        format!("Set {} = {} in {}", self.key, self.value, self.path)
    }
}

/// Update one key in the session config.kdl.
///
/// An unreadable or unparsable config.kdl is replaced by a fresh one holding
/// only the new key.
pub fn config_set(session: &Session, key: &str, value: &str) -> Result<ConfigSetResult> {
    let mut config = session.read_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "replacing unreadable session config");
        OrgdeskConfig::new()
    });
    config.set(key, value).map_err(Error::InvalidInput)?;
    session.write_config(&config)?;
    Ok(ConfigSetResult {
        key: key.to_string(),
        value: value.to_string(),
        path: session.config_kdl_path().display().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestEnv;

    const TASKS: &str = r#"[
        {"id": "a", "title": "Launch", "status": "todo"},
        {"id": "b", "title": "Design", "status": "done", "parentId": "a"},
        {"id": "c", "title": "Build", "status": "in_progress", "parentId": "a"},
        {"id": "d", "title": "Test", "status": "todo", "parentId": "c"}
    ]"#;

    fn resolved() -> ResolvedConfig {
        ResolvedConfig::default()
    }

    #[test]
    fn test_search_apply_persists() {
        let env = TestEnv::new();
        let session = env.session();
        let result = search_apply(
            &session,
            &resolved(),
            SearchAction::SetQuery {
                kind: EntityKind::Tasks,
                query: "build".to_string(),
            },
        )
        .unwrap();
        assert_eq!(result.action, Some("set_query"));

        let shown = search_show(&session, &resolved(), EntityKind::Tasks).unwrap();
        assert_eq!(shown.state.query, "build");
    }

    #[test]
    fn test_search_view_applies_state() {
        let env = TestEnv::new();
        let session = env.session();
        let data = env.write_data("tasks.json", TASKS);
        search_filter(&session, &resolved(), EntityKind::Tasks, "status", "open").unwrap();
        search_apply(
            &session,
            &resolved(),
            SearchAction::SetItemsPerPage {
                kind: EntityKind::Tasks,
                count: 2,
            },
        )
        .unwrap();

        let view = search_view(&session, &resolved(), EntityKind::Tasks, &data).unwrap();
        assert_eq!(view.total_items, 3);
        assert_eq!(view.total_pages, 2);
        let ids: Vec<&str> = view.items.iter().filter_map(|v| v["id"].as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(view.to_human().contains("Page 1 of 2"));
    }

    #[test]
    fn test_parse_filter_value_declared() {
        let config = config_for::<Record>(EntityKind::Tasks);
        assert_eq!(
            parse_filter_value(&config, "status", "In progress").unwrap(),
            Some(FilterValue::Text("in_progress".to_string()))
        );
        assert_eq!(parse_filter_value(&config, "status", "all").unwrap(), None);
        assert_eq!(parse_filter_value(&config, "status", "null").unwrap(), None);
        assert!(matches!(
            parse_filter_value(&config, "status", "archived"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_filter_value_undeclared() {
        let config = config_for::<Record>(EntityKind::Employees);
        assert_eq!(
            parse_filter_value(&config, "departmentId", "7").unwrap(),
            Some(FilterValue::Number(7.0))
        );
        assert_eq!(
            parse_filter_value(&config, "isActive", "true").unwrap(),
            Some(FilterValue::Bool(true))
        );
    }

    #[test]
    fn test_filter_on_text_code_matches_record() {
        let env = TestEnv::new();
        let session = env.session();
        let data = env.write_data(
            "employees.json",
            r#"[
                {"id": 1, "firstName": "Ann", "code": "007", "departmentId": "1e5"},
                {"id": 2, "firstName": "Bob", "code": "7", "departmentId": 100000}
            ]"#,
        );

        search_filter(&session, &resolved(), EntityKind::Employees, "code", "007").unwrap();
        let view = search_view(&session, &resolved(), EntityKind::Employees, &data).unwrap();
        let ids: Vec<u64> = view.items.iter().filter_map(|v| v["id"].as_u64()).collect();
        assert_eq!(ids, vec![1]);

        search_apply(
            &session,
            &resolved(),
            SearchAction::ResetFilters {
                kind: EntityKind::Employees,
            },
        )
        .unwrap();
        search_filter(&session, &resolved(), EntityKind::Employees, "departmentId", "1e5").unwrap();
        let view = search_view(&session, &resolved(), EntityKind::Employees, &data).unwrap();
        let ids: Vec<u64> = view.items.iter().filter_map(|v| v["id"].as_u64()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_quoted_filter_value_forces_text() {
        let config = config_for::<Record>(EntityKind::Employees);
        assert_eq!(
            parse_filter_value(&config, "code", "\"7\"").unwrap(),
            Some(FilterValue::Text("7".to_string()))
        );
        assert_eq!(
            parse_filter_value(&config, "code", "7").unwrap(),
            Some(FilterValue::Number(7.0))
        );
    }

    #[test]
    fn test_search_options_lists_filters() {
        let result = search_options(EntityKind::Tasks);
        assert!(result.custom_filter);
        assert!(result.filters.iter().any(|f| f.key == "priority"));
        assert!(result.to_human().contains("title (text)"));
    }

    #[test]
    fn test_tree_show_rows() {
        let env = TestEnv::new();
        let data = env.write_data("tasks.json", TASKS);
        let tree = tree_show(&data, "parentId").unwrap();
        assert_eq!(tree.roots, 1);
        assert_eq!(tree.count, 4);
        let order: Vec<(&str, usize)> = tree.rows.iter().map(|r| (r.id.as_str(), r.depth)).collect();
        assert_eq!(order, vec![("a", 0), ("b", 1), ("c", 1), ("d", 2)]);
        assert!(tree.to_human().contains("    - Test [d]"));
    }

    #[test]
    fn test_tree_check_reports_cycle() {
        let env = TestEnv::new();
        let data = env.write_data(
            "cycle.json",
            r#"[{"id": "x", "parentId": "y"}, {"id": "y", "parentId": "x"}]"#,
        );
        let check = tree_check(&data, "parentId").unwrap();
        assert_eq!(check.count, 1);
        assert!(check.to_human().contains("parent cycle x -> y"));
    }

    #[test]
    fn test_config_set_and_show() {
        let env = TestEnv::new();
        let session = env.session();
        config_set(&session, "parent-field", "managerId").unwrap();
        let shown = config_show(&session, &ConfigOverrides::new()).unwrap();
        let parent = shown
            .entries
            .iter()
            .find(|e| e.key == "parent-field")
            .unwrap();
        assert_eq!(parent.value, "managerId");
        assert_eq!(parent.source, "session");
    }

    #[test]
    fn test_config_set_replaces_unparsable_file() {
        let env = TestEnv::new();
        let session = env.session();
        std::fs::write(session.config_kdl_path(), "default-page-size {").unwrap();
        assert!(config_show(&session, &ConfigOverrides::new()).is_err());

        config_set(&session, "default-page-size", "20").unwrap();
        let shown = config_show(&session, &ConfigOverrides::new()).unwrap();
        let size = shown
            .entries
            .iter()
            .find(|e| e.key == "default-page-size")
            .unwrap();
        assert_eq!(size.value, "20");
        assert_eq!(size.source, "session");
    }

    #[test]
    fn test_config_set_rejects_unknown_key() {
        let env = TestEnv::new();
        let session = env.session();
        assert!(matches!(
            config_set(&session, "editor", "vim"),
            Err(Error::InvalidInput(_))
        ));
    }
}
