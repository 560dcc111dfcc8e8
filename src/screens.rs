//! Built-in search configuration for each screen.
//!
//! Field names follow the backend's JSON records (camelCase keys). Every
//! typed model answers to the same names, so each config works for both
//! [`Record`](crate::models::Record) and the typed entity of that kind.

use crate::models::{Entity, TaskStatus};
use crate::search::{
    EntityKind, FieldKind, FilterOption, FilterValue, Filters, SearchConfig, SearchField,
};

/// Task status meaning "anything not done or cancelled".
pub const OPEN_STATUS: &str = "open";

fn text(s: &str) -> Option<FilterValue> {
    Some(FilterValue::Text(s.to_string()))
}

/// The search configuration for `kind`.
pub fn config_for<E: Entity + 'static>(kind: EntityKind) -> SearchConfig<E> {
    match kind {
        EntityKind::Employees => employees(),
        EntityKind::Departments => departments(),
        EntityKind::JobTitles => job_titles(),
        EntityKind::Tasks => tasks(),
        EntityKind::Attachments => attachments(),
    }
}

fn employees<E: Entity + 'static>() -> SearchConfig<E> {
    SearchConfig::new()
        .with_search_field(SearchField::text("firstName"))
        .with_search_field(SearchField::text("lastName"))
        .with_search_field(SearchField::text("email"))
        .with_search_field(SearchField::number("employeeNumber"))
        .with_filter(
            FilterOption::new("isActive", "Status")
                .choice(None, "All")
                .choice(Some(FilterValue::Bool(true)), "Active")
                .choice(Some(FilterValue::Bool(false)), "Inactive"),
        )
}

fn departments<E: Entity + 'static>() -> SearchConfig<E> {
    SearchConfig::new()
        .with_search_field(SearchField::text("name"))
        .with_search_field(SearchField::text("description"))
}

fn job_titles<E: Entity + 'static>() -> SearchConfig<E> {
    let mut level = FilterOption::new("level", "Level").choice(None, "All");
    for grade in 1..=5 {
        level = level.choice(
            Some(FilterValue::Number(grade as f64)),
            format!("Level {}", grade),
        );
    }
    SearchConfig::new()
        .with_search_field(SearchField::text("name"))
        .with_filter(level)
}

fn tasks<E: Entity + 'static>() -> SearchConfig<E> {
    SearchConfig::new()
        .with_search_field(SearchField::text("title"))
        .with_search_field(SearchField::text("description"))
        .with_search_field(SearchField::new("status", FieldKind::Enum))
        .with_filter(
            FilterOption::new("status", "Status")
                .choice(None, "All")
                .choice(text(OPEN_STATUS), "Open")
                .choice(text("todo"), "To do")
                .choice(text("in_progress"), "In progress")
                .choice(text("review"), "In review")
                .choice(text("done"), "Done")
                .choice(text("cancelled"), "Cancelled"),
        )
        .with_filter(
            FilterOption::new("priority", "Priority")
                .choice(None, "All")
                .choice(text("low"), "Low")
                .choice(text("medium"), "Medium")
                .choice(text("high"), "High")
                .choice(text("critical"), "Critical"),
        )
        .with_custom_filter(task_filter)
}

/// Equality filtering, except that status "open" matches every status that
/// is not closed. Statuses outside the known workflow count as open.
fn task_filter<E: Entity>(task: &E, filters: &Filters) -> bool {
    filters.iter().all(|(key, value)| match value {
        None => true,
        Some(FilterValue::Text(status)) if key == "status" && status == OPEN_STATUS => task
            .field("status")
            .as_str()
            .is_some_and(|s| s.parse::<TaskStatus>().map_or(true, |st| !st.is_closed())),
        Some(expected) => expected.matches(&task.field(key)),
    })
}

fn attachments<E: Entity + 'static>() -> SearchConfig<E> {
    SearchConfig::new()
        .with_search_field(SearchField::text("fileName"))
        .with_search_field(SearchField::text("mimeType"))
        .with_search_field(SearchField::number("version"))
        .with_filter(
            FilterOption::new("mimeType", "Type")
                .choice(None, "All")
                .choice(text("application/pdf"), "PDF")
                .choice(text("image/png"), "PNG image")
                .choice(text("image/jpeg"), "JPEG image")
                .choice(text("text/plain"), "Plain text"),
        )
}
