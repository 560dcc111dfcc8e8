//! Data models for Orgdesk entities.
//!
//! This module defines the core data structures:
//! - `Employee` - People, with department, job title and manager references
//! - `Department` - Organisational units
//! - `JobTitle` - Positions an employee can hold
//! - `Task` - Work items, optionally nested under a parent task
//! - `Attachment` - Versioned files attached to tasks
//! - `Record` - An untyped JSON object as returned by the backend API
//!
//! Every model implements [`Entity`], which exposes fields by name as a
//! [`FieldValue`] so the search engine can treat all of them uniformly.

pub mod hierarchy;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A field value as seen by the search engine.
///
/// Values are tagged by kind so text matching, numeric matching and strict
/// filter equality never rely on implicit conversions.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Free text (names, emails, descriptions)
    Text(String),
    /// Any numeric value
    Number(f64),
    /// A boolean flag
    Bool(bool),
    /// A value from a closed set (statuses, priorities)
    Enum(String),
    /// Absent, null, or a value with no scalar representation
    Null,
}

impl FieldValue {
    /// Convert a JSON value. Arrays and objects have no scalar form and map to `Null`.
    pub fn from_json(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => FieldValue::Text(s.clone()),
            Some(Value::Number(n)) => n.as_f64().map_or(FieldValue::Null, FieldValue::Number),
            Some(Value::Bool(b)) => FieldValue::Bool(*b),
            _ => FieldValue::Null,
        }
    }

    /// Borrow the string payload of `Text` and `Enum` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

/// Canonical string form of a number.
///
/// Whole numbers print without a fractional part (`42`, not `42.0`), so
/// numeric search matches what a user sees in a table cell.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Normalize a JSON identifier into its string form.
///
/// Strings are taken verbatim and numbers use [`format_number`]. Anything
/// else (null, booleans, empty strings, containers) is not an identifier.
pub fn normalize_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Some(i.to_string()),
            (_, Some(u)) => Some(u.to_string()),
            _ => n.as_f64().map(format_number),
        },
        _ => None,
    }
}

/// Anything the search engine can match and filter.
pub trait Entity {
    /// Unique identifier.
    fn id(&self) -> &str;

    /// Look up a field by name. Unknown fields return [`FieldValue::Null`].
    fn field(&self, name: &str) -> FieldValue;
}

/// Task status in the workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    /// Returns true once no further work is expected.
    pub fn is_closed(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Cancelled)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A person employed by the company.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier
    pub id: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Payroll number shown in listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title_id: Option<String>,

    /// Direct manager, used to build the reporting tree
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hired_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Employee {
    /// Create an active employee with the given ID and name.
    pub fn new(id: String, first_name: String, last_name: String, email: String) -> Self {
        Self {
            id,
            first_name,
            last_name,
            email,
            phone: None,
            employee_number: None,
            department_id: None,
            job_title_id: None,
            manager_id: None,
            is_active: true,
            hired_at: None,
        }
    }

    /// "First Last", as shown in listings.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Employee {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Text(self.id.clone()),
            "first_name" | "firstName" => FieldValue::Text(self.first_name.clone()),
            "last_name" | "lastName" => FieldValue::Text(self.last_name.clone()),
            "full_name" | "fullName" => FieldValue::Text(self.full_name()),
            "email" => FieldValue::Text(self.email.clone()),
            "phone" => self.phone.clone().into(),
            "employee_number" | "employeeNumber" => self
                .employee_number
                .map_or(FieldValue::Null, |n| FieldValue::Number(n as f64)),
            "department_id" | "departmentId" => self.department_id.clone().into(),
            "job_title_id" | "jobTitleId" => self.job_title_id.clone().into(),
            "manager_id" | "managerId" => self.manager_id.clone().into(),
            "is_active" | "isActive" => FieldValue::Bool(self.is_active),
            _ => FieldValue::Null,
        }
    }
}

impl hierarchy::HierarchyItem for Employee {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.manager_id.as_deref()
    }
}

/// An organisational unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Employee heading the department
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_id: Option<String>,

    #[serde(default)]
    pub employee_count: u32,
}

impl Department {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            description: None,
            head_id: None,
            employee_count: 0,
        }
    }
}

impl Entity for Department {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Text(self.id.clone()),
            "name" => FieldValue::Text(self.name.clone()),
            "description" => self.description.clone().into(),
            "head_id" | "headId" => self.head_id.clone().into(),
            "employee_count" | "employeeCount" => FieldValue::Number(self.employee_count as f64),
            _ => FieldValue::Null,
        }
    }
}

/// A position an employee can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTitle {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    /// Seniority grade (1 = entry level)
    #[serde(default)]
    pub level: u8,
}

impl JobTitle {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            department_id: None,
            level: 1,
        }
    }
}

impl Entity for JobTitle {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Text(self.id.clone()),
            "name" => FieldValue::Text(self.name.clone()),
            "department_id" | "departmentId" => self.department_id.clone().into(),
            "level" => FieldValue::Number(self.level as f64),
            _ => FieldValue::Null,
        }
    }
}

/// A unit of work, optionally nested under a parent task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    /// Employee the task is assigned to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,

    /// Parent task ID for hierarchical organization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a new top-level task with the given ID and title.
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            assignee_id: None,
            parent_id: None,
            due_date: None,
            created_at: Utc::now(),
        }
    }

    /// Create a subtask under `parent_id`.
    pub fn child_of(id: String, title: String, parent_id: String) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..Self::new(id, title)
        }
    }
}

impl Entity for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Text(self.id.clone()),
            "title" => FieldValue::Text(self.title.clone()),
            "description" => self.description.clone().into(),
            "status" => FieldValue::Enum(self.status.as_str().to_string()),
            "priority" => FieldValue::Enum(self.priority.as_str().to_string()),
            "assignee_id" | "assigneeId" => self.assignee_id.clone().into(),
            "parent_id" | "parentId" => self.parent_id.clone().into(),
            _ => FieldValue::Null,
        }
    }
}

impl hierarchy::HierarchyItem for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

/// A file attached to a task. Each upload of the same file bumps `version`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,

    pub file_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    #[serde(default)]
    pub size_bytes: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default = "default_version")]
    pub version: u32,

    pub uploaded_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl Entity for Attachment {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        match name {
            "id" => FieldValue::Text(self.id.clone()),
            "file_name" | "fileName" => FieldValue::Text(self.file_name.clone()),
            "mime_type" | "mimeType" => self.mime_type.clone().into(),
            "size_bytes" | "sizeBytes" => FieldValue::Number(self.size_bytes as f64),
            "task_id" | "taskId" => self.task_id.clone().into(),
            "version" => FieldValue::Number(self.version as f64),
            _ => FieldValue::Null,
        }
    }
}

/// An untyped record, as returned by the backend API.
///
/// The full JSON object is kept so it can be echoed back unchanged; the
/// identifier and parent reference are normalized to strings up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    parent_id: Option<String>,
    fields: Map<String, Value>,
}

impl Record {
    /// Key holding the parent reference unless configured otherwise.
    pub const DEFAULT_PARENT_FIELD: &'static str = "parentId";

    /// Build a record from a JSON object.
    ///
    /// Returns `None` when the value is not an object or has no usable `id`.
    /// A parent reference that is neither a string nor a number is treated as
    /// absent.
    pub fn from_value(value: Value, parent_field: &str) -> Option<Self> {
        let Value::Object(fields) = value else {
            return None;
        };
        let id = fields.get("id").and_then(normalize_id)?;
        let parent_id = fields.get(parent_field).and_then(normalize_id);
        Some(Self {
            id,
            parent_id,
            fields,
        })
    }

    /// The parent reference, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// The underlying JSON fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// A display label: the first of `name`, `title`, `fileName` or
    /// first/last name that is present, falling back to the id.
    pub fn label(&self) -> String {
        for key in ["name", "title", "fileName"] {
            if let Some(Value::String(s)) = self.fields.get(key) {
                return s.clone();
            }
        }
        match (self.fields.get("firstName"), self.fields.get("lastName")) {
            (Some(Value::String(first)), Some(Value::String(last))) => format!("{} {}", first, last),
            _ => self.id.clone(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl Entity for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue {
        FieldValue::from_json(self.fields.get(name))
    }
}

impl hierarchy::HierarchyItem for Record {
    fn id(&self) -> &str {
        &self.id
    }

    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_number_whole() {
        assert_eq!(format_number(42.0), "42");
        assert_eq!(format_number(-7.0), "-7");
        assert_eq!(format_number(0.0), "0");
    }

    #[test]
    fn test_format_number_fractional() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.125), "0.125");
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id(&json!("bn-1")), Some("bn-1".to_string()));
        assert_eq!(normalize_id(&json!(17)), Some("17".to_string()));
        assert_eq!(normalize_id(&json!("")), None);
        assert_eq!(normalize_id(&json!(null)), None);
        assert_eq!(normalize_id(&json!(true)), None);
        assert_eq!(normalize_id(&json!({"id": 1})), None);
    }

    #[test]
    fn test_field_value_from_json() {
        assert_eq!(
            FieldValue::from_json(Some(&json!("Alice"))),
            FieldValue::Text("Alice".to_string())
        );
        assert_eq!(FieldValue::from_json(Some(&json!(3))), FieldValue::Number(3.0));
        assert_eq!(FieldValue::from_json(Some(&json!(false))), FieldValue::Bool(false));
        assert_eq!(FieldValue::from_json(Some(&json!([1, 2]))), FieldValue::Null);
        assert_eq!(FieldValue::from_json(None), FieldValue::Null);
    }

    #[test]
    fn test_record_from_value() {
        let record = Record::from_value(
            json!({"id": 7, "parentId": "3", "name": "Payroll"}),
            Record::DEFAULT_PARENT_FIELD,
        )
        .unwrap();
        assert_eq!(Entity::id(&record), "7");
        assert_eq!(record.parent_id(), Some("3"));
        assert_eq!(record.field("name"), FieldValue::Text("Payroll".to_string()));
        assert_eq!(record.label(), "Payroll");
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        assert!(Record::from_value(json!({"name": "x"}), "parentId").is_none());
        assert!(Record::from_value(json!("not an object"), "parentId").is_none());
    }

    #[test]
    fn test_record_malformed_parent_is_absent() {
        let record = Record::from_value(json!({"id": "a", "parentId": {"id": "b"}}), "parentId")
            .unwrap();
        assert_eq!(record.parent_id(), None);
    }

    #[test]
    fn test_record_custom_parent_field() {
        let record =
            Record::from_value(json!({"id": "e2", "managerId": "e1"}), "managerId").unwrap();
        assert_eq!(record.parent_id(), Some("e1"));
    }

    #[test]
    fn test_record_serializes_original_object() {
        let value = json!({"id": 1, "name": "Eng", "extra": [1, 2]});
        let record = Record::from_value(value.clone(), "parentId").unwrap();
        assert_eq!(serde_json::to_value(&record).unwrap(), value);
    }

    #[test]
    fn test_employee_fields() {
        let mut employee = Employee::new(
            "e1".to_string(),
            "Ada".to_string(),
            "Lovelace".to_string(),
            "ada@example.com".to_string(),
        );
        employee.employee_number = Some(1042);
        assert_eq!(employee.field("fullName"), FieldValue::Text("Ada Lovelace".to_string()));
        assert_eq!(employee.field("employee_number"), FieldValue::Number(1042.0));
        assert_eq!(employee.field("isActive"), FieldValue::Bool(true));
        assert_eq!(employee.field("phone"), FieldValue::Null);
        assert_eq!(employee.field("unknown"), FieldValue::Null);
    }

    #[test]
    fn test_employee_deserializes_camel_case() {
        let json = r#"{"id":"e1","firstName":"Ada","lastName":"Lovelace","email":"ada@example.com","managerId":"e0"}"#;
        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.manager_id.as_deref(), Some("e0"));
        assert!(employee.is_active);
    }

    #[test]
    fn test_task_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn test_task_status_from_str() {
        assert_eq!("in_progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert_eq!("DONE".parse::<TaskStatus>(), Ok(TaskStatus::Done));
        assert!("blocked".parse::<TaskStatus>().is_err());
        assert!(TaskStatus::Cancelled.is_closed());
        assert!(!TaskStatus::Review.is_closed());
    }

    #[test]
    fn test_task_enum_fields() {
        let mut task = Task::child_of("t2".to_string(), "Write docs".to_string(), "t1".to_string());
        task.priority = TaskPriority::High;
        assert_eq!(task.field("status"), FieldValue::Enum("todo".to_string()));
        assert_eq!(task.field("priority"), FieldValue::Enum("high".to_string()));
        assert_eq!(task.field("parentId"), FieldValue::Text("t1".to_string()));
    }

    #[test]
    fn test_task_deserialization_defaults() {
        let json = r#"{"id":"t1","title":"Plan","createdAt":"2026-01-01T00:00:00Z"}"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert!(task.parent_id.is_none());
    }

    #[test]
    fn test_attachment_default_version() {
        let json = r#"{"id":"f1","fileName":"plan.pdf","uploadedAt":"2026-01-01T00:00:00Z"}"#;
        let attachment: Attachment = serde_json::from_str(json).unwrap();
        assert_eq!(attachment.version, 1);
        assert_eq!(attachment.field("version"), FieldValue::Number(1.0));
    }
}
