//! Integration tests for Search commands via CLI.
//!
//! These tests verify that search state persists between invocations and
//! that `od search view` applies it to a data file:
//! - `od search query|filter|page|per-page|reset-filters|reset` update state
//! - `od search view` filters and paginates records

mod common;

use assert_cmd::Command;
use common::{TestEnv, parse_json};
use predicates::prelude::*;

const EMPLOYEES: &str = r#"[
    {"id": 1, "firstName": "Ann", "lastName": "Lee", "email": "ann@example.com", "employeeNumber": 1001, "isActive": true},
    {"id": 2, "firstName": "Bob", "lastName": "Annis", "email": "bob@example.com", "employeeNumber": 1002, "isActive": false},
    {"id": 3, "firstName": "Cara", "lastName": "Diaz", "email": "cara@example.com", "employeeNumber": 2001, "isActive": true},
    {"id": 4, "firstName": "Dan", "lastName": "Ng", "email": "dan@example.com", "employeeNumber": 2002, "isActive": true}
]"#;

fn od_in(env: &TestEnv) -> Command {
    env.od()
}

fn view_ids(env: &TestEnv, kind: &str, data: &str) -> Vec<String> {
    let output = od_in(env)
        .args(["search", "view", kind, "--data", data])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].to_string())
        .collect()
}

// === State Tests ===

#[test]
fn test_search_show_defaults() {
    let env = TestEnv::new();

    let output = od_in(&env)
        .args(["search", "show", "employees"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json = parse_json(&output.stdout);
    assert_eq!(json["kind"], "employees");
    assert_eq!(json["state"]["query"], "");
    assert_eq!(json["state"]["current_page"], 1);
    assert_eq!(json["state"]["items_per_page"], 10);
}

#[test]
fn test_search_query_persists() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "query", "employees", "ann"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\":\"set_query\""));

    od_in(&env)
        .args(["search", "show", "employees"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"query\":\"ann\""));

    // Other kinds are untouched
    od_in(&env)
        .args(["search", "show", "tasks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"query\":\"\""));
}

#[test]
fn test_search_query_resets_page() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "page", "tasks", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"current_page\":4"));

    od_in(&env)
        .args(["search", "query", "tasks", "deploy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"current_page\":1"));
}

#[test]
fn test_search_per_page_zero_becomes_one() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "per-page", "departments", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"items_per_page\":1"));
}

#[test]
fn test_search_filter_and_reset_filters() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "filter", "tasks", "status", "In progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"in_progress\""));

    od_in(&env)
        .args(["search", "filter", "tasks", "status", "null"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":null"));

    od_in(&env)
        .args(["search", "filter", "tasks", "priority", "high"])
        .assert()
        .success();

    od_in(&env)
        .args(["search", "reset-filters", "tasks"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"filters\":{}"));
}

#[test]
fn test_search_filter_rejects_unknown_choice() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "filter", "tasks", "priority", "urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value 'urgent'"));
}

#[test]
fn test_search_reset_uses_configured_page_size() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "query", "employees", "ann"])
        .assert()
        .success();

    od_in(&env)
        .args(["search", "reset", "employees", "--page-size", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"query\":\"\""))
        .stdout(predicate::str::contains("\"items_per_page\":25"));
}

#[test]
fn test_search_show_human() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "show", "job-titles", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Search state for job_titles:"))
        .stdout(predicate::str::contains("Filters:  none"));
}

#[test]
fn test_search_unknown_kind() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "show", "projects"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown entity kind"));
}

#[test]
fn test_search_options_human() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "options", "employees", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("employeeNumber (number)"))
        .stdout(predicate::str::contains("Inactive = false"));
}

// === View Tests ===

#[test]
fn test_search_view_query_and_filter() {
    let env = TestEnv::new();
    env.write_data("employees.json", EMPLOYEES);

    od_in(&env)
        .args(["search", "query", "employees", "ann"])
        .assert()
        .success();
    assert_eq!(view_ids(&env, "employees", "employees.json"), vec!["1", "2"]);

    od_in(&env)
        .args(["search", "filter", "employees", "isActive", "Active"])
        .assert()
        .success();
    assert_eq!(view_ids(&env, "employees", "employees.json"), vec!["1"]);
}

#[test]
fn test_search_view_number_field() {
    let env = TestEnv::new();
    env.write_data("employees.json", EMPLOYEES);

    od_in(&env)
        .args(["search", "query", "employees", "200"])
        .assert()
        .success();
    assert_eq!(view_ids(&env, "employees", "employees.json"), vec!["3", "4"]);
}

#[test]
fn test_search_view_pagination() {
    let env = TestEnv::new();
    env.write_data("employees.json", EMPLOYEES);

    od_in(&env)
        .args(["search", "per-page", "employees", "3"])
        .assert()
        .success();
    od_in(&env)
        .args(["search", "page", "employees", "2"])
        .assert()
        .success();

    let output = od_in(&env)
        .args(["search", "view", "employees", "--data", "employees.json"])
        .output()
        .unwrap();
    let json = parse_json(&output.stdout);
    assert_eq!(json["total_items"], 4);
    assert_eq!(json["total_pages"], 2);
    assert_eq!(json["current_page"], 2);
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
}

#[test]
fn test_search_view_page_past_end_is_empty() {
    let env = TestEnv::new();
    env.write_data("employees.json", EMPLOYEES);

    od_in(&env)
        .args(["search", "page", "employees", "9"])
        .assert()
        .success();

    let output = od_in(&env)
        .args(["search", "view", "employees", "--data", "employees.json"])
        .output()
        .unwrap();
    let json = parse_json(&output.stdout);
    assert_eq!(json["total_items"], 4);
    assert!(json["items"].as_array().unwrap().is_empty());
}

#[test]
fn test_search_view_open_tasks_human() {
    let env = TestEnv::new();
    env.write_data(
        "tasks.json",
        r#"{"data": [
            {"id": "t1", "title": "Plan", "status": "todo"},
            {"id": "t2", "title": "Build", "status": "done"},
            {"id": "t3", "title": "Ship", "status": "review"}
        ]}"#,
    );

    od_in(&env)
        .args(["search", "filter", "tasks", "status", "open"])
        .assert()
        .success();

    od_in(&env)
        .args(["search", "view", "tasks", "--data", "tasks.json", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("t1  Plan"))
        .stdout(predicate::str::contains("t3  Ship"))
        .stdout(predicate::str::contains("Build").not())
        .stdout(predicate::str::contains("Page 1 of 1 (2 tasks total)"));
}

#[test]
fn test_search_view_missing_file() {
    let env = TestEnv::new();

    od_in(&env)
        .args(["search", "view", "tasks", "--data", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));
}
