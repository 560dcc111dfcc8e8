//! Orgdesk - search, filtering and hierarchy core for company-management data.
//!
//! This library provides the building blocks behind the `od` CLI:
//! - [`search`]: the search/filter/pagination engine and its keyed state store
//! - [`models::hierarchy`]: the parent/child forest assembler and traversal
//! - [`models`]: typed employee, department, job title, task and attachment records

pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod screens;
pub mod search;
pub mod storage;


/// Library-level error type for Orgdesk operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for Orgdesk operations.
pub type Result<T> = std::result::Result<T, Error>;
