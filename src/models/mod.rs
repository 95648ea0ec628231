//! Data model types shared across the connector and services.

use serde::{Deserialize, Serialize};

/// Structural description of one table in the tabular model.
///
/// Column and measure ordering follows the order returned by the underlying
/// metadata queries; no deduplication is performed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableInfo {
    /// Table name with the bracket-wrapping convention stripped.
    pub name: String,
    /// Column names in server-returned order.
    pub columns: Vec<String>,
    /// Measure names in server-returned order.
    pub measures: Vec<String>,
}

impl TableInfo {
    /// Creates an empty table description with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Immutable snapshot of the model schema produced by one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSchema {
    /// Display name of the model, or `"Unknown"` when unavailable.
    pub model_name: String,
    /// Tables in server-returned order.
    pub tables: Vec<TableInfo>,
}

impl ModelSchema {
    /// Creates a schema with the given model name and no tables.
    #[must_use]
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            tables: Vec::new(),
        }
    }
}

/// A measure definition in the write-side model graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeasure {
    /// Measure name, unique within its table.
    pub name: String,
    /// DAX expression (right-hand side only, no assignment prefix).
    pub expression: String,
    /// Optional description shown in the model tooling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A table in the write-side model graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTable {
    /// Table name as the model stores it (no brackets).
    pub name: String,
    /// Measures owned by this table.
    #[serde(default)]
    pub measures: Vec<ModelMeasure>,
}

/// In-memory model graph exposed by the write session.
///
/// Mutations are visible only in-process until the session commits them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabularModel {
    /// Model (database) name.
    #[serde(default)]
    pub name: String,
    /// Tables in the model.
    #[serde(default)]
    pub tables: Vec<ModelTable>,
}

/// Strips one layer of the `[...]` wrapping convention from a name.
///
/// Metadata queries return table identifiers as `[Sales]`; the write-side
/// model stores them as `Sales`. Names without brackets pass through
/// unchanged.
#[must_use]
pub fn strip_brackets(name: &str) -> &str {
    name.trim_start_matches('[').trim_end_matches(']')
}
