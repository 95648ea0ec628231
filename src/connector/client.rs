//! Client abstractions over the analytics-server protocol libraries.
//!
//! The native libraries are loaded at runtime, so the connector talks to them
//! through trait objects. Tests substitute in-memory fakes.

use crate::Result;
use crate::models::TabularModel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tabular result of a schema or data query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowSet {
    /// Column names, in result order.
    pub columns: Vec<String>,
    /// Row values as strings, one `Vec` per row.
    pub rows: Vec<Vec<String>>,
}

impl RowSet {
    /// Creates a row set from columns and rows.
    #[must_use]
    pub const fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Returns the value at `(row, column)` by column name, if present.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Returns the values of the named column across all rows.
    #[must_use]
    pub fn column_values(&self, column: &str) -> Vec<&str> {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(idx).map(String::as_str))
            .collect()
    }
}

/// Read-only query handle against a running model.
pub trait QueryClient: Send {
    /// Executes a DAX or DMV query and returns the rows.
    fn execute(&mut self, query: &str) -> Result<RowSet>;

    /// Closes the underlying connection.
    fn close(&mut self) -> Result<()>;
}

/// Write session against the model's object tree.
///
/// Mutations are staged on the in-memory model and only persisted when
/// [`WriteSession::save_changes`] is called.
pub trait WriteSession: Send {
    /// Returns the mutable model object tree.
    fn model_mut(&mut self) -> Result<&mut TabularModel>;

    /// Commits staged changes to the running instance.
    fn save_changes(&mut self) -> Result<()>;

    /// Closes the session without committing anything further.
    fn close(&mut self) -> Result<()>;
}

/// Factory that opens query and write handles.
pub trait ClientFactory: Send {
    /// Opens a read-only query client against `localhost:{port}`.
    fn open_query(&self, library: Option<&Path>, port: u16) -> Result<Box<dyn QueryClient>>;

    /// Opens a write session against `localhost:{port}`.
    fn open_write(&self, library: Option<&Path>, port: u16) -> Result<Box<dyn WriteSession>>;
}
