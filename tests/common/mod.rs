//! Shared fakes for integration tests.
//!
//! The fake client factory stands in for the native bridge: canned row sets
//! answer schema queries and an in-memory model tree receives writes.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
#![allow(dead_code)]

use pbiux::connector::{ClientFactory, QueryClient, RowSet, WriteSession};
use pbiux::models::{ModelMeasure, ModelTable, TabularModel};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Builds a row set from string slices.
pub fn rows(columns: &[&str], data: &[&[&str]]) -> RowSet {
    RowSet::new(
        columns.iter().map(ToString::to_string).collect(),
        data.iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect(),
    )
}

/// A model tree shared between the test and the fake write session.
pub type SharedModel = Arc<Mutex<TabularModel>>;

/// Builds a one-table model named `Model` with no measures.
pub fn shared_model(table: &str) -> SharedModel {
    Arc::new(Mutex::new(TabularModel {
        name: "Model".to_string(),
        tables: vec![ModelTable {
            name: table.to_string(),
            measures: Vec::new(),
        }],
    }))
}

/// Reads a measure out of a shared model, if present.
pub fn find_measure(model: &SharedModel, table: &str, name: &str) -> Option<ModelMeasure> {
    model
        .lock()
        .unwrap()
        .tables
        .iter()
        .find(|t| t.name == table)
        .and_then(|t| t.measures.iter().find(|m| m.name == name).cloned())
}

/// Query client answering from substring-matched canned responses.
pub struct FakeQueryClient {
    responses: Vec<(String, RowSet)>,
}

impl QueryClient for FakeQueryClient {
    fn execute(&mut self, query: &str) -> pbiux::Result<RowSet> {
        for (needle, rows) in &self.responses {
            if query.contains(needle.as_str()) {
                return Ok(rows.clone());
            }
        }
        Ok(RowSet::default())
    }

    fn close(&mut self) -> pbiux::Result<()> {
        Ok(())
    }
}

/// Write session staging changes on a shared model tree.
pub struct FakeWriteSession {
    model: TabularModel,
    shared: SharedModel,
    fail_save: bool,
}

impl WriteSession for FakeWriteSession {
    fn model_mut(&mut self) -> pbiux::Result<&mut TabularModel> {
        Ok(&mut self.model)
    }

    fn save_changes(&mut self) -> pbiux::Result<()> {
        if self.fail_save {
            return Err(pbiux::Error::operation(
                "save_changes",
                "model is read-only",
            ));
        }
        *self.shared.lock().unwrap() = self.model.clone();
        Ok(())
    }

    fn close(&mut self) -> pbiux::Result<()> {
        Ok(())
    }
}

/// Factory handing out fakes wired to shared state.
pub struct FakeClientFactory {
    responses: Vec<(String, RowSet)>,
    model: SharedModel,
    fail_save: bool,
    broken_bridge: bool,
}

impl FakeClientFactory {
    pub fn new(model: SharedModel) -> Self {
        Self {
            responses: Vec::new(),
            model,
            fail_save: false,
            broken_bridge: false,
        }
    }

    /// Makes every open fail as a missing client library would.
    #[must_use]
    pub const fn broken_bridge(mut self) -> Self {
        self.broken_bridge = true;
        self
    }

    /// Registers a canned response for queries containing `needle`.
    #[must_use]
    pub fn on(mut self, needle: &str, response: RowSet) -> Self {
        self.responses.push((needle.to_string(), response));
        self
    }

    /// Makes every commit fail, as a locked-down model would.
    #[must_use]
    pub const fn failing_saves(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Canned responses for a simple one-table sales model.
    #[must_use]
    pub fn with_sales_schema(self) -> Self {
        self.on("DBSCHEMA_CATALOGS", rows(&["CATALOG_NAME"], &[&["Sales Model"]]))
            .on("MDSCHEMA_DIMENSIONS", rows(&["TableName"], &[&["[Sales]"]]))
            .on(
                "'[Sales]'",
                rows(&["ColumnName"], &[&["[Sales].[Amount]"], &["[Sales].[Region]"]]),
            )
            .on(
                "MDSCHEMA_MEASURES",
                rows(&["TableName", "MeasureName"], &[&["Sales", "Total Sales"]]),
            )
    }
}

impl ClientFactory for FakeClientFactory {
    fn open_query(&self, _library: Option<&Path>, _port: u16) -> pbiux::Result<Box<dyn QueryClient>> {
        if self.broken_bridge {
            return Err(pbiux::Error::LibraryLoad {
                library: "msadomdclient".to_string(),
                cause: "not found".to_string(),
            });
        }
        Ok(Box::new(FakeQueryClient {
            responses: self.responses.clone(),
        }))
    }

    fn open_write(&self, _library: Option<&Path>, _port: u16) -> pbiux::Result<Box<dyn WriteSession>> {
        if self.broken_bridge {
            return Err(pbiux::Error::LibraryLoad {
                library: "msmdlocal".to_string(),
                cause: "not found".to_string(),
            });
        }
        Ok(Box::new(FakeWriteSession {
            model: self.model.lock().unwrap().clone(),
            shared: Arc::clone(&self.model),
            fail_save: self.fail_save,
        }))
    }
}
