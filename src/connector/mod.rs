//! Connection to a running Power BI Desktop instance.
//!
//! [`PowerBiConnector`] ties the pieces together: the process locator finds
//! the embedded analytics server, the library search resolves the vendor
//! client libraries, and the client factory opens query and write handles.

mod client;
mod library;
mod locate;
mod native;
mod schema;
mod writer;

pub use client::{ClientFactory, QueryClient, RowSet, WriteSession};
pub use library::{LibraryKind, LibrarySearch};
pub use locate::{LocatedServer, SERVER_PROCESS_NAME, locate};
pub use native::NativeClientFactory;
pub use schema::read_schema;
pub use writer::{strip_assignment, upsert_measure};

use crate::config::PbiuxConfig;
use crate::models::ModelSchema;
use crate::{Error, Result};
use std::path::PathBuf;

/// Stateful connector holding at most one query and one write handle.
pub struct PowerBiConnector {
    port: Option<u16>,
    exe: Option<PathBuf>,
    search: LibrarySearch,
    factory: Box<dyn ClientFactory>,
    query: Option<Box<dyn QueryClient>>,
    write: Option<Box<dyn WriteSession>>,
}

impl PowerBiConnector {
    /// Creates a connector using the native client factory.
    #[must_use]
    pub fn new(config: &PbiuxConfig) -> Self {
        Self::with_factory(config, Box::new(NativeClientFactory::new()))
    }

    /// Creates a connector with a custom client factory.
    #[must_use]
    pub fn with_factory(config: &PbiuxConfig, factory: Box<dyn ClientFactory>) -> Self {
        Self {
            port: config.port,
            exe: None,
            search: LibrarySearch::from_config(config),
            factory,
            query: None,
            write: None,
        }
    }

    /// The port in use, once known.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Whether a query handle is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.query.is_some()
    }

    /// Whether a write session is open.
    #[must_use]
    pub const fn is_write_connected(&self) -> bool {
        self.write.is_some()
    }

    /// Opens a query connection, discovering the server if no port is set.
    ///
    /// An already-open query handle is closed first so repeated connects do
    /// not leak handles.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProcessNotFound`] when discovery finds nothing, or
    /// [`Error::Connection`] when the handle cannot be opened.
    pub fn connect(&mut self) -> Result<()> {
        if let Some(mut old) = self.query.take() {
            if let Err(e) = old.close() {
                tracing::warn!(error = %e, "Closing previous query handle failed");
            }
        }

        if self.port.is_none() {
            let located = locate()?;
            self.port = Some(located.port);
            self.exe = located.exe;
        }
        let port = self
            .port
            .ok_or_else(|| Error::connection("no port available"))?;

        let library = self.search.find(LibraryKind::Query, self.exe.as_deref());
        let client = self
            .factory
            .open_query(library.as_deref(), port)
            .map_err(as_connection_error)?;
        self.query = Some(client);
        tracing::info!(port, "Connected");
        Ok(())
    }

    /// Opens a write session, connecting for queries first when needed.
    ///
    /// # Errors
    ///
    /// Propagates discovery and connection errors.
    pub fn connect_write(&mut self) -> Result<()> {
        if self.write.is_some() {
            return Ok(());
        }
        if self.port.is_none() {
            self.connect()?;
        }
        let port = self
            .port
            .ok_or_else(|| Error::connection("no port available"))?;

        let library = self.search.find(LibraryKind::Write, self.exe.as_deref());
        let session = self
            .factory
            .open_write(library.as_deref(), port)
            .map_err(as_connection_error)?;
        self.write = Some(session);
        tracing::info!(port, "Write session ready");
        Ok(())
    }

    /// Closes both handles. Close failures are logged, never returned.
    pub fn disconnect(&mut self) {
        if let Some(mut query) = self.query.take() {
            if let Err(e) = query.close() {
                tracing::warn!(error = %e, "Closing query handle failed");
            }
        }
        if let Some(mut write) = self.write.take() {
            if let Err(e) = write.close() {
                tracing::warn!(error = %e, "Closing write session failed");
            }
        }
    }

    /// Reads the model schema over the open query connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] when no query handle is open.
    pub fn schema(&mut self) -> Result<ModelSchema> {
        let client = self
            .query
            .as_mut()
            .ok_or_else(|| Error::connection("not connected"))?;
        Ok(read_schema(client.as_mut()))
    }

    /// Creates or updates a measure, opening a write session when needed.
    ///
    /// # Errors
    ///
    /// Propagates connection, resolution and commit errors.
    pub fn upsert_measure(
        &mut self,
        table_name: &str,
        measure_name: &str,
        dax_code: &str,
        description: &str,
    ) -> Result<()> {
        self.connect_write()?;
        let session = self
            .write
            .as_mut()
            .ok_or_else(|| Error::connection("write session unavailable"))?;
        writer::upsert_measure(
            session.as_mut(),
            table_name,
            measure_name,
            dax_code,
            description,
        )
    }
}

impl Drop for PowerBiConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Folds library-load and native open failures into the connection error kind.
fn as_connection_error(error: Error) -> Error {
    match error {
        Error::Connection { .. } => error,
        other => Error::connection(other),
    }
}
