//! Runtime-loaded native client bridge.
//!
//! The vendor client libraries are not linked at build time; a small C-ABI
//! bridge is loaded with `libloading` and spoken to through exported symbols.
//! Query results and the model object tree cross the boundary as JSON.
//!
//! Exported symbols, query side:
//! `pbi_query_open(conn: *const c_char) -> *mut c_void`,
//! `pbi_query_exec(handle, dax: *const c_char) -> *mut c_char` (JSON rows),
//! `pbi_query_close(handle)`. Write side: `pbi_model_open`, `pbi_model_read`
//! (JSON model tree), `pbi_model_apply(handle, json) -> c_int`,
//! `pbi_model_close`. Both expose `pbi_last_error() -> *const c_char` and
//! `pbi_string_free(*mut c_char)`.

#![allow(unsafe_code)]

use crate::connector::client::{ClientFactory, QueryClient, RowSet, WriteSession};
use crate::connector::library::{QUERY_LIBRARY_NAME, WRITE_LIBRARY_NAME, companion_path};
use crate::models::TabularModel;
use crate::{Error, Result};
use libloading::{Library, Symbol};
use std::ffi::{CStr, CString, c_char, c_int, c_void};
use std::path::Path;

type OpenFn = unsafe extern "C" fn(*const c_char) -> *mut c_void;
type ExecFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> *mut c_char;
type ReadFn = unsafe extern "C" fn(*mut c_void) -> *mut c_char;
type ApplyFn = unsafe extern "C" fn(*mut c_void, *const c_char) -> c_int;
type CloseFn = unsafe extern "C" fn(*mut c_void);
type LastErrorFn = unsafe extern "C" fn() -> *const c_char;
type StringFreeFn = unsafe extern "C" fn(*mut c_char);

/// Default factory; loads the vendor bridge libraries on demand.
#[derive(Debug, Default)]
pub struct NativeClientFactory;

impl NativeClientFactory {
    /// Creates the factory.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn load_library(path: Option<&Path>, default_name: &str) -> Result<Library> {
    let (library_label, result) = match path {
        Some(p) => (p.display().to_string(), unsafe { Library::new(p) }),
        None => (default_name.to_string(), unsafe {
            Library::new(libloading::library_filename(
                default_name.trim_end_matches(".dll"),
            ))
        }),
    };
    result.map_err(|e| Error::LibraryLoad {
        library: library_label,
        cause: e.to_string(),
    })
}

/// Loads the companion library the write client depends on, when one ships
/// next to it. Absence or a load failure only degrades to OS resolution of
/// the dependency, so neither is fatal.
fn load_companion(write_library: &Path) -> Option<Library> {
    let path = companion_path(write_library)?;
    match unsafe { Library::new(&path) } {
        Ok(lib) => {
            tracing::debug!(path = %path.display(), "Companion library loaded");
            Some(lib)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Companion library failed to load");
            None
        }
    }
}

fn connection_string(port: u16) -> Result<CString> {
    CString::new(format!("Data Source=localhost:{port}")).map_err(Error::connection)
}

/// Reads the bridge's last error message, if it reports one.
fn last_error(lib: &Library) -> Option<String> {
    unsafe {
        let sym: Symbol<LastErrorFn> = lib.get(b"pbi_last_error\0").ok()?;
        let ptr = sym();
        if ptr.is_null() {
            return None;
        }
        Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
    }
}

/// Takes ownership of a bridge-allocated string and frees it bridge-side.
fn take_bridge_string(lib: &Library, ptr: *mut c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(Error::connection(
            last_error(lib).unwrap_or_else(|| "bridge returned null".to_string()),
        ));
    }
    unsafe {
        let value = CStr::from_ptr(ptr).to_string_lossy().into_owned();
        if let Ok(free) = lib.get::<StringFreeFn>(b"pbi_string_free\0") {
            free(ptr);
        }
        Ok(value)
    }
}

impl ClientFactory for NativeClientFactory {
    fn open_query(&self, library: Option<&Path>, port: u16) -> Result<Box<dyn QueryClient>> {
        let lib = load_library(library, QUERY_LIBRARY_NAME)?;
        let conn = connection_string(port)?;

        let handle = unsafe {
            let open: Symbol<OpenFn> = lib
                .get(b"pbi_query_open\0")
                .map_err(|e| Error::connection(e))?;
            open(conn.as_ptr())
        };
        if handle.is_null() {
            return Err(Error::connection(
                last_error(&lib).unwrap_or_else(|| format!("cannot open localhost:{port}")),
            ));
        }

        tracing::info!(port, "Query connection opened");
        Ok(Box::new(NativeQueryClient {
            lib,
            handle: Some(handle),
        }))
    }

    fn open_write(&self, library: Option<&Path>, port: u16) -> Result<Box<dyn WriteSession>> {
        let companion = library.and_then(load_companion);
        let lib = load_library(library, WRITE_LIBRARY_NAME)?;
        let conn = connection_string(port)?;

        let handle = unsafe {
            let open: Symbol<OpenFn> = lib
                .get(b"pbi_model_open\0")
                .map_err(|e| Error::connection(e))?;
            open(conn.as_ptr())
        };
        if handle.is_null() {
            return Err(Error::connection(
                last_error(&lib).unwrap_or_else(|| format!("cannot open localhost:{port}")),
            ));
        }

        let model_json = unsafe {
            let read: Symbol<ReadFn> = lib
                .get(b"pbi_model_read\0")
                .map_err(|e| Error::connection(e))?;
            read(handle)
        };
        let model_json = take_bridge_string(&lib, model_json)?;
        let model: TabularModel = serde_json::from_str(&model_json)
            .map_err(|e| Error::operation("read_model", e))?;

        tracing::info!(port, model = %model.name, "Write session opened");
        Ok(Box::new(NativeWriteSession {
            lib,
            _companion: companion,
            handle: Some(handle),
            model,
        }))
    }
}

struct NativeQueryClient {
    lib: Library,
    handle: Option<*mut c_void>,
}

// The bridge handle is only touched from the owning thread at a time.
unsafe impl Send for NativeQueryClient {}

impl QueryClient for NativeQueryClient {
    fn execute(&mut self, query: &str) -> Result<RowSet> {
        let handle = self
            .handle
            .ok_or_else(|| Error::connection("query handle already closed"))?;
        let query_c = CString::new(query).map_err(|e| Error::InvalidInput(e.to_string()))?;

        let result = unsafe {
            let exec: Symbol<ExecFn> = self
                .lib
                .get(b"pbi_query_exec\0")
                .map_err(|e| Error::operation("execute_query", e))?;
            exec(handle, query_c.as_ptr())
        };
        let json = take_bridge_string(&self.lib, result)
            .map_err(|e| Error::operation("execute_query", e))?;

        serde_json::from_str(&json).map_err(|e| Error::operation("execute_query", e))
    }

    fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            unsafe {
                let close: Symbol<CloseFn> = self
                    .lib
                    .get(b"pbi_query_close\0")
                    .map_err(|e| Error::operation("close_query", e))?;
                close(handle);
            }
        }
        Ok(())
    }
}

impl Drop for NativeQueryClient {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.close();
        }
    }
}

struct NativeWriteSession {
    lib: Library,
    // Held so the loader keeps the write library's dependency mapped.
    _companion: Option<Library>,
    handle: Option<*mut c_void>,
    model: TabularModel,
}

unsafe impl Send for NativeWriteSession {}

impl WriteSession for NativeWriteSession {
    fn model_mut(&mut self) -> Result<&mut TabularModel> {
        if self.handle.is_none() {
            return Err(Error::connection("write session already closed"));
        }
        Ok(&mut self.model)
    }

    fn save_changes(&mut self) -> Result<()> {
        let handle = self
            .handle
            .ok_or_else(|| Error::connection("write session already closed"))?;
        let json = serde_json::to_string(&self.model)
            .map_err(|e| Error::operation("save_changes", e))?;
        let json_c = CString::new(json).map_err(|e| Error::operation("save_changes", e))?;

        let status = unsafe {
            let apply: Symbol<ApplyFn> = self
                .lib
                .get(b"pbi_model_apply\0")
                .map_err(|e| Error::operation("save_changes", e))?;
            apply(handle, json_c.as_ptr())
        };
        if status != 0 {
            return Err(Error::operation(
                "save_changes",
                last_error(&self.lib).unwrap_or_else(|| format!("bridge status {status}")),
            ));
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            unsafe {
                let close: Symbol<CloseFn> = self
                    .lib
                    .get(b"pbi_model_close\0")
                    .map_err(|e| Error::operation("close_write", e))?;
                close(handle);
            }
        }
        Ok(())
    }
}

impl Drop for NativeWriteSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.close();
        }
    }
}
