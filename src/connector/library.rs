//! Locating the vendor client libraries on disk.
//!
//! Resolution order for each library kind: explicit configuration, known
//! install locations, then (for the query library) a recursive search near
//! the server executable. When nothing matches, the loader falls back to
//! OS-resolved library names.

use std::path::{Path, PathBuf};

/// File name of the query client library.
pub const QUERY_LIBRARY_NAME: &str = "Microsoft.AnalysisServices.AdomdClient.dll";

/// File name of the write (tabular object model) client library.
pub const WRITE_LIBRARY_NAME: &str = "Microsoft.AnalysisServices.Tabular.dll";

/// Companion library the write library depends on.
pub const WRITE_COMPANION_NAME: &str = "Microsoft.AnalysisServices.Core.dll";

/// Known install locations of the query client library, newest first.
const QUERY_LIBRARY_PATHS: &[&str] = &[
    r"C:\Program Files\Microsoft.NET\ADOMD.NET\160\Microsoft.AnalysisServices.AdomdClient.dll",
    r"C:\Program Files\Microsoft.NET\ADOMD.NET\150\Microsoft.AnalysisServices.AdomdClient.dll",
    r"C:\Program Files (x86)\Microsoft.NET\ADOMD.NET\160\Microsoft.AnalysisServices.AdomdClient.dll",
    r"C:\Program Files (x86)\Microsoft.NET\ADOMD.NET\150\Microsoft.AnalysisServices.AdomdClient.dll",
];

/// Known install locations of the write client library, newest first.
const WRITE_LIBRARY_PATHS: &[&str] = &[
    r"C:\Program Files\Microsoft SQL Server\160\SDK\Assemblies\Microsoft.AnalysisServices.Tabular.dll",
    r"C:\Program Files\Microsoft SQL Server\150\SDK\Assemblies\Microsoft.AnalysisServices.Tabular.dll",
    r"C:\Program Files\Microsoft SQL Server\140\SDK\Assemblies\Microsoft.AnalysisServices.Tabular.dll",
    r"C:\Program Files (x86)\Microsoft SQL Server\160\SDK\Assemblies\Microsoft.AnalysisServices.Tabular.dll",
    r"C:\Program Files (x86)\Microsoft SQL Server\150\SDK\Assemblies\Microsoft.AnalysisServices.Tabular.dll",
];

/// Which client library is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    /// Read-only query client.
    Query,
    /// Model write client.
    Write,
}

impl LibraryKind {
    /// The library's file name.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Query => QUERY_LIBRARY_NAME,
            Self::Write => WRITE_LIBRARY_NAME,
        }
    }

    const fn known_paths(self) -> &'static [&'static str] {
        match self {
            Self::Query => QUERY_LIBRARY_PATHS,
            Self::Write => WRITE_LIBRARY_PATHS,
        }
    }
}

/// Resolves client library paths from configuration and the filesystem.
#[derive(Debug, Clone, Default)]
pub struct LibrarySearch {
    query_override: Option<PathBuf>,
    write_override: Option<PathBuf>,
}

impl LibrarySearch {
    /// Builds a search from configured override paths.
    #[must_use]
    pub fn from_config(config: &crate::PbiuxConfig) -> Self {
        Self {
            query_override: config.query_library.clone(),
            write_override: config.write_library.clone(),
        }
    }

    /// Resolves a library path, or `None` to let the loader use OS lookup.
    ///
    /// `exe_hint` is the server executable discovered by the process locator;
    /// installations commonly ship the query client alongside it.
    #[must_use]
    pub fn find(&self, kind: LibraryKind, exe_hint: Option<&Path>) -> Option<PathBuf> {
        let configured = match kind {
            LibraryKind::Query => self.query_override.as_ref(),
            LibraryKind::Write => self.write_override.as_ref(),
        };
        if let Some(path) = configured {
            if path.exists() {
                return Some(path.clone());
            }
            tracing::warn!(path = %path.display(), "Configured library path does not exist");
        }

        for candidate in kind.known_paths() {
            let candidate = Path::new(candidate);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Found library at known location");
                return Some(candidate.to_path_buf());
            }
        }

        if kind == LibraryKind::Query {
            if let Some(dir) = exe_hint.and_then(Path::parent) {
                if let Some(found) = proximity_search(dir, kind.file_name()) {
                    tracing::info!(path = %found.display(), "Found library near server executable");
                    return Some(found);
                }
            }
        }

        None
    }
}

/// Resolves the companion library sitting next to a resolved write library.
///
/// Returns `None` when the sibling file is absent; the write client still
/// works against installations that ship a self-contained library.
#[must_use]
pub fn companion_path(write_library: &Path) -> Option<PathBuf> {
    let path = write_library.parent()?.join(WRITE_COMPANION_NAME);
    path.exists().then_some(path)
}

/// Recursively searches `dir` for a file named `name`.
fn proximity_search(dir: &Path, name: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
        } else if path.file_name().is_some_and(|f| f == name) {
            return Some(path);
        }
    }

    subdirs.into_iter().find_map(|sub| proximity_search(&sub, name))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join(QUERY_LIBRARY_NAME);
        std::fs::write(&lib, b"").unwrap();

        let search = LibrarySearch {
            query_override: Some(lib.clone()),
            write_override: None,
        };
        assert_eq!(search.find(LibraryKind::Query, None), Some(lib));
    }

    #[test]
    fn test_missing_configured_path_is_skipped() {
        let search = LibrarySearch {
            query_override: Some(PathBuf::from("/definitely/not/here.dll")),
            write_override: None,
        };
        // Known Windows locations do not exist either, and no exe hint.
        assert_eq!(search.find(LibraryKind::Query, None), None);
    }

    #[test]
    fn test_proximity_search_descends_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("bin").join("x64");
        std::fs::create_dir_all(&nested).unwrap();
        let lib = nested.join(QUERY_LIBRARY_NAME);
        std::fs::write(&lib, b"").unwrap();

        assert_eq!(proximity_search(dir.path(), QUERY_LIBRARY_NAME), Some(lib));
        assert_eq!(proximity_search(dir.path(), WRITE_LIBRARY_NAME), None);
    }

    #[test]
    fn test_companion_resolves_next_to_write_library() {
        let dir = tempfile::tempdir().unwrap();
        let write = dir.path().join(WRITE_LIBRARY_NAME);
        std::fs::write(&write, b"").unwrap();

        assert_eq!(companion_path(&write), None);

        let companion = dir.path().join(WRITE_COMPANION_NAME);
        std::fs::write(&companion, b"").unwrap();
        assert_eq!(companion_path(&write), Some(companion));
    }

    #[test]
    fn test_exe_hint_drives_query_search() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join(QUERY_LIBRARY_NAME);
        std::fs::write(&lib, b"").unwrap();
        let exe = dir.path().join("msmdsrv.exe");

        let search = LibrarySearch::default();
        assert_eq!(search.find(LibraryKind::Query, Some(&exe)), Some(lib));
        // Write libraries are never resolved by proximity.
        assert_eq!(search.find(LibraryKind::Write, Some(&exe)), None);
    }
}
