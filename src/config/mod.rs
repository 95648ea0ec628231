//! Configuration management.
//!
//! Configuration is layered: a TOML config file (platform config dir or
//! `PBIUX_CONFIG_PATH`), then environment overrides (`PBIUX_PORT`,
//! `PBIUX_QUERY_LIB`, `PBIUX_WRITE_LIB`, `PBIUX_PREVIEW_DIR`). A `.env` file
//! in the working directory is honoured via `dotenvy` before the environment
//! is read.

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for pbiux.
#[derive(Debug, Clone)]
pub struct PbiuxConfig {
    /// Analytics-server port; `None` means discover via the process locator.
    pub port: Option<u16>,
    /// Explicit path to the query client library.
    pub query_library: Option<PathBuf>,
    /// Explicit path to the write (tabular object model) client library.
    pub write_library: Option<PathBuf>,
    /// Directory where preview HTML files are written.
    pub preview_dir: PathBuf,
    /// Theme applied when a request does not name one.
    pub default_theme: String,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Analytics-server port.
    pub port: Option<u16>,
    /// Query client library path.
    pub query_library: Option<String>,
    /// Write client library path.
    pub write_library: Option<String>,
    /// Preview output directory.
    pub preview_dir: Option<String>,
    /// Default theme name.
    pub default_theme: Option<String>,
}

impl Default for PbiuxConfig {
    fn default() -> Self {
        Self {
            port: None,
            query_library: None,
            write_library: None,
            preview_dir: PathBuf::from("previews"),
            default_theme: "dark_neon".to_string(),
        }
    }
}

impl PbiuxConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::operation("read_config_file", e))?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::operation("parse_config_file", e))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/pbiux/` on macOS)
    /// 2. XDG config dir (`~/.config/pbiux/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("PBIUX_CONFIG_PATH") {
            match Self::load_from_file(std::path::Path::new(&path)) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to load config from PBIUX_CONFIG_PATH");
                }
            }
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("pbiux").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("pbiux")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Loads configuration from the default location and applies environment
    /// overrides.
    #[must_use]
    pub fn load() -> Self {
        Self::load_default().with_env_overrides()
    }

    /// Applies `PBIUX_*` environment overrides on top of this configuration.
    ///
    /// An unparsable `PBIUX_PORT` is logged as a warning and ignored rather
    /// than failing startup.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("PBIUX_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.port = Some(p),
                Err(_) => tracing::warn!(value = %port, "Invalid PBIUX_PORT, ignoring"),
            }
        }
        if let Ok(path) = std::env::var("PBIUX_QUERY_LIB") {
            if !path.trim().is_empty() {
                self.query_library = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("PBIUX_WRITE_LIB") {
            if !path.trim().is_empty() {
                self.write_library = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("PBIUX_PREVIEW_DIR") {
            if !dir.trim().is_empty() {
                self.preview_dir = PathBuf::from(dir);
            }
        }
        self
    }

    /// Converts a `ConfigFile` to `PbiuxConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(port) = file.port {
            config.port = Some(port);
        }
        if let Some(path) = file.query_library {
            config.query_library = Some(PathBuf::from(path));
        }
        if let Some(path) = file.write_library {
            config.write_library = Some(PathBuf::from(path));
        }
        if let Some(dir) = file.preview_dir {
            config.preview_dir = PathBuf::from(dir);
        }
        if let Some(theme) = file.default_theme {
            config.default_theme = theme;
        }

        config
    }

    /// Sets the analytics-server port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the query client library path.
    #[must_use]
    pub fn with_query_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.query_library = Some(path.into());
        self
    }

    /// Sets the preview output directory.
    #[must_use]
    pub fn with_preview_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.preview_dir = path.into();
        self
    }
}
