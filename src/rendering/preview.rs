//! Local HTML preview output.

use crate::rendering::ComponentKind;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Wraps rendered component markup in a standalone HTML page.
#[must_use]
pub fn wrap_preview_page(content: &str) -> String {
    let generated = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    format!(
        r#"<!DOCTYPE html>
<!-- generated {generated} -->
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Power BI Visual Preview</title>
    <link href="https://fonts.googleapis.com/css2?family=Inter:wght@400;500;600;700&display=swap" rel="stylesheet">
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            background: linear-gradient(135deg, #1a1a2e 0%, #16213e 100%);
            padding: 40px;
        }}
    </style>
</head>
<body>
    {content}
</body>
</html>
"#
    )
}

/// Default preview file name for a component/theme pair.
#[must_use]
pub fn default_preview_filename(kind: ComponentKind, theme_name: &str) -> String {
    format!("preview_{kind}_{theme_name}.html")
}

/// Writes a preview page under `dir`, creating the directory when needed.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] on filesystem failures.
pub fn save_preview(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| Error::operation("save_preview", e))?;
    let path = dir.join(filename);
    std::fs::write(&path, content).map_err(|e| Error::operation("save_preview", e))?;
    tracing::info!(path = %path.display(), "Preview written");
    Ok(path)
}
