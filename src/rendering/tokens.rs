//! Design tokens.
//!
//! Colors, typography and surface tokens shared by every component so the
//! generated CSS stays consistent across visuals.

use crate::{Error, Result};
use serde::Serialize;

/// Color palette of a theme.
#[derive(Debug, Clone, Copy)]
pub struct ThemeColors {
    /// Primary card background.
    pub bg_primary: &'static str,
    /// Secondary surface background.
    pub bg_secondary: &'static str,
    /// Accent color.
    pub accent: &'static str,
    /// Secondary accent color.
    pub accent_secondary: &'static str,
    /// Primary text color.
    pub text_primary: &'static str,
    /// Secondary text color.
    pub text_secondary: &'static str,
    /// Positive-state color.
    pub success: &'static str,
    /// Caution-state color.
    pub warning: &'static str,
    /// Negative-state color.
    pub danger: &'static str,
    /// Border color.
    pub border: &'static str,
    /// Box shadow.
    pub shadow: &'static str,
}

impl ThemeColors {
    /// Resolves a semantic color name to its value.
    ///
    /// Unknown names fall back to the secondary text color.
    #[must_use]
    pub fn semantic(&self, name: &str) -> &'static str {
        match name {
            "success" => self.success,
            "warning" => self.warning,
            "danger" => self.danger,
            "accent" => self.accent,
            _ => self.text_secondary,
        }
    }
}

/// A complete visual theme.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    /// Machine name, used in requests.
    pub name: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Short description for preset listings.
    pub description: &'static str,
    /// Color palette.
    pub colors: ThemeColors,
    /// CSS font-family stack.
    pub font_family: &'static str,
    /// Corner radius for cards.
    pub border_radius: &'static str,
    /// Optional CSS backdrop-filter.
    pub backdrop_filter: Option<&'static str>,
}

/// Summary entry returned by preset listings.
#[derive(Debug, Clone, Serialize)]
pub struct ThemeSummary {
    /// Machine name.
    pub name: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Short description.
    pub description: &'static str,
}

/// Built-in themes, in listing order.
pub const THEMES: [Theme; 5] = [
    Theme {
        name: "dark_neon",
        display_name: "Dark Neon",
        description: "Dark background with vibrant neon accents and a glow effect",
        colors: ThemeColors {
            bg_primary: "#0d0d0d",
            bg_secondary: "#1a1a2e",
            accent: "#00f5d4",
            accent_secondary: "#7b2cbf",
            text_primary: "#ffffff",
            text_secondary: "#a0a0a0",
            success: "#00f5d4",
            warning: "#ffd60a",
            danger: "#ff6b6b",
            border: "rgba(0, 245, 212, 0.3)",
            shadow: "0 0 20px rgba(0, 245, 212, 0.3)",
        },
        font_family: "'Inter', 'Segoe UI', sans-serif",
        border_radius: "16px",
        backdrop_filter: None,
    },
    Theme {
        name: "glassmorphism",
        display_name: "Glassmorphism",
        description: "Translucent frosted-glass effect with blur",
        colors: ThemeColors {
            bg_primary: "rgba(255, 255, 255, 0.1)",
            bg_secondary: "rgba(255, 255, 255, 0.05)",
            accent: "#667eea",
            accent_secondary: "#764ba2",
            text_primary: "#ffffff",
            text_secondary: "rgba(255, 255, 255, 0.7)",
            success: "#4ade80",
            warning: "#fbbf24",
            danger: "#f87171",
            border: "rgba(255, 255, 255, 0.2)",
            shadow: "0 8px 32px rgba(0, 0, 0, 0.3)",
        },
        font_family: "'Inter', 'Segoe UI', sans-serif",
        border_radius: "20px",
        backdrop_filter: Some("blur(10px)"),
    },
    Theme {
        name: "corporate_clean",
        display_name: "Corporate Clean",
        description: "Clean, professional corporate styling",
        colors: ThemeColors {
            bg_primary: "#ffffff",
            bg_secondary: "#f8fafc",
            accent: "#2563eb",
            accent_secondary: "#3b82f6",
            text_primary: "#1e293b",
            text_secondary: "#64748b",
            success: "#22c55e",
            warning: "#eab308",
            danger: "#ef4444",
            border: "#e2e8f0",
            shadow: "0 4px 6px -1px rgba(0, 0, 0, 0.1)",
        },
        font_family: "'Segoe UI', 'Roboto', sans-serif",
        border_radius: "8px",
        backdrop_filter: None,
    },
    Theme {
        name: "executive_dark",
        display_name: "Executive Dark",
        description: "Elegant and minimal in dark tones",
        colors: ThemeColors {
            bg_primary: "#0f172a",
            bg_secondary: "#1e293b",
            accent: "#38bdf8",
            accent_secondary: "#0ea5e9",
            text_primary: "#f1f5f9",
            text_secondary: "#94a3b8",
            success: "#34d399",
            warning: "#fbbf24",
            danger: "#f87171",
            border: "rgba(148, 163, 184, 0.2)",
            shadow: "0 10px 40px rgba(0, 0, 0, 0.5)",
        },
        font_family: "'Inter', 'Segoe UI', sans-serif",
        border_radius: "12px",
        backdrop_filter: None,
    },
    Theme {
        name: "data_viz_pro",
        display_name: "Data Viz Pro",
        description: "Optimized for data-dense dashboards",
        colors: ThemeColors {
            bg_primary: "#1a1b26",
            bg_secondary: "#24283b",
            accent: "#7aa2f7",
            accent_secondary: "#bb9af7",
            text_primary: "#c0caf5",
            text_secondary: "#565f89",
            success: "#9ece6a",
            warning: "#e0af68",
            danger: "#f7768e",
            border: "rgba(122, 162, 247, 0.2)",
            shadow: "0 4px 12px rgba(0, 0, 0, 0.4)",
        },
        font_family: "'JetBrains Mono', 'Consolas', monospace",
        border_radius: "8px",
        backdrop_filter: None,
    },
];

/// Looks up a theme by machine name.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the available themes when the name
/// is unknown.
pub fn get_theme(name: &str) -> Result<&'static Theme> {
    THEMES.iter().find(|t| t.name == name).ok_or_else(|| {
        let available: Vec<&str> = THEMES.iter().map(|t| t.name).collect();
        Error::InvalidInput(format!(
            "theme '{name}' not found. Available: {}",
            available.join(", ")
        ))
    })
}

/// Lists all themes in declaration order.
#[must_use]
pub fn list_themes() -> Vec<ThemeSummary> {
    THEMES
        .iter()
        .map(|t| ThemeSummary {
            name: t.name,
            display_name: t.display_name,
            description: t.description,
        })
        .collect()
}
