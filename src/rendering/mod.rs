//! Visual generation.
//!
//! Pure, stateless rendering: a [`VisualSpec`] plus a theme yields a
//! [`DaxVisual`], which renders to either the DAX measure definition or a
//! static preview of the same markup.

mod components;
mod preview;
mod template;
mod tokens;

pub use preview::{default_preview_filename, save_preview, wrap_preview_page};
pub use template::{DaxVisual, Segment, escape_dax};
pub use tokens::{THEMES, Theme, ThemeColors, ThemeSummary, get_theme, list_themes};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// The component catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    /// Headline value card with optional variation indicator.
    KpiCard,
    /// Circular SVG progress gauge.
    ProgressRing,
    /// Actual-vs-target card with a progress bar.
    ComparisonCard,
    /// Colored status pill.
    StatusBadge,
}

impl ComponentKind {
    /// All kinds, in listing order.
    pub const ALL: [Self; 4] = [
        Self::KpiCard,
        Self::ProgressRing,
        Self::ComparisonCard,
        Self::StatusBadge,
    ];

    /// Machine name used in requests.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::KpiCard => "kpi_card",
            Self::ProgressRing => "progress_ring",
            Self::ComparisonCard => "comparison_card",
            Self::StatusBadge => "status_badge",
        }
    }

    /// Parses a machine name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] listing the valid set.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.name() == name)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|k| k.name()).collect();
                Error::InvalidInput(format!(
                    "unknown component_type '{name}'. Valid types: {}",
                    valid.join(", ")
                ))
            })
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Number formatting applied to measure values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatKind {
    /// `"$ "#,##0`
    Currency,
    /// `#,##0`
    #[default]
    Number,
    /// `0.0%`
    Percentage,
}

impl FormatKind {
    /// Parses a format name; unknown names fall back to [`Self::Number`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "currency" => Self::Currency,
            "percentage" => Self::Percentage,
            _ => Self::Number,
        }
    }

    /// The raw DAX format pattern.
    #[must_use]
    pub const fn dax_pattern(self) -> &'static str {
        match self {
            Self::Currency => "\"$ \"#,##0",
            Self::Number => "#,##0",
            Self::Percentage => "0.0%",
        }
    }
}

/// A value-to-style mapping rule for status badges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRule {
    /// Measure value to match.
    pub value: String,
    /// Semantic color name (`success`, `warning`, `danger`, `accent`,
    /// `secondary`).
    pub color: String,
    /// Icon glyph shown before the value.
    pub icon: String,
}

impl StatusRule {
    /// Convenience constructor.
    pub fn new(value: impl Into<String>, color: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            color: color.into(),
            icon: icon.into(),
        }
    }
}

/// Default status rules for common workflow states.
#[must_use]
pub fn default_status_rules() -> Vec<StatusRule> {
    components::status_badge::default_rules()
}

/// Everything a component builder needs.
#[derive(Debug, Clone)]
pub struct VisualSpec {
    /// Which component to build.
    pub kind: ComponentKind,
    /// Primary measure reference, e.g. `[Total Sales]`.
    pub measure: String,
    /// Variation measure for KPI cards.
    pub variation_measure: Option<String>,
    /// Target measure for rings and comparison cards.
    pub target_measure: Option<String>,
    /// Title override.
    pub title: Option<String>,
    /// Value formatting.
    pub format: FormatKind,
    /// Ring diameter in pixels.
    pub size: u32,
    /// Status-badge rules; `None` uses the defaults.
    pub rules: Option<Vec<StatusRule>>,
    /// Name of the generated measure.
    pub output_name: String,
}

/// Builds the visual for a spec under a theme.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `comparison_card` is requested
/// without a target measure.
pub fn build_visual(theme: &Theme, spec: &VisualSpec) -> Result<DaxVisual> {
    match spec.kind {
        ComponentKind::KpiCard => Ok(components::kpi_card::build(theme, spec)),
        ComponentKind::ProgressRing => Ok(components::progress_ring::build(theme, spec)),
        ComponentKind::ComparisonCard => {
            let target = spec.target_measure.as_deref().ok_or_else(|| {
                Error::InvalidInput(
                    "comparison_card requires target_measure".to_string(),
                )
            })?;
            Ok(components::comparison_card::build(theme, spec, target))
        }
        ComponentKind::StatusBadge => {
            let defaults;
            let rules = match &spec.rules {
                Some(rules) => rules.as_slice(),
                None => {
                    defaults = components::status_badge::default_rules();
                    defaults.as_slice()
                }
            };
            Ok(components::status_badge::build(theme, spec, rules))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_component_kind_roundtrip() {
        for kind in ComponentKind::ALL {
            assert_eq!(ComponentKind::parse(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_component_lists_valid_set() {
        let err = ComponentKind::parse("bogus_widget").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bogus_widget"));
        assert!(msg.contains("kpi_card"));
        assert!(msg.contains("status_badge"));
    }

    #[test]
    fn test_format_parse_falls_back_to_number() {
        assert_eq!(FormatKind::parse("currency"), FormatKind::Currency);
        assert_eq!(FormatKind::parse("whatever"), FormatKind::Number);
    }

    fn assert_tag_balanced(dax: &str, tag: &str) {
        let open = dax.matches(&format!("<{tag} ")).count()
            + dax.matches(&format!("<{tag}>")).count();
        let close = dax.matches(&format!("</{tag}>")).count();
        assert_eq!(open, close, "unbalanced <{tag}> in:\n{dax}");
    }

    #[test]
    fn test_every_theme_and_component_renders_balanced_markup() {
        for theme in &THEMES {
            for kind in ComponentKind::ALL {
                let spec = VisualSpec {
                    kind,
                    measure: "[Total Sales]".to_string(),
                    variation_measure: Some("[MoM %]".to_string()),
                    target_measure: Some("[Target]".to_string()),
                    title: None,
                    format: FormatKind::Currency,
                    size: 120,
                    rules: None,
                    output_name: "Sales HTML".to_string(),
                };
                let dax = build_visual(theme, &spec).unwrap().render_dax();

                // Every double quote in a string literal is doubled, so
                // after removing the doubled pairs the remainder pairs up.
                let stripped = dax.replace("\"\"", "");
                assert_eq!(
                    stripped.matches('"').count() % 2,
                    0,
                    "odd quote count for {kind} under {}:\n{dax}",
                    theme.name
                );

                for tag in ["div", "span", "p", "h1", "svg", "text"] {
                    assert_tag_balanced(&dax, tag);
                }
            }
        }
    }

    #[test]
    fn test_comparison_card_requires_target() {
        let theme = get_theme("dark_neon").unwrap();
        let spec = VisualSpec {
            kind: ComponentKind::ComparisonCard,
            measure: "[A]".to_string(),
            variation_measure: None,
            target_measure: None,
            title: None,
            format: FormatKind::Currency,
            size: 120,
            rules: None,
            output_name: "[A] HTML".to_string(),
        };
        let err = build_visual(theme, &spec).unwrap_err();
        assert!(err.to_string().contains("target_measure"));
    }
}
