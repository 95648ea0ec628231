//! Visual component builders.
//!
//! Each component assembles a [`crate::rendering::DaxVisual`] from a theme
//! and request parameters. Builders are pure; validation happens in the
//! dispatching layer.

pub(crate) mod comparison_card;
pub(crate) mod kpi_card;
pub(crate) mod progress_ring;
pub(crate) mod status_badge;

use crate::rendering::tokens::Theme;

/// Inline CSS shared by card-shaped components.
pub(crate) fn card_style(theme: &Theme) -> String {
    let c = &theme.colors;
    let mut style = format!(
        "background: linear-gradient(135deg, {} 0%, {} 100%); border-radius: {}; padding: 24px; font-family: {}; box-shadow: {}; border: 1px solid {};",
        c.bg_primary, c.bg_secondary, theme.border_radius, theme.font_family, c.shadow, c.border
    );
    if let Some(filter) = theme.backdrop_filter {
        style.push_str(" backdrop-filter: ");
        style.push_str(filter);
        style.push(';');
    }
    style
}

/// Default title derived from a measure reference.
pub(crate) fn default_title(measure: &str) -> String {
    crate::models::strip_brackets(measure).to_uppercase()
}
