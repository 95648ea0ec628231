//! Status badge: pill-shaped tag colored by value-matching rules.

use crate::rendering::template::{DaxVisual, Segment, escape_dax};
use crate::rendering::tokens::Theme;
use crate::rendering::{StatusRule, VisualSpec};

/// Default rule set for common workflow states.
pub(crate) fn default_rules() -> Vec<StatusRule> {
    vec![
        StatusRule::new("Done", "success", "\u{2713}"),
        StatusRule::new("In Progress", "warning", "\u{25d0}"),
        StatusRule::new("Late", "danger", "\u{2717}"),
        StatusRule::new("Not Started", "secondary", "\u{25cb}"),
    ]
}

pub(crate) fn build(theme: &Theme, spec: &VisualSpec, rules: &[StatusRule]) -> DaxVisual {
    let c = &theme.colors;

    // Each SWITCH arm packs "icon value|color" into one string; the badge
    // unpacks it with LEFT/FIND/MID below.
    let mut arms = Vec::with_capacity(rules.len());
    for rule in rules {
        let color = c.semantic(&rule.color);
        arms.push(format!(
            "_Value = \"{}\", \"{} \" & _Value & \"|{color}\"",
            escape_dax(&rule.value),
            escape_dax(&rule.icon)
        ));
    }
    let switch = format!(
        "\n    SWITCH(\n        TRUE(),\n        {},\n        \"\u{25cf} \" & _Value & \"|{}\"\n    )",
        arms.join(",\n        "),
        c.text_secondary
    );

    let mut visual = DaxVisual::new(spec.output_name.clone());
    visual.var("_Value", spec.measure.clone());
    visual.var("_Config", switch);
    visual.var("_Text", "LEFT(_Config, FIND(\"|\", _Config) - 1)");
    visual.var("_Color", "MID(_Config, FIND(\"|\", _Config) + 1, 100)");

    visual.push(Segment::lit("<span style='display: inline-block; background: "));
    visual.push(Segment::var("_Color"));
    visual.push(Segment::lit("22; color: "));
    visual.push(Segment::var("_Color"));
    visual.push(Segment::lit(format!(
        "; padding: 6px 12px; border-radius: 20px; font-size: 12px; font-weight: 500; font-family: {}; border: 1px solid ",
        theme.font_family
    )));
    visual.push(Segment::var("_Color"));
    visual.push(Segment::lit("44;'>"));
    visual.push(Segment::var("_Text"));
    visual.push(Segment::lit("</span>"));
    visual
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::rendering::tokens::get_theme;
    use crate::rendering::{ComponentKind, FormatKind};

    fn spec() -> VisualSpec {
        VisualSpec {
            kind: ComponentKind::StatusBadge,
            measure: "[Project Status]".to_string(),
            variation_measure: None,
            target_measure: None,
            title: None,
            format: FormatKind::Number,
            size: 120,
            rules: None,
            output_name: "[Project Status] Badge".to_string(),
        }
    }

    #[test]
    fn test_default_rules_map_to_theme_colors() {
        let theme = get_theme("dark_neon").unwrap();
        let dax = build(theme, &spec(), &default_rules()).render_dax();

        assert!(dax.contains("_Value = \"Done\", \"\u{2713} \" & _Value & \"|#00f5d4\""));
        assert!(dax.contains("|#ffd60a"));
        assert!(dax.contains("|#ff6b6b"));
        // Fallback arm uses the secondary text color.
        assert!(dax.contains("\"\u{25cf} \" & _Value & \"|#a0a0a0\""));
    }

    #[test]
    fn test_unpacking_vars_present() {
        let theme = get_theme("dark_neon").unwrap();
        let dax = build(theme, &spec(), &default_rules()).render_dax();
        assert!(dax.contains("VAR _Text = LEFT(_Config, FIND(\"|\", _Config) - 1)"));
        assert!(dax.contains("VAR _Color = MID(_Config, FIND(\"|\", _Config) + 1, 100)"));
    }

    #[test]
    fn test_rule_values_are_quote_escaped() {
        let theme = get_theme("dark_neon").unwrap();
        let rules = vec![StatusRule::new("He said \"go\"", "accent", "!")];
        let dax = build(theme, &spec(), &rules).render_dax();
        assert!(dax.contains("_Value = \"He said \"\"go\"\"\""));
    }
}
