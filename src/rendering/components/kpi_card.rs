//! KPI card: headline value with optional variation indicator.

use super::{card_style, default_title};
use crate::rendering::template::{DaxVisual, Segment};
use crate::rendering::tokens::Theme;
use crate::rendering::VisualSpec;

pub(crate) fn build(theme: &Theme, spec: &VisualSpec) -> DaxVisual {
    let c = &theme.colors;
    let title = spec
        .title
        .clone()
        .unwrap_or_else(|| default_title(&spec.measure));

    let mut visual = DaxVisual::new(spec.output_name.clone());
    visual.var("_Value", spec.measure.clone());

    if let Some(variation) = &spec.variation_measure {
        visual.var("_Variation", variation.clone());
        visual.var(
            "_Color",
            format!("IF(_Variation >= 0, \"{}\", \"{}\")", c.success, c.danger),
        );
        visual.var("_Arrow", "IF(_Variation >= 0, \"\u{25b2}\", \"\u{25bc}\")");
    }

    visual.push(Segment::lit(format!(
        "<div style='{}'>\n    <p style='color: {}; font-size: 11px; margin: 0; text-transform: uppercase; letter-spacing: 1px;'>{}</p>\n    <h1 style='color: {}; font-size: 32px; margin: 8px 0; font-weight: 600;'>",
        card_style(theme),
        c.text_secondary,
        title,
        c.text_primary
    )));
    visual.push(Segment::format("_Value", spec.format.dax_pattern()));
    visual.push(Segment::lit("</h1>\n"));

    if spec.variation_measure.is_some() {
        visual.push(Segment::lit("    <span style='color: "));
        visual.push(Segment::var("_Color"));
        visual.push(Segment::lit("; font-size: 14px;'>"));
        visual.push(Segment::var("_Arrow"));
        visual.push(Segment::lit(" "));
        visual.push(Segment::format("_Variation", "0.0%"));
        visual.push(Segment::lit("</span>\n"));
    }

    visual.push(Segment::lit("</div>"));
    visual
}
