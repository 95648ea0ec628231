//! Progress ring: circular SVG gauge with conditional color.

use super::default_title;
use crate::rendering::template::{DaxVisual, Segment};
use crate::rendering::tokens::Theme;
use crate::rendering::VisualSpec;

const STROKE_WIDTH: u32 = 8;

pub(crate) fn build(theme: &Theme, spec: &VisualSpec) -> DaxVisual {
    let c = &theme.colors;
    let title = spec
        .title
        .clone()
        .unwrap_or_else(|| default_title(&spec.measure));

    let size = spec.size;
    let radius = f64::from(size - STROKE_WIDTH) / 2.0;
    let circumference = 2.0 * std::f64::consts::PI * radius;
    let center = f64::from(size) / 2.0;

    let mut visual = DaxVisual::new(spec.output_name.clone());
    visual.var("_Value", spec.measure.clone());

    if let Some(target) = &spec.target_measure {
        visual.var("_Target", target.clone());
        visual.var("_Percent", "DIVIDE(_Value, _Target, 0)");
    } else {
        // Without a target the measure itself is the 0..1 ratio.
        visual.var("_Percent", "_Value");
    }

    visual.var("_PercentDisplay", "_Percent * 100");
    visual.var("_Circumference", format!("{circumference:.2}"));
    visual.var("_Offset", "_Circumference * (1 - MIN(_Percent, 1))");
    visual.var(
        "_Color",
        format!(
            "\n    SWITCH(\n        TRUE(),\n        _Percent >= 1, \"{}\",\n        _Percent >= 0.7, \"{}\",\n        \"{}\"\n    )",
            c.success, c.warning, c.danger
        ),
    );

    visual.push(Segment::lit(format!(
        "<div style='text-align: center; font-family: {};'>\n    <svg width='{size}' height='{size}' viewBox='0 0 {size} {size}'>\n        <circle cx='{center}' cy='{center}' r='{radius:.1}' fill='none' stroke='{}' stroke-width='{STROKE_WIDTH}'/>\n        <circle cx='{center}' cy='{center}' r='{radius:.1}' fill='none' stroke='",
        theme.font_family, c.bg_secondary
    )));
    visual.push(Segment::var("_Color"));
    visual.push(Segment::lit(format!(
        "' stroke-width='{STROKE_WIDTH}' stroke-linecap='round' stroke-dasharray='{circumference:.2}' stroke-dashoffset='"
    )));
    visual.push(Segment::var("_Offset"));
    visual.push(Segment::lit(format!(
        "' transform='rotate(-90 {center} {center})' style='transition: stroke-dashoffset 0.5s ease;'/>\n        <text x='50%' y='50%' text-anchor='middle' dy='0.3em' style='font-size: 24px; font-weight: 600; fill: {};'>",
        c.text_primary
    )));
    visual.push(Segment::format("_PercentDisplay", "0"));
    visual.push(Segment::lit(format!(
        "%</text>\n    </svg>\n    <p style='color: {}; font-size: 12px; margin-top: 8px;'>{title}</p>\n</div>",
        c.text_secondary
    )));
    visual
}
