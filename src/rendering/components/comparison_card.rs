//! Comparison card: actual vs. target with a progress bar.

use super::card_style;
use crate::rendering::template::{DaxVisual, Segment};
use crate::rendering::tokens::Theme;
use crate::rendering::VisualSpec;

pub(crate) fn build(theme: &Theme, spec: &VisualSpec, target: &str) -> DaxVisual {
    let c = &theme.colors;
    let title = spec
        .title
        .clone()
        .unwrap_or_else(|| "ACTUAL VS TARGET".to_string());
    let pattern = spec.format.dax_pattern();

    let mut visual = DaxVisual::new(spec.output_name.clone());
    visual.var("_Actual", spec.measure.clone());
    visual.var("_Target", target.to_string());
    visual.var("_Diff", "_Actual - _Target");
    visual.var("_Percent", "DIVIDE(_Actual, _Target, 0) - 1");
    visual.var("_Status", "IF(_Actual >= _Target, \"\u{2713}\", \"\u{2717}\")");
    visual.var(
        "_StatusColor",
        format!("IF(_Actual >= _Target, \"{}\", \"{}\")", c.success, c.danger),
    );
    visual.var("_BarWidth", "MIN(DIVIDE(_Actual, _Target, 0) * 100, 100)");
    visual.var("_Sign", "IF(_Diff >= 0, \"+\", \"\")");

    visual.push(Segment::lit(format!(
        "<div style='{}'>\n    <div style='display: flex; justify-content: space-between; align-items: center; margin-bottom: 16px;'>\n        <p style='color: {}; font-size: 11px; margin: 0; text-transform: uppercase; letter-spacing: 1px;'>{title}</p>\n        <span style='color: ",
        card_style(theme),
        c.text_secondary
    )));
    visual.push(Segment::var("_StatusColor"));
    visual.push(Segment::lit("; font-size: 20px;'>"));
    visual.push(Segment::var("_Status"));
    visual.push(Segment::lit(format!(
        "</span>\n    </div>\n    <div style='display: flex; justify-content: space-between; margin-bottom: 12px;'>\n        <div>\n            <p style='color: {}; font-size: 10px; margin: 0;'>ACTUAL</p>\n            <p style='color: {}; font-size: 24px; margin: 4px 0; font-weight: 600;'>",
        c.text_secondary, c.text_primary
    )));
    visual.push(Segment::format("_Actual", pattern));
    visual.push(Segment::lit(format!(
        "</p>\n        </div>\n        <div style='text-align: right;'>\n            <p style='color: {}; font-size: 10px; margin: 0;'>TARGET</p>\n            <p style='color: {}; font-size: 24px; margin: 4px 0; font-weight: 400;'>",
        c.text_secondary, c.text_secondary
    )));
    visual.push(Segment::format("_Target", pattern));
    visual.push(Segment::lit(format!(
        "</p>\n        </div>\n    </div>\n    <div style='background: {}; border-radius: 4px; height: 8px; overflow: hidden;'>\n        <div style='background: ",
        c.bg_secondary
    )));
    visual.push(Segment::var("_StatusColor"));
    visual.push(Segment::lit("; width: "));
    visual.push(Segment::var("_BarWidth"));
    visual.push(Segment::lit(
        "%; height: 100%; border-radius: 4px; transition: width 0.5s ease;'></div>\n    </div>\n    <p style='color: ",
    ));
    visual.push(Segment::var("_StatusColor"));
    visual.push(Segment::lit("; font-size: 12px; margin-top: 8px; text-align: center;'>"));
    visual.push(Segment::var("_Sign"));
    visual.push(Segment::format("_Diff", pattern));
    visual.push(Segment::lit(" ("));
    visual.push(Segment::format("_Percent", "+0.0%;-0.0%"));
    visual.push(Segment::lit(")</p>\n</div>"));
    visual
}
