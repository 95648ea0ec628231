//! Shared visual template representation.
//!
//! Components build a [`DaxVisual`] once; the same structure renders both the
//! DAX measure (HTML assembled by string concatenation at query time) and the
//! local preview (placeholders substituted with mock values). Keeping one
//! source avoids parsing generated DAX back apart.

use std::collections::HashMap;
use std::fmt::Write;

/// One piece of a visual's HTML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal HTML/CSS text.
    Lit(String),
    /// A DAX variable spliced in as-is.
    Var(String),
    /// A DAX variable passed through `FORMAT` with the given pattern.
    Format {
        /// Variable name.
        var: String,
        /// Raw format pattern, unescaped.
        pattern: String,
    },
}

impl Segment {
    /// Literal segment from anything stringy.
    pub fn lit(text: impl Into<String>) -> Self {
        Self::Lit(text.into())
    }

    /// Variable segment.
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(name.into())
    }

    /// Formatted variable segment.
    pub fn format(var: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Format {
            var: var.into(),
            pattern: pattern.into(),
        }
    }
}

/// A complete visual: measure name, DAX variables and HTML body.
#[derive(Debug, Clone)]
pub struct DaxVisual {
    /// Name of the generated measure.
    pub measure_name: String,
    /// `VAR` definitions in declaration order, as `(name, expression)`.
    pub vars: Vec<(String, String)>,
    /// HTML body segments.
    pub body: Vec<Segment>,
}

impl DaxVisual {
    /// Creates an empty visual with the given measure name.
    #[must_use]
    pub fn new(measure_name: impl Into<String>) -> Self {
        Self {
            measure_name: measure_name.into(),
            vars: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Appends a `VAR` definition.
    pub fn var(&mut self, name: impl Into<String>, expression: impl Into<String>) -> &mut Self {
        self.vars.push((name.into(), expression.into()));
        self
    }

    /// Appends a body segment.
    pub fn push(&mut self, segment: Segment) -> &mut Self {
        self.body.push(segment);
        self
    }

    /// Renders the complete DAX measure definition.
    ///
    /// Literal text lands inside a DAX string, so embedded quotes are
    /// doubled. Variables break out of the string with `&` concatenation.
    #[must_use]
    pub fn render_dax(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.measure_name);
        out.push_str(" = \n");
        for (name, expression) in &self.vars {
            let _ = writeln!(out, "VAR {name} = {expression}");
        }
        out.push_str("RETURN\n\"");
        for segment in &self.body {
            match segment {
                Segment::Lit(text) => out.push_str(&escape_dax(text)),
                Segment::Var(name) => {
                    let _ = write!(out, "\" & {name} & \"");
                }
                Segment::Format { var, pattern } => {
                    let _ = write!(out, "\" & FORMAT({var}, \"{}\") & \"", escape_dax(pattern));
                }
            }
        }
        out.push('"');
        out
    }

    /// Renders the HTML body with mock values in place of variables.
    ///
    /// Missing mocks render as empty for plain variables and `0` for
    /// formatted ones.
    #[must_use]
    pub fn render_preview(&self, mocks: &HashMap<String, String>) -> String {
        let mut out = String::new();
        for segment in &self.body {
            match segment {
                Segment::Lit(text) => out.push_str(text),
                Segment::Var(name) => {
                    out.push_str(mocks.get(name).map_or("", String::as_str));
                }
                Segment::Format { var, .. } => {
                    out.push_str(mocks.get(var).map_or("0", String::as_str));
                }
            }
        }
        out
    }
}

/// Doubles quotes so text can sit inside a DAX string literal.
#[must_use]
pub fn escape_dax(text: &str) -> String {
    text.replace('"', "\"\"")
}
