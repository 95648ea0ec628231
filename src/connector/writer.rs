//! Measure upsert against the model object tree.

use crate::connector::client::WriteSession;
use crate::models::{ModelMeasure, strip_brackets};
use crate::{Error, Result};

/// Strips a leading `Name =` assignment from a measure definition.
///
/// The write API expects only the expression (the right-hand side). A first
/// line starting with `VAR` or `RETURN` is already an expression and is kept
/// whole even when it contains `=`.
#[must_use]
pub fn strip_assignment(dax_code: &str) -> String {
    let trimmed = dax_code.trim();
    let first_line = trimmed.lines().next().unwrap_or("").trim();
    let upper = first_line.to_uppercase();

    if first_line.contains('=') && !upper.starts_with("VAR") && !upper.starts_with("RETURN") {
        if let Some((_, rest)) = trimmed.split_once('=') {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Creates or updates a measure and commits the change.
///
/// The table is resolved by exact name first, then with surrounding brackets
/// stripped (schema output uses `[Table]` form).
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the table does not exist, or the
/// session's error when the commit fails.
pub fn upsert_measure(
    session: &mut dyn WriteSession,
    table_name: &str,
    measure_name: &str,
    dax_code: &str,
    description: &str,
) -> Result<()> {
    let expression = strip_assignment(dax_code);

    let model = session.model_mut()?;
    let clean_name = strip_brackets(table_name);
    let table = model
        .tables
        .iter_mut()
        .find(|t| t.name == table_name || t.name == clean_name)
        .ok_or_else(|| Error::InvalidInput(format!("table '{table_name}' not found in model")))?;

    if let Some(existing) = table.measures.iter_mut().find(|m| m.name == measure_name) {
        tracing::info!(measure = %measure_name, "Updating existing measure");
        existing.expression = expression;
        if !description.is_empty() {
            existing.description = Some(description.to_string());
        }
    } else {
        tracing::info!(measure = %measure_name, table = %table.name, "Creating measure");
        table.measures.push(ModelMeasure {
            name: measure_name.to_string(),
            expression,
            description: (!description.is_empty()).then(|| description.to_string()),
        });
    }

    session.save_changes()
}
