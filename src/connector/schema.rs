//! Schema extraction through schema rowset queries.
//!
//! Table, column and measure metadata comes from the server's `$SYSTEM`
//! schema rowsets. Failures on individual tables are logged and skipped so a
//! half-readable model still yields a partial schema.

use crate::connector::client::QueryClient;
use crate::models::{ModelSchema, TableInfo, strip_brackets};
use regex::Regex;
use std::sync::LazyLock;

const CATALOG_QUERY: &str = "SELECT [CATALOG_NAME] FROM $SYSTEM.DBSCHEMA_CATALOGS";

const TABLES_QUERY: &str = "\
SELECT
    [DIMENSION_UNIQUE_NAME] as TableName
FROM $SYSTEM.MDSCHEMA_DIMENSIONS
WHERE [DIMENSION_TYPE] = 3";

const MEASURES_QUERY: &str = "\
SELECT
    [MEASUREGROUP_NAME] as TableName,
    [MEASURE_NAME] as MeasureName
FROM $SYSTEM.MDSCHEMA_MEASURES
WHERE [MEASURE_IS_VISIBLE]";

/// Matches the trailing `[Column]` part of a hierarchy unique name.
static COLUMN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]$").unwrap_or_else(|_| unreachable!()));

fn columns_query(table_name: &str) -> String {
    format!(
        "\
SELECT
    [HIERARCHY_UNIQUE_NAME] as ColumnName
FROM $SYSTEM.MDSCHEMA_HIERARCHIES
WHERE [DIMENSION_UNIQUE_NAME] = '[{table_name}]'"
    )
}

/// Returns the current catalog name, or `"Unknown"` when it cannot be read.
pub fn model_name(client: &mut dyn QueryClient) -> String {
    match client.execute(CATALOG_QUERY) {
        Ok(rows) => rows
            .get(0, "CATALOG_NAME")
            .map_or_else(|| "Unknown".to_string(), ToString::to_string),
        Err(e) => {
            tracing::debug!(error = %e, "Catalog name query failed");
            "Unknown".to_string()
        }
    }
}

/// Reads the full model schema: tables, columns and visible measures.
///
/// Every metadata query degrades on failure: a failed table listing yields
/// an empty schema, per-table column queries and the measure query log a
/// warning and skip.
pub fn read_schema(client: &mut dyn QueryClient) -> ModelSchema {
    let name = model_name(client);
    let mut schema = ModelSchema::new(name);

    let table_names: Vec<String> = match client.execute(TABLES_QUERY) {
        Ok(tables) => tables
            .column_values("TableName")
            .into_iter()
            .map(|t| strip_brackets(t).to_string())
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Table listing failed, returning empty schema");
            Vec::new()
        }
    };

    for table_name in table_names {
        let mut table = TableInfo::new(table_name.clone());

        match client.execute(&columns_query(&table_name)) {
            Ok(rows) => {
                for raw in rows.column_values("ColumnName") {
                    if let Some(caps) = COLUMN_NAME_RE.captures(raw) {
                        if let Some(m) = caps.get(1) {
                            table.columns.push(m.as_str().to_string());
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(table = %table_name, error = %e, "Column query failed, skipping");
            }
        }

        schema.tables.push(table);
    }

    match client.execute(MEASURES_QUERY) {
        Ok(rows) => {
            for row_idx in 0..rows.rows.len() {
                let Some(table_name) = rows.get(row_idx, "TableName") else {
                    continue;
                };
                let Some(measure_name) = rows.get(row_idx, "MeasureName") else {
                    continue;
                };
                let table_name = table_name.to_string();
                let measure_name = measure_name.to_string();
                // Measures with no matching table are dropped.
                if let Some(table) = schema.tables.iter_mut().find(|t| t.name == table_name) {
                    table.measures.push(measure_name);
                }
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Measure query failed");
        }
    }

    schema
}
