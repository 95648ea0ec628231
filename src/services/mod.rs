//! Tool-facing service layer.
//!
//! [`VisualService`] owns the connector session and the configuration; every
//! MCP tool maps to one method here. Methods return typed responses; error
//! shaping for the wire happens in the MCP layer.

use crate::config::PbiuxConfig;
use crate::connector::PowerBiConnector;
use crate::models::TableInfo;
use crate::rendering::{
    self, ComponentKind, DaxVisual, FormatKind, StatusRule, ThemeSummary, VisualSpec,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const RING_SIZE: u32 = 120;

/// Response of [`VisualService::connect_and_scan_schema`].
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    /// Always `"connected"` on success.
    pub status: &'static str,
    /// Port the connection uses.
    pub port: Option<u16>,
    /// Catalog name.
    pub model_name: String,
    /// Tables with their columns and measures.
    pub tables: Vec<TableInfo>,
}

/// Parameters of [`VisualService::generate_html_measure`].
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Component kind, by machine name.
    pub component_type: String,
    /// Primary measure reference, e.g. `[Total Sales]`.
    pub measure_name: String,
    /// Variation measure for KPI cards.
    #[serde(default)]
    pub variation_measure: Option<String>,
    /// Target measure for rings and comparison cards.
    #[serde(default)]
    pub target_measure: Option<String>,
    /// Title override.
    #[serde(default)]
    pub title: Option<String>,
    /// Theme name; the configured default theme when unset.
    #[serde(default)]
    pub theme: Option<String>,
    /// Value format: `currency`, `number` or `percentage`.
    #[serde(default = "default_format")]
    pub format_type: String,
    /// Name for the generated measure; derived from the source when unset.
    #[serde(default)]
    pub output_measure_name: Option<String>,
    /// Table to create the measure in; first schema table when unset.
    #[serde(default)]
    pub output_table_name: Option<String>,
    /// Whether to write the measure into the open model.
    #[serde(default = "default_true")]
    pub apply_to_model: bool,
}

/// Parameters of [`VisualService::preview_visual_local`].
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    /// Component kind, by machine name.
    pub component_type: String,
    /// Primary measure reference.
    pub measure_name: String,
    /// Variation measure for KPI cards.
    #[serde(default)]
    pub variation_measure: Option<String>,
    /// Target measure for rings and comparison cards.
    #[serde(default)]
    pub target_measure: Option<String>,
    /// Title override.
    #[serde(default)]
    pub title: Option<String>,
    /// Theme name; the configured default theme when unset.
    #[serde(default)]
    pub theme: Option<String>,
    /// Value format.
    #[serde(default = "default_format")]
    pub format_type: String,
    /// Mock headline value.
    #[serde(default = "default_mock_value")]
    pub mock_value: f64,
    /// Mock variation ratio.
    #[serde(default = "default_mock_variation")]
    pub mock_variation: f64,
}

/// Parameters of [`VisualService::apply_conditional_format`].
#[derive(Debug, Clone, Deserialize)]
pub struct FormatRequest {
    /// Measure to evaluate.
    pub measure_name: String,
    /// Value-to-style rules.
    pub rules: Vec<StatusRule>,
    /// Theme name; the configured default theme when unset.
    #[serde(default)]
    pub theme: Option<String>,
}

fn default_format() -> String {
    "currency".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_mock_value() -> f64 {
    1_250_000.0
}

const fn default_mock_variation() -> f64 {
    0.125
}

/// Response of [`VisualService::generate_html_measure`].
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// Always `"success"` when the visual rendered.
    pub status: &'static str,
    /// `"success"`, `"skipped"` or `"error"`.
    pub write_status: &'static str,
    /// Human-readable write outcome.
    pub write_message: String,
    /// Echo of the component kind.
    pub component_type: String,
    /// Echo of the theme.
    pub theme: String,
    /// The generated measure definition.
    pub dax_code: String,
    /// Name of the written measure, when the write succeeded.
    pub measure_name_created: Option<String>,
    /// Follow-up steps for the caller.
    pub instructions: Vec<String>,
}

/// Response of [`VisualService::preview_visual_local`].
#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// Path of the written HTML file.
    pub preview_file: String,
    /// Human-readable outcome.
    pub message: String,
    /// Follow-up steps for the caller.
    pub instructions: Vec<String>,
}

/// Response of [`VisualService::apply_conditional_format`].
#[derive(Debug, Serialize)]
pub struct FormatResponse {
    /// Always `"success"`.
    pub status: &'static str,
    /// The generated measure definition.
    pub dax_code: String,
    /// Number of rules applied.
    pub rules_applied: usize,
}

/// Session state behind the MCP tools.
pub struct VisualService {
    connector: PowerBiConnector,
    config: PbiuxConfig,
}

impl VisualService {
    /// Creates a service with the native connector.
    #[must_use]
    pub fn new(config: PbiuxConfig) -> Self {
        let connector = PowerBiConnector::new(&config);
        Self { connector, config }
    }

    /// Creates a service with a pre-built connector.
    #[must_use]
    pub const fn with_connector(config: PbiuxConfig, connector: PowerBiConnector) -> Self {
        Self { connector, config }
    }

    /// Connects to the running instance and reads the model schema.
    ///
    /// # Errors
    ///
    /// Returns discovery and connection errors unshaped.
    pub fn connect_and_scan_schema(&mut self) -> Result<ScanResponse> {
        self.connector.connect()?;
        let schema = self.connector.schema()?;
        Ok(ScanResponse {
            status: "connected",
            port: self.connector.port(),
            model_name: schema.model_name,
            tables: schema.tables,
        })
    }

    /// Lists the built-in style presets.
    #[must_use]
    pub fn list_style_presets(&self) -> Vec<ThemeSummary> {
        rendering::list_themes()
    }

    /// Renders a component and, unless skipped, writes it into the model.
    ///
    /// A failing write never fails the call: the response carries
    /// `write_status: "error"` next to the still-valid DAX.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown components, themes or a
    /// missing comparison target.
    pub fn generate_html_measure(&mut self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let theme = self.resolve_theme(request.theme.as_deref());
        let (visual, output_name) = self.render(
            &request.component_type,
            &request.measure_name,
            request.variation_measure.as_deref(),
            request.target_measure.as_deref(),
            request.title.as_deref(),
            &theme,
            &request.format_type,
            request.output_measure_name.as_deref(),
        )?;
        let dax_code = visual.render_dax();

        let (write_status, write_message) = if request.apply_to_model {
            self.apply_measure(&output_name, &dax_code, request)
        } else {
            (
                "skipped",
                "Model write skipped (apply_to_model=false)".to_string(),
            )
        };

        let measure_name_created = (write_status == "success").then(|| output_name.clone());
        let instructions = vec![
            format!("WRITE STATUS: {write_message}"),
            "---".to_string(),
            "If the write failed, apply the code manually:".to_string(),
            "1. In Power BI, create a new measure".to_string(),
            format!("2. Name it: {output_name}"),
            "3. Paste the DAX code".to_string(),
            "4. Use the 'HTML Content' visual".to_string(),
        ];

        Ok(GenerateResponse {
            status: "success",
            write_status,
            write_message,
            component_type: request.component_type.clone(),
            theme,
            dax_code,
            measure_name_created,
            instructions,
        })
    }

    /// Renders a component with mock data and writes a preview HTML file.
    ///
    /// # Errors
    ///
    /// Returns validation errors from rendering and filesystem errors from
    /// the preview writer.
    pub fn preview_visual_local(&mut self, request: &PreviewRequest) -> Result<PreviewResponse> {
        let kind = ComponentKind::parse(&request.component_type)?;
        let theme = self.resolve_theme(request.theme.as_deref());
        let (visual, _) = self.render(
            &request.component_type,
            &request.measure_name,
            request.variation_measure.as_deref(),
            request.target_measure.as_deref(),
            request.title.as_deref(),
            &theme,
            &request.format_type,
            None,
        )?;

        let mocks = mock_values(&theme, request.mock_value, request.mock_variation)?;
        let body = visual.render_preview(&mocks);
        let page = rendering::wrap_preview_page(&body);

        let filename = rendering::default_preview_filename(kind, &theme);
        let path = rendering::save_preview(&self.config.preview_dir, &filename, &page)?;
        let path_display = path.display().to_string();

        Ok(PreviewResponse {
            status: "success",
            preview_file: path_display.clone(),
            message: format!("Preview saved to: {path_display}"),
            instructions: vec![
                format!("1. Open the file in a browser: {path_display}"),
                "2. Check how the component will look".to_string(),
                "3. Adjust the parameters if needed".to_string(),
            ],
        })
    }

    /// Generates a status badge driven by caller-supplied rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown themes.
    pub fn apply_conditional_format(&self, request: &FormatRequest) -> Result<FormatResponse> {
        let theme = rendering::get_theme(&self.resolve_theme(request.theme.as_deref()))?;
        let clean = crate::models::strip_brackets(&request.measure_name);
        let spec = VisualSpec {
            kind: ComponentKind::StatusBadge,
            measure: request.measure_name.clone(),
            variation_measure: None,
            target_measure: None,
            title: None,
            format: FormatKind::Number,
            size: RING_SIZE,
            rules: Some(request.rules.clone()),
            output_name: format!("{clean} Badge"),
        };
        let visual = rendering::build_visual(theme, &spec)?;

        Ok(FormatResponse {
            status: "success",
            dax_code: visual.render_dax(),
            rules_applied: request.rules.len(),
        })
    }

    /// Closes the connector session.
    pub fn disconnect(&mut self) {
        self.connector.disconnect();
    }

    fn resolve_theme(&self, requested: Option<&str>) -> String {
        requested.map_or_else(|| self.config.default_theme.clone(), ToString::to_string)
    }

    #[allow(clippy::too_many_arguments)]
    fn render(
        &self,
        component_type: &str,
        measure_name: &str,
        variation_measure: Option<&str>,
        target_measure: Option<&str>,
        title: Option<&str>,
        theme_name: &str,
        format_type: &str,
        output_measure_name: Option<&str>,
    ) -> Result<(DaxVisual, String)> {
        let kind = ComponentKind::parse(component_type)?;
        let theme = rendering::get_theme(theme_name)?;

        let output_name = output_measure_name.map_or_else(
            || {
                let clean = crate::models::strip_brackets(measure_name);
                format!("{clean} HTML")
            },
            ToString::to_string,
        );

        let spec = VisualSpec {
            kind,
            measure: measure_name.to_string(),
            variation_measure: variation_measure.map(ToString::to_string),
            target_measure: target_measure.map(ToString::to_string),
            title: title.map(ToString::to_string),
            format: FormatKind::parse(format_type),
            size: RING_SIZE,
            rules: None,
            output_name: output_name.clone(),
        };

        let visual = rendering::build_visual(theme, &spec)?;
        Ok((visual, output_name))
    }

    /// Writes the generated measure into the model, degrading to a status
    /// pair instead of an error.
    fn apply_measure(
        &mut self,
        output_name: &str,
        dax_code: &str,
        request: &GenerateRequest,
    ) -> (&'static str, String) {
        let table = match &request.output_table_name {
            Some(table) => Some(table.clone()),
            None => match self.first_schema_table() {
                Ok(table) => table,
                Err(e) => {
                    tracing::error!(error = %e, "Automatic write failed");
                    return ("error", write_failure_message(&e));
                }
            },
        };

        let Some(table) = table else {
            return (
                "error",
                "No table found to create the measure in.".to_string(),
            );
        };

        let description = format!(
            "{} visual generated by pbiux",
            request.component_type
        );
        match self
            .connector
            .upsert_measure(&table, output_name, dax_code, &description)
        {
            Ok(()) => (
                "success",
                format!("Measure '{output_name}' created in table '{table}'."),
            ),
            Err(e) => {
                tracing::error!(error = %e, "Automatic write failed");
                ("error", write_failure_message(&e))
            }
        }
    }

    fn first_schema_table(&mut self) -> Result<Option<String>> {
        if !self.connector.is_connected() {
            self.connector.connect()?;
        }
        let schema = self.connector.schema()?;
        Ok(schema.tables.first().map(|t| t.name.clone()))
    }
}

fn write_failure_message(error: &Error) -> String {
    format!("Automatic write failed: {error}. Is 'Allow external tools to modify the model' enabled?")
}

/// Mock substitution values shared by all components.
#[allow(clippy::cast_possible_truncation)]
fn mock_values(
    theme_name: &str,
    mock_value: f64,
    mock_variation: f64,
) -> Result<HashMap<String, String>> {
    let theme = rendering::get_theme(theme_name)?;
    let c = &theme.colors;
    let positive = mock_variation >= 0.0;

    let value = mock_value as i64;
    let actual = (mock_value * 0.85) as i64;
    let target = value;
    let percent_display = (mock_value / 10_000.0) as i64;

    // Ring geometry mirrors the default 120px ring.
    let radius = f64::from(RING_SIZE - 8) / 2.0;
    let circumference = 2.0 * std::f64::consts::PI * radius;
    let ratio = (mock_value / 10_000.0 / 100.0).min(1.0);
    let offset = circumference * (1.0 - ratio);

    let mut mocks = HashMap::new();
    mocks.insert("_Value".to_string(), value.to_string());
    mocks.insert("_Variation".to_string(), mock_variation.to_string());
    mocks.insert(
        "_Color".to_string(),
        if positive { c.success } else { c.danger }.to_string(),
    );
    mocks.insert(
        "_Arrow".to_string(),
        if positive { "\u{25b2}" } else { "\u{25bc}" }.to_string(),
    );
    mocks.insert("_PercentDisplay".to_string(), percent_display.to_string());
    mocks.insert("_Offset".to_string(), format!("{offset:.2}"));
    mocks.insert("_Actual".to_string(), actual.to_string());
    mocks.insert("_Target".to_string(), target.to_string());
    mocks.insert("_Diff".to_string(), (actual - target).to_string());
    mocks.insert(
        "_Sign".to_string(),
        if actual >= target { "+" } else { "" }.to_string(),
    );
    mocks.insert(
        "_Status".to_string(),
        if actual >= target { "\u{2713}" } else { "\u{2717}" }.to_string(),
    );
    mocks.insert(
        "_StatusColor".to_string(),
        if actual >= target { c.success } else { c.danger }.to_string(),
    );
    mocks.insert("_BarWidth".to_string(), "85".to_string());
    mocks.insert("_Text".to_string(), "\u{25cf} Sample".to_string());
    Ok(mocks)
}
