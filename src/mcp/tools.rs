//! MCP tool implementations.
//!
//! Tool handlers wrap [`VisualService`] methods. Service errors become
//! structured `{status: "error"}` JSON results rather than JSON-RPC faults,
//! so a closed Power BI Desktop shows up as tool output the caller can act
//! on.

use crate::services::{FormatRequest, GenerateRequest, PreviewRequest, VisualService};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

const CONNECTION_HINT: &str =
    "Make sure Power BI Desktop is open with a model loaded.";

/// Registry of MCP tools.
pub struct ToolRegistry {
    /// Available tools.
    tools: HashMap<String, ToolDefinition>,
    /// Session state shared by the handlers.
    service: VisualService,
}

impl ToolRegistry {
    /// Creates a registry with all pbiux tools.
    #[must_use]
    pub fn new(service: VisualService) -> Self {
        let mut tools = HashMap::new();

        tools.insert(
            "connect_and_scan_schema".to_string(),
            ToolDefinition {
                name: "connect_and_scan_schema".to_string(),
                description: "Connect to the running Power BI Desktop instance and return the model schema: tables, columns and measures"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        );

        tools.insert(
            "list_style_presets".to_string(),
            ToolDefinition {
                name: "list_style_presets".to_string(),
                description: "List the available style presets (themes) for generated visuals"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {},
                    "required": []
                }),
            },
        );

        tools.insert(
            "generate_html_measure".to_string(),
            ToolDefinition {
                name: "generate_html_measure".to_string(),
                description: "Generate a DAX measure containing styled HTML/CSS for the 'HTML Content' visual, optionally writing it into the open model"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "component_type": {
                            "type": "string",
                            "description": "Component to generate",
                            "enum": ["kpi_card", "progress_ring", "comparison_card", "status_badge"]
                        },
                        "measure_name": {
                            "type": "string",
                            "description": "Source measure exactly as it appears in the model, with brackets (e.g. \"[Total Sales]\")"
                        },
                        "variation_measure": {
                            "type": "string",
                            "description": "Optional variation measure for kpi_card (e.g. \"[MoM %]\")"
                        },
                        "target_measure": {
                            "type": "string",
                            "description": "Target measure for comparison_card and progress_ring"
                        },
                        "title": {
                            "type": "string",
                            "description": "Title shown in the visual; derived from the measure name when omitted"
                        },
                        "theme": {
                            "type": "string",
                            "description": "Theme name; see list_style_presets (defaults to the configured theme)"
                        },
                        "format_type": {
                            "type": "string",
                            "description": "Value formatting",
                            "enum": ["currency", "number", "percentage"]
                        },
                        "output_measure_name": {
                            "type": "string",
                            "description": "Name for the generated measure (default: '<source> HTML')"
                        },
                        "output_table_name": {
                            "type": "string",
                            "description": "Table to create the measure in (default: first table in the schema)"
                        },
                        "apply_to_model": {
                            "type": "boolean",
                            "description": "Write the measure into the open model (default: true)"
                        }
                    },
                    "required": ["component_type", "measure_name"]
                }),
            },
        );

        tools.insert(
            "preview_visual_local".to_string(),
            ToolDefinition {
                name: "preview_visual_local".to_string(),
                description: "Render a component with mock data and save a local HTML preview file"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "component_type": {
                            "type": "string",
                            "enum": ["kpi_card", "progress_ring", "comparison_card", "status_badge"]
                        },
                        "measure_name": { "type": "string" },
                        "variation_measure": { "type": "string" },
                        "target_measure": { "type": "string" },
                        "title": { "type": "string" },
                        "theme": { "type": "string" },
                        "format_type": {
                            "type": "string",
                            "enum": ["currency", "number", "percentage"]
                        },
                        "mock_value": {
                            "type": "number",
                            "description": "Mock headline value (default: 1250000)"
                        },
                        "mock_variation": {
                            "type": "number",
                            "description": "Mock variation ratio (default: 0.125)"
                        }
                    },
                    "required": ["component_type", "measure_name"]
                }),
            },
        );

        tools.insert(
            "apply_conditional_format".to_string(),
            ToolDefinition {
                name: "apply_conditional_format".to_string(),
                description: "Generate a status-badge measure whose color and icon follow value-matching rules"
                    .to_string(),
                input_schema: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "measure_name": {
                            "type": "string",
                            "description": "Measure to evaluate (e.g. \"[Status]\")"
                        },
                        "rules": {
                            "type": "array",
                            "description": "Value-to-style rules. Colors: success, warning, danger, accent, secondary",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "value": { "type": "string" },
                                    "color": { "type": "string" },
                                    "icon": { "type": "string" }
                                },
                                "required": ["value", "color", "icon"]
                            }
                        },
                        "theme": { "type": "string" }
                    },
                    "required": ["measure_name", "rules"]
                }),
            },
        );

        Self { tools, service }
    }

    /// Returns all tool definitions.
    #[must_use]
    pub fn list_tools(&self) -> Vec<&ToolDefinition> {
        self.tools.values().collect()
    }

    /// Gets a tool definition by name.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Executes a tool with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown tools and malformed arguments; service
    /// failures come back as `Ok` with an error-shaped body.
    pub fn execute(&mut self, name: &str, arguments: Value) -> Result<ToolResult> {
        match name {
            "connect_and_scan_schema" => self.execute_scan(),
            "list_style_presets" => self.execute_list_presets(),
            "generate_html_measure" => self.execute_generate(arguments),
            "preview_visual_local" => self.execute_preview(arguments),
            "apply_conditional_format" => self.execute_conditional_format(arguments),
            _ => Err(Error::InvalidInput(format!("Unknown tool: {name}"))),
        }
    }

    fn execute_scan(&mut self) -> Result<ToolResult> {
        match self.service.connect_and_scan_schema() {
            Ok(response) => json_result(&response),
            Err(e) => error_result(&e),
        }
    }

    fn execute_list_presets(&self) -> Result<ToolResult> {
        json_result(&self.service.list_style_presets())
    }

    fn execute_generate(&mut self, arguments: Value) -> Result<ToolResult> {
        let request: GenerateRequest =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))?;

        match self.service.generate_html_measure(&request) {
            Ok(response) => json_result(&response),
            Err(e) => error_result(&e),
        }
    }

    fn execute_preview(&mut self, arguments: Value) -> Result<ToolResult> {
        let request: PreviewRequest =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))?;

        match self.service.preview_visual_local(&request) {
            Ok(response) => json_result(&response),
            Err(e) => error_result(&e),
        }
    }

    fn execute_conditional_format(&mut self, arguments: Value) -> Result<ToolResult> {
        let request: FormatRequest =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidInput(e.to_string()))?;

        match self.service.apply_conditional_format(&request) {
            Ok(response) => json_result(&response),
            Err(e) => error_result(&e),
        }
    }
}

/// Serializes a response as a text tool result.
fn json_result<T: Serialize>(response: &T) -> Result<ToolResult> {
    let text = serde_json::to_string_pretty(response)
        .map_err(|e| Error::operation("serialize_tool_result", e))?;
    Ok(ToolResult {
        content: vec![ToolContent::Text { text }],
        is_error: false,
    })
}

/// Shapes a service error as an error-status JSON body.
fn error_result(error: &Error) -> Result<ToolResult> {
    let mut body = serde_json::json!({
        "status": "error",
        "error": error.to_string(),
    });
    if matches!(error, Error::ProcessNotFound(_) | Error::Connection { .. }) {
        body["hint"] = Value::String(CONNECTION_HINT.to_string());
    }
    let text = serde_json::to_string_pretty(&body)
        .map_err(|e| Error::operation("serialize_tool_result", e))?;
    Ok(ToolResult {
        content: vec![ToolContent::Text { text }],
        is_error: true,
    })
}

/// Definition of an MCP tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name.
    pub name: String,
    /// Tool description.
    pub description: String,
    /// JSON Schema for input validation.
    pub input_schema: Value,
}

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
    /// Whether the result represents an error.
    #[serde(default)]
    pub is_error: bool,
}

/// Content types that can be returned by tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}
