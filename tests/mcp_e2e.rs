//! MCP end-to-end tests.
//!
//! Exercise the tool registry the way an MCP client would: list tools, call
//! them with JSON arguments and read the JSON bodies back out of the text
//! content. No running Power BI Desktop instance is required.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{FakeClientFactory, shared_model};
use pbiux::config::PbiuxConfig;
use pbiux::connector::PowerBiConnector;
use pbiux::mcp::{ToolContent, ToolRegistry, ToolResult};
use pbiux::services::VisualService;
use serde_json::{Value, json};

fn registry_with_fakes(factory: FakeClientFactory, preview_dir: &std::path::Path) -> ToolRegistry {
    let config = PbiuxConfig::new()
        .with_port(51542)
        .with_preview_dir(preview_dir);
    let connector = PowerBiConnector::with_factory(&config, Box::new(factory));
    ToolRegistry::new(VisualService::with_connector(config, connector))
}

fn body(result: &ToolResult) -> Value {
    let ToolContent::Text { text } = &result.content[0];
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_registry_contains_all_tools() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    assert!(registry.get_tool("connect_and_scan_schema").is_some());
    assert!(registry.get_tool("list_style_presets").is_some());
    assert!(registry.get_tool("generate_html_measure").is_some());
    assert!(registry.get_tool("preview_visual_local").is_some());
    assert!(registry.get_tool("apply_conditional_format").is_some());
    assert_eq!(registry.list_tools().len(), 5);
}

#[test]
fn test_scan_tool_returns_schema() {
    let dir = tempfile::tempdir().unwrap();
    let factory = FakeClientFactory::new(shared_model("Sales")).with_sales_schema();
    let mut registry = registry_with_fakes(factory, dir.path());

    let result = registry.execute("connect_and_scan_schema", json!({})).unwrap();
    assert!(!result.is_error);

    let body = body(&result);
    assert_eq!(body["status"], "connected");
    assert_eq!(body["model_name"], "Sales Model");
    assert_eq!(body["tables"][0]["name"], "Sales");
}

#[test]
fn test_list_presets_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry.execute("list_style_presets", json!({})).unwrap();
    let presets = body(&result);
    let names: Vec<&str> = presets
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "dark_neon",
            "glassmorphism",
            "corporate_clean",
            "executive_dark",
            "data_viz_pro"
        ]
    );
}

#[test]
fn test_generate_kpi_card_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let factory = FakeClientFactory::new(shared_model("Sales")).with_sales_schema();
    let mut registry = registry_with_fakes(factory, dir.path());

    let result = registry
        .execute(
            "generate_html_measure",
            json!({
                "component_type": "kpi_card",
                "measure_name": "[Total Sales]",
                "variation_measure": "[MoM %]",
                "theme": "dark_neon",
                "apply_to_model": false
            }),
        )
        .unwrap();
    assert!(!result.is_error);

    let body = body(&result);
    assert_eq!(body["status"], "success");
    assert_eq!(body["write_status"], "skipped");

    let dax = body["dax_code"].as_str().unwrap();
    assert!(dax.contains("[Total Sales]"));
    // Theme success and danger colors drive the variation styling.
    assert!(dax.contains("#00f5d4"));
    assert!(dax.contains("#ff6b6b"));
}

#[test]
fn test_unknown_component_is_error_result_not_fault() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry
        .execute(
            "generate_html_measure",
            json!({
                "component_type": "bogus_widget",
                "measure_name": "[X]",
                "apply_to_model": false
            }),
        )
        .unwrap();

    assert!(result.is_error);
    let body = body(&result);
    assert_eq!(body["status"], "error");
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("kpi_card"));
    assert!(message.contains("progress_ring"));
    assert!(message.contains("comparison_card"));
    assert!(message.contains("status_badge"));
}

#[test]
fn test_comparison_card_requires_target_measure() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry
        .execute(
            "generate_html_measure",
            json!({
                "component_type": "comparison_card",
                "measure_name": "[Actual]",
                "apply_to_model": false
            }),
        )
        .unwrap();

    assert!(result.is_error);
    let body = body(&result);
    assert!(body["error"].as_str().unwrap().contains("target_measure"));
}

#[test]
fn test_apply_conditional_format_counts_rules() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry
        .execute(
            "apply_conditional_format",
            json!({
                "measure_name": "[Status]",
                "rules": [
                    {"value": "Done", "color": "success", "icon": "✓"},
                    {"value": "Late", "color": "danger", "icon": "✗"}
                ],
                "theme": "corporate_clean"
            }),
        )
        .unwrap();
    assert!(!result.is_error);

    let body = body(&result);
    assert_eq!(body["status"], "success");
    assert_eq!(body["rules_applied"], 2);
    let dax = body["dax_code"].as_str().unwrap();
    // corporate_clean success/danger colors
    assert!(dax.contains("#22c55e"));
    assert!(dax.contains("#ef4444"));
}

#[test]
fn test_preview_tool_writes_file_under_configured_dir() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry
        .execute(
            "preview_visual_local",
            json!({
                "component_type": "progress_ring",
                "measure_name": "[Completion]"
            }),
        )
        .unwrap();
    assert!(!result.is_error);

    let body = body(&result);
    assert_eq!(body["status"], "success");
    let file = body["preview_file"].as_str().unwrap();
    assert!(file.starts_with(dir.path().to_str().unwrap()));
    assert!(std::path::Path::new(file).exists());
}

#[test]
fn test_library_load_failure_surfaces_connection_hint() {
    let dir = tempfile::tempdir().unwrap();
    let factory = FakeClientFactory::new(shared_model("Sales")).broken_bridge();
    let mut registry = registry_with_fakes(factory, dir.path());

    let result = registry.execute("connect_and_scan_schema", json!({})).unwrap();
    assert!(result.is_error);

    let body = body(&result);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("msadomdclient"));
    assert!(
        body["hint"]
            .as_str()
            .unwrap()
            .contains("Power BI Desktop is open")
    );
}

#[test]
fn test_malformed_arguments_fault_with_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry =
        registry_with_fakes(FakeClientFactory::new(shared_model("Sales")), dir.path());

    let result = registry.execute("generate_html_measure", json!({"component_type": 42}));
    assert!(matches!(result, Err(pbiux::Error::InvalidInput(_))));
}
