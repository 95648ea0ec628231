//! Service-level integration tests over fake clients.
//!
//! These exercise the full connect/scan/generate/write paths without a
//! running Power BI Desktop instance.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use common::{FakeClientFactory, find_measure, shared_model};
use pbiux::config::PbiuxConfig;
use pbiux::connector::PowerBiConnector;
use pbiux::services::{GenerateRequest, PreviewRequest, VisualService};

fn service_with_fakes(factory: FakeClientFactory, preview_dir: &std::path::Path) -> VisualService {
    let config = PbiuxConfig::new()
        .with_port(51542)
        .with_preview_dir(preview_dir);
    let connector = PowerBiConnector::with_factory(&config, Box::new(factory));
    VisualService::with_connector(config, connector)
}

fn generate_request(apply: bool) -> GenerateRequest {
    serde_json::from_value(serde_json::json!({
        "component_type": "kpi_card",
        "measure_name": "[Total Sales]",
        "variation_measure": "[MoM %]",
        "theme": "dark_neon",
        "apply_to_model": apply
    }))
    .unwrap()
}

#[test]
fn test_library_failure_on_connect_is_a_connection_error() {
    let factory = FakeClientFactory::new(shared_model("Sales")).broken_bridge();
    let config = PbiuxConfig::new().with_port(51542);
    let mut connector = PowerBiConnector::with_factory(&config, Box::new(factory));

    let error = connector.connect().unwrap_err();
    assert!(matches!(error, pbiux::Error::Connection { .. }));
    assert!(error.to_string().contains("msadomdclient"));
}

#[test]
fn test_scan_returns_schema_from_query_connection() {
    let model = shared_model("Sales");
    let factory = FakeClientFactory::new(model).with_sales_schema();
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let response = service.connect_and_scan_schema().unwrap();
    assert_eq!(response.status, "connected");
    assert_eq!(response.port, Some(51542));
    assert_eq!(response.model_name, "Sales Model");
    assert_eq!(response.tables.len(), 1);
    assert_eq!(response.tables[0].name, "Sales");
    assert_eq!(response.tables[0].columns, vec!["Amount", "Region"]);
    assert_eq!(response.tables[0].measures, vec!["Total Sales"]);
}

#[test]
fn test_generate_writes_measure_into_first_table() {
    let model = shared_model("Sales");
    let factory = FakeClientFactory::new(model.clone()).with_sales_schema();
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let response = service.generate_html_measure(&generate_request(true)).unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.write_status, "success");
    assert_eq!(
        response.measure_name_created.as_deref(),
        Some("Total Sales HTML")
    );

    let measure = find_measure(&model, "Sales", "Total Sales HTML").unwrap();
    // The committed expression is the right-hand side of the definition.
    assert!(measure.expression.contains("VAR _Value = [Total Sales]"));
    assert!(!measure.expression.starts_with("Total Sales HTML ="));
    assert_eq!(
        measure.description.as_deref(),
        Some("kpi_card visual generated by pbiux")
    );
}

#[test]
fn test_generate_skips_write_when_disabled() {
    let model = shared_model("Sales");
    let factory = FakeClientFactory::new(model.clone()).with_sales_schema();
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let response = service.generate_html_measure(&generate_request(false)).unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.write_status, "skipped");
    assert!(response.measure_name_created.is_none());
    assert!(response.dax_code.contains("[Total Sales]"));
    assert!(find_measure(&model, "Sales", "Total Sales HTML").is_none());
}

#[test]
fn test_write_failure_is_partial_success() {
    let model = shared_model("Sales");
    let factory = FakeClientFactory::new(model.clone())
        .with_sales_schema()
        .failing_saves();
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let response = service.generate_html_measure(&generate_request(true)).unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.write_status, "error");
    assert!(response.write_message.contains("Allow external tools"));
    // The DAX is still usable for manual application.
    assert!(response.dax_code.contains("[Total Sales]"));
    assert!(find_measure(&model, "Sales", "Total Sales HTML").is_none());
}

#[test]
fn test_explicit_output_table_skips_schema_scan() {
    let model = shared_model("Metrics");
    // No canned schema responses at all; the write must not need them.
    let factory = FakeClientFactory::new(model.clone());
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let request: GenerateRequest = serde_json::from_value(serde_json::json!({
        "component_type": "status_badge",
        "measure_name": "[State]",
        "output_table_name": "Metrics",
        "output_measure_name": "State Badge"
    }))
    .unwrap();

    let response = service.generate_html_measure(&request).unwrap();
    assert_eq!(response.write_status, "success");
    assert!(find_measure(&model, "Metrics", "State Badge").is_some());
}

#[test]
fn test_preview_writes_html_file() {
    let model = shared_model("Sales");
    let factory = FakeClientFactory::new(model);
    let dir = tempfile::tempdir().unwrap();
    let mut service = service_with_fakes(factory, dir.path());

    let request: PreviewRequest = serde_json::from_value(serde_json::json!({
        "component_type": "kpi_card",
        "measure_name": "[Total Sales]",
        "variation_measure": "[MoM %]",
        "theme": "glassmorphism"
    }))
    .unwrap();

    let response = service.preview_visual_local(&request).unwrap();
    assert_eq!(response.status, "success");
    assert!(response.preview_file.ends_with("preview_kpi_card_glassmorphism.html"));

    let html = std::fs::read_to_string(&response.preview_file).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    // Mock values replace the DAX variables.
    assert!(html.contains("1,250,000") || html.contains("1250000"));
    // No concatenation markers survive into the preview.
    assert!(!html.contains("\" & "));
}
