//! Binary entry point for pbiux.
//!
//! This binary provides the CLI interface and the MCP server for the
//! Power BI visual generator.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print macros in the main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use pbiux::config::PbiuxConfig;
use pbiux::mcp::{McpServer, ToolRegistry};
use pbiux::observability;
use pbiux::rendering::default_status_rules;
use pbiux::services::{FormatRequest, GenerateRequest, PreviewRequest, VisualService};
use std::path::PathBuf;
use std::process::ExitCode;

/// Pbiux - Power BI Desktop visual generator with an MCP interface.
#[derive(Parser)]
#[command(name = "pbiux")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server over stdio.
    Serve,

    /// Connect to Power BI Desktop and print the model schema.
    Scan,

    /// List available style presets.
    Themes,

    /// Generate a styled DAX measure.
    Generate {
        /// Component type: kpi_card, progress_ring, comparison_card, status_badge.
        component: String,

        /// Source measure, with brackets (e.g. "[Total Sales]").
        measure: String,

        /// Variation measure for kpi_card.
        #[arg(long)]
        variation: Option<String>,

        /// Target measure for comparison_card and progress_ring.
        #[arg(long)]
        target: Option<String>,

        /// Title shown in the visual.
        #[arg(long)]
        title: Option<String>,

        /// Theme name; the configured default theme when omitted.
        #[arg(long)]
        theme: Option<String>,

        /// Value format: currency, number or percentage.
        #[arg(long, default_value = "currency")]
        format: String,

        /// Write the measure into the open model.
        #[arg(long)]
        apply: bool,
    },

    /// Render a component with mock data into a local HTML preview.
    Preview {
        /// Component type.
        component: String,

        /// Source measure.
        measure: String,

        /// Variation measure for kpi_card.
        #[arg(long)]
        variation: Option<String>,

        /// Target measure for comparison_card and progress_ring.
        #[arg(long)]
        target: Option<String>,

        /// Theme name; the configured default theme when omitted.
        #[arg(long)]
        theme: Option<String>,

        /// Mock headline value.
        #[arg(long, default_value = "1250000")]
        mock_value: f64,

        /// Mock variation ratio.
        #[arg(long, default_value = "0.125")]
        mock_variation: f64,
    },

    /// Generate a conditional-format badge with the default rule set.
    Badge {
        /// Measure to evaluate.
        measure: String,

        /// Theme name; the configured default theme when omitted.
        #[arg(long)]
        theme: Option<String>,
    },
}

fn main() -> ExitCode {
    // A missing .env is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init(cli.verbose);

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&std::path::Path>) -> pbiux::Result<PbiuxConfig> {
    match path {
        Some(path) => Ok(PbiuxConfig::load_from_file(path)?.with_env_overrides()),
        None => Ok(PbiuxConfig::load()),
    }
}

fn run_command(command: Commands, config: PbiuxConfig) -> pbiux::Result<()> {
    match command {
        Commands::Serve => cmd_serve(config),
        Commands::Scan => cmd_scan(config),
        Commands::Themes => cmd_themes(config),
        Commands::Generate {
            component,
            measure,
            variation,
            target,
            title,
            theme,
            format,
            apply,
        } => cmd_generate(
            config, component, measure, variation, target, title, theme, format, apply,
        ),
        Commands::Preview {
            component,
            measure,
            variation,
            target,
            theme,
            mock_value,
            mock_variation,
        } => cmd_preview(
            config,
            component,
            measure,
            variation,
            target,
            theme,
            mock_value,
            mock_variation,
        ),
        Commands::Badge { measure, theme } => cmd_badge(config, measure, theme),
    }
}

fn cmd_serve(config: PbiuxConfig) -> pbiux::Result<()> {
    tracing::info!("Starting pbiux MCP server");
    let registry = ToolRegistry::new(VisualService::new(config));
    McpServer::new(registry).start()
}

fn cmd_scan(config: PbiuxConfig) -> pbiux::Result<()> {
    let mut service = VisualService::new(config);
    let response = service.connect_and_scan_schema()?;
    println!(
        "{}",
        serde_json::to_string_pretty(&response)
            .map_err(|e| pbiux::Error::operation("serialize_schema", e))?
    );
    Ok(())
}

fn cmd_themes(_config: PbiuxConfig) -> pbiux::Result<()> {
    for theme in pbiux::rendering::list_themes() {
        println!("{:<18} {:<16} {}", theme.name, theme.display_name, theme.description);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_generate(
    config: PbiuxConfig,
    component: String,
    measure: String,
    variation: Option<String>,
    target: Option<String>,
    title: Option<String>,
    theme: Option<String>,
    format: String,
    apply: bool,
) -> pbiux::Result<()> {
    let mut service = VisualService::new(config);
    let request = GenerateRequest {
        component_type: component,
        measure_name: measure,
        variation_measure: variation,
        target_measure: target,
        title,
        theme,
        format_type: format,
        output_measure_name: None,
        output_table_name: None,
        apply_to_model: apply,
    };
    let response = service.generate_html_measure(&request)?;
    println!("-- write: {} ({})", response.write_status, response.write_message);
    println!("{}", response.dax_code);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_preview(
    config: PbiuxConfig,
    component: String,
    measure: String,
    variation: Option<String>,
    target: Option<String>,
    theme: Option<String>,
    mock_value: f64,
    mock_variation: f64,
) -> pbiux::Result<()> {
    let mut service = VisualService::new(config);
    let request = PreviewRequest {
        component_type: component,
        measure_name: measure,
        variation_measure: variation,
        target_measure: target,
        title: None,
        theme,
        format_type: "currency".to_string(),
        mock_value,
        mock_variation,
    };
    let response = service.preview_visual_local(&request)?;
    println!("{}", response.message);
    Ok(())
}

fn cmd_badge(config: PbiuxConfig, measure: String, theme: Option<String>) -> pbiux::Result<()> {
    let service = VisualService::new(config);
    let request = FormatRequest {
        measure_name: measure,
        rules: default_status_rules(),
        theme,
    };
    let response = service.apply_conditional_format(&request)?;
    println!("{}", response.dax_code);
    Ok(())
}
