//! MCP server implementation.
//!
//! Provides a Model Context Protocol server for AI agent interoperability.
//!
//! ## Tools
//!
//! - `connect_and_scan_schema`
//! - `list_style_presets`
//! - `generate_html_measure`
//! - `preview_visual_local`
//! - `apply_conditional_format`
//!
//! ## Usage
//!
//! ```bash
//! pbiux serve
//! ```
//!
//! ### Client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "pbiux": {
//!       "command": "pbiux",
//!       "args": ["serve"]
//!     }
//!   }
//! }
//! ```

// Allow unnecessary wraps for handlers that return Result for API consistency.
#![allow(clippy::unnecessary_wraps)]
// Allow ok_or with function calls - the error path is uncommon.
#![allow(clippy::or_fun_call)]

mod dispatch;
mod server;
mod tools;

pub use server::{McpServer, RateLimitConfig};
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult};
