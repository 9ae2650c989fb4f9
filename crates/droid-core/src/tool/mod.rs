//! Tool system
//!
//! Named capabilities that agents invoke with keyword arguments.

pub mod registry;
pub mod traits;

pub use registry::{ToolRegistry, DELEGATE_TOOL_NAME};
pub use traits::{require_str, FnTool, Tool, ToolArgs, ToolResult};
