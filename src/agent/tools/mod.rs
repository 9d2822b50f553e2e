//! Tool registry for agent capabilities.

mod registry;

pub use registry::{AgentTool, AgentToolRegistry, ToolContext, ToolDefinition, ToolError};
