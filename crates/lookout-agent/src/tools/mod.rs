//! Tool modules for the Lookout agent.

pub mod base;
pub mod document;
pub mod filesystem;
pub mod finish;
pub mod registry;

pub use base::{first_string, optional_string, require_string, Tool, ToolArgs, ToolDescriptor};
pub use finish::FINISH_TOOL;
pub use registry::ToolRegistry;
