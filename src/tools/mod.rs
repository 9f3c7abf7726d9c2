pub mod app_paths;
pub mod browser;
pub mod content_search;
pub mod executor;
pub mod file_analyzer;
pub mod json_patch;
pub mod paths;
pub mod registry;

pub use app_paths::{
    AppPathRegistry, GetApplicationPathTool, GetStoredApplicationPathTool,
    StoreApplicationPathTool,
};
pub use browser::{BrowserAgent, BrowserTaskTool, WebpageContentTool};
pub use content_search::SearchFileContentTool;
pub use executor::ToolExecutor;
pub use file_analyzer::AnalyzeFileTool;
pub use json_patch::{deep_merge, ModifyJsonFileTool};
pub use registry::{parse_tool_input, Tool, ToolRegistry};
