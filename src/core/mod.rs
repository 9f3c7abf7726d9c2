//! 核心层：错误类型与工具箱构建

pub mod builder;
pub mod error;

pub use builder::{create_toolbox_builder, ToolboxBuilder};
pub use error::{PathKind, ToolError};
