//! Bee Tools - 面向 LLM Agent 的工具箱
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 工具错误类型、工具箱构建器
//! - **observability**: tracing 日志初始化
//! - **tools**: 工具（内容搜索、文件分析、JSON 修改、应用路径登记、浏览器）、注册表与执行器

pub mod config;
pub mod core;
pub mod observability;
pub mod tools;

pub use crate::core::{ToolError, ToolboxBuilder};
pub use crate::tools::ToolExecutor;
