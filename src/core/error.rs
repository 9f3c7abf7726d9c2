//! 工具错误类型
//!
//! 所有工具返回 `Result<String, ToolError>`；仅在最外层（ToolExecutor::run）展平为以 `Error` 开头的字符串交给 Agent。

use std::fmt;

use thiserror::Error;

/// 期望的路径类型（用于 NotFound / WrongPathType 的提示文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    File,
    Directory,
}

impl PathKind {
    fn noun(self) -> &'static str {
        match self {
            PathKind::File => "file",
            PathKind::Directory => "directory",
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::File => f.write_str("File"),
            PathKind::Directory => f.write_str("Directory"),
        }
    }
}

/// 工具执行过程中可能出现的错误（输入格式、路径、解析、I/O、浏览器、超时等）
#[derive(Error, Debug)]
pub enum ToolError {
    /// 输入格式错误（缺字段、类型不对）；文本原样返回给 LLM
    #[error("{0}")]
    InvalidInput(String),

    #[error("{kind} '{path}' does not exist")]
    NotFound { kind: PathKind, path: String },

    #[error("'{}' is not a {}", .path, .kind.noun())]
    WrongPathType { kind: PathKind, path: String },

    #[error("The file '{0}' does not contain valid JSON")]
    InvalidJson(String),

    #[error("The content of '{0}' is not a JSON object")]
    NotJsonObject(String),

    #[error("Error reading file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// 备份失败时不做任何合并与写入
    #[error("Error creating backup file: {0}")]
    Backup(#[source] std::io::Error),

    /// 原子写入失败：原文件未被修改，.bak 仍在
    #[error("Error writing updated data to '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Error fetching webpage: {0}")]
    Fetch(String),

    #[error("Browser task failed: {0}")]
    Browser(String),

    #[error("Tool timeout: {0}")]
    Timeout(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl ToolError {
    /// 稳定的错误类别标签，写入审计日志
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::InvalidInput(_) => "invalid_input",
            ToolError::NotFound { .. } => "not_found",
            ToolError::WrongPathType { .. } => "wrong_path_type",
            ToolError::InvalidJson(_) => "invalid_json",
            ToolError::NotJsonObject(_) => "not_json_object",
            ToolError::Read { .. } => "read",
            ToolError::Backup(_) => "backup",
            ToolError::Write { .. } => "write",
            ToolError::Fetch(_) => "fetch",
            ToolError::Browser(_) => "browser",
            ToolError::Timeout(_) => "timeout",
            ToolError::UnknownTool(_) => "unknown_tool",
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ToolError::InvalidInput(msg.into())
    }

    /// 展平为交给 Agent 的字符串；自带 "Error ..." 前缀的 I/O 类错误原样返回
    pub fn to_agent_string(&self) -> String {
        match self {
            ToolError::Read { .. }
            | ToolError::Backup(_)
            | ToolError::Write { .. }
            | ToolError::Fetch(_) => self.to_string(),
            _ => format!("Error: {}", self),
        }
    }
}
