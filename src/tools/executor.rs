//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，execute(tool_name, args) 在超时内调用 registry.execute，
//! 工具自带时间预算（Tool::timeout）时以工具为准；超时转为 ToolError::Timeout；每次调用输出结构化审计日志（JSON）。
//! run(tool_name, raw) 是 Agent 边界：解析原始输入，错误展平为 "Error: ..." 字符串，绝不向外抛出。

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::time::timeout;

use crate::core::ToolError;
use crate::tools::registry::parse_tool_input;
use crate::tools::{Tool, ToolRegistry};

/// 工具执行器：对每次调用施加超时，并记录审计日志
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 执行指定工具；超时返回 ToolError::Timeout；输出 JSON 审计日志
    pub async fn execute(&self, tool_name: &str, args: Value) -> Result<String, ToolError> {
        let start = Instant::now();
        let args_preview = args_preview(&args);
        let limit = self
            .registry
            .get(tool_name)
            .and_then(|tool| tool.timeout(&args))
            .unwrap_or(self.timeout);
        let result = match timeout(limit, self.registry.execute(tool_name, args)).await {
            Ok(inner) => inner,
            Err(_) => Err(ToolError::Timeout(tool_name.to_string())),
        };

        let (ok, outcome, error_kind) = match &result {
            Ok(_) => (true, "ok", None),
            Err(ToolError::Timeout(_)) => (false, "timeout", Some("timeout")),
            Err(e) => (false, "error", Some(e.kind())),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "error_kind": error_kind,
            "duration_ms": duration_ms,
            "args_preview": args_preview,
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        result
    }

    /// Agent 边界：原始字符串输入 → 字符串输出（成功内容或 "Error: ..."）
    pub async fn run(&self, tool_name: &str, raw_input: &str) -> String {
        let args = parse_tool_input(raw_input);
        match self.execute(tool_name, args).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(tool = %tool_name, kind = e.kind(), error = %e, "tool failed");
                e.to_agent_string()
            }
        }
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.registry.get(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.tool_names()
    }

    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.registry.tool_descriptions()
    }

    pub fn schema_json(&self) -> String {
        self.registry.to_schema_json()
    }
}

fn args_preview(args: &Value) -> String {
    let s = args.to_string();
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s
    }
}
