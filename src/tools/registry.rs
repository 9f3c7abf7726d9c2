//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时并统一展平错误。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::ToolError;

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（用于 JSON 中的 "tool" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    /// 默认返回空对象，表示无参数或参数格式不限
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 本次调用的时间预算；None 表示沿用执行器的全局超时
    fn timeout(&self, _args: &Value) -> Option<Duration> {
        None
    }

    /// 执行工具；错误保持类型化，由执行器决定如何展示
    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，支持 register / get / execute / tool_names
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args).await
    }

    /// 已注册工具名（排序，便于 CLI 输出稳定）
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// 返回 (name, description) 列表，用于生成 prompt 中的 Available tools 段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        let mut items: Vec<(String, String)> = self
            .tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        items
    }

    /// 动态生成工具 schema JSON（与实际注册的工具一致，包含参数 schema）
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tool_names()
            .iter()
            .filter_map(|name| self.tools.get(name).map(|tool| (name, tool)))
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Agent 传入的原始字符串：能解析为 JSON 就按 JSON，否则按纯文本
pub fn parse_tool_input(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// 「纯字符串或带某个键的对象」类输入：取字符串、对象中第一个命中的键，其余值取 JSON 文本
pub fn text_arg(args: &Value, keys: &[&str]) -> String {
    match args {
        Value::String(s) => s.clone(),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .unwrap_or_default(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        fn name(&self) -> &str {
            "ping"
        }

        fn description(&self) -> &str {
            "Reply pong"
        }

        async fn execute(&self, _args: Value) -> Result<String, ToolError> {
            Ok("pong".to_string())
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);

        assert_eq!(registry.tool_names(), vec!["ping".to_string()]);
        let out = registry.execute("ping", Value::Null).await.unwrap();
        assert_eq!(out, "pong");

        let err = registry.execute("nope", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "nope"));
    }

    #[test]
    fn test_schema_json_lists_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);
        let schema: Value = serde_json::from_str(&registry.to_schema_json()).unwrap();
        assert_eq!(schema[0]["name"], "ping");
        assert_eq!(schema[0]["parameters"]["type"], "object");
    }

    #[test]
    fn test_parse_tool_input() {
        assert_eq!(parse_tool_input("{\"a\": 1}")["a"], 1);
        assert_eq!(
            parse_tool_input("docs/report.pdf"),
            Value::String("docs/report.pdf".to_string())
        );
    }

    #[test]
    fn test_text_arg() {
        let keys = ["file_path", "path"];
        assert_eq!(text_arg(&Value::String("a.txt".into()), &keys), "a.txt");
        assert_eq!(text_arg(&serde_json::json!({"path": "b.txt"}), &keys), "b.txt");
        assert_eq!(text_arg(&serde_json::json!(42), &keys), "42");
        assert_eq!(text_arg(&serde_json::json!({"other": 1}), &keys), "");
    }
}
