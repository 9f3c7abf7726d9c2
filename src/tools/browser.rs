//! 浏览器相关工具
//!
//! - browser_task：把自然语言指令交给外部浏览器自动化后端（BrowserAgent），原样返回其结果；
//!   每次调用只执行一次，带超时，无重试、无会话复用。
//! - get_webpage_content：GET 页面，HTML 经 html2text 转为可读文本，超长截断。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use reqwest::{Client, Url};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::registry::text_arg;
use crate::tools::Tool;

/// 浏览器自动化后端：执行一条自然语言指令并返回文本结果
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    async fn run(&self, instruction: &str) -> anyhow::Result<String>;
}

/// browser_task 的参数
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct BrowserTaskArgs {
    /// 要执行的浏览器任务描述
    #[serde(default)]
    pub task: Option<String>,
    /// 起始 URL（可选）
    #[serde(default)]
    pub url: Option<String>,
    /// 超时秒数（可选，默认取配置）
    #[serde(default)]
    pub timeout: Option<u64>,
}

impl BrowserTaskArgs {
    /// 纯字符串即任务描述；对象按字段解析
    fn from_value(args: Value) -> Result<Self, ToolError> {
        match args {
            Value::Object(_) => serde_json::from_value(args)
                .map_err(|e| ToolError::invalid_input(format!("Invalid arguments: {}", e))),
            other => Ok(Self {
                task: Some(text_arg(&other, &[])),
                ..Self::default()
            }),
        }
    }

    /// 最终交给后端的指令：有 url 时为 "Go to <url> and <task>"
    pub fn instruction(&self) -> Option<String> {
        let task = self.task.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        Some(match self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            Some(url) => format!("Go to {} and {}", url, task),
            None => task.to_string(),
        })
    }
}

/// 浏览器任务工具：透传给外部自动化后端
pub struct BrowserTaskTool {
    agent: Arc<dyn BrowserAgent>,
    default_timeout: Duration,
}

impl BrowserTaskTool {
    pub fn new(agent: Arc<dyn BrowserAgent>, timeout_secs: u64) -> Self {
        Self {
            agent,
            default_timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 输入中的 timeout 秒数，缺省取配置
    fn limit(&self, requested: Option<u64>) -> Duration {
        requested
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout)
    }
}

#[async_trait]
impl Tool for BrowserTaskTool {
    fn name(&self) -> &str {
        "browser_task"
    }

    fn description(&self) -> &str {
        r#"Performs a browser-related task using a real browser: web searches, navigation, information extraction, form filling and multi-step interactions.

Input can be a simple string describing the task or a JSON object with:
- 'task': description of the browser task to perform (required)
- 'url': starting URL for the task (optional)
- 'timeout': seconds to wait for the task (optional)

Examples:
"Search for the weather in New York City"
{"task": "extract all contact information", "url": "https://example.com"}

Returns the results from the browser operation as text."#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(BrowserTaskArgs)).unwrap_or(Value::Null)
    }

    fn timeout(&self, args: &Value) -> Option<Duration> {
        Some(self.limit(args.get("timeout").and_then(Value::as_u64)))
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args = BrowserTaskArgs::from_value(args)?;
        let instruction = args.instruction().ok_or_else(|| {
            ToolError::invalid_input("No task provided. Please specify a browser task to perform.")
        })?;
        let limit = self.limit(args.timeout);

        tracing::info!(instruction = %instruction, timeout_secs = limit.as_secs(), "browser_task execute");
        let result = tokio::time::timeout(limit, self.agent.run(&instruction))
            .await
            .map_err(|_| ToolError::Timeout(self.name().to_string()))?
            .map_err(|e| ToolError::Browser(e.to_string()))?;

        Ok(format!("Browser task completed. Result: {}", result))
    }
}

/// 网页内容工具：抓取页面并转为可读文本
pub struct WebpageContentTool {
    client: Client,
    max_result_chars: usize,
}

/// 补全 scheme 并校验 host
fn normalize_url(raw: &str) -> Result<Url, ToolError> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };
    match Url::parse(&with_scheme) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(ToolError::invalid_input(format!(
            "Invalid URL format: {}",
            with_scheme
        ))),
    }
}

/// 超过上限时截断，并注明剩余字符数
fn truncate_text(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!(
        "{}\n\n[Content truncated. {} more characters not shown.]",
        head,
        total - max_chars
    )
}

impl WebpageContentTool {
    /// HTTP 客户端构建失败（如 TLS 后端不可用）时返回错误，不退回无超时的默认客户端
    pub fn new(timeout_secs: u64, max_result_chars: usize) -> Result<Self, reqwest::Error> {
        const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            max_result_chars,
        })
    }

    async fn fetch(&self, url: Url) -> Result<String, ToolError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::Fetch(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ToolError::Fetch(format!("HTTP {}", resp.status())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ToolError::Fetch(format!("Read body: {}", e)))?;
        let body = body.trim_start_matches('\u{FEFF}');

        let text = match from_read(body.as_bytes(), 120) {
            Ok(text) if !text.trim().is_empty() => text,
            _ => body.to_string(),
        };
        Ok(truncate_text(&text, self.max_result_chars))
    }
}

#[async_trait]
impl Tool for WebpageContentTool {
    fn name(&self) -> &str {
        "get_webpage_content"
    }

    fn description(&self) -> &str {
        r#"Gets the content of a webpage and converts it to readable text.

Input should be the URL of the webpage to get content from.
Returns the text content of the webpage or error message.

Example: "https://www.example.com""#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "Page URL; https:// is assumed when missing" }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let raw = text_arg(&args, &["url"]);
        if raw.trim().is_empty() {
            return Err(ToolError::invalid_input("Missing url"));
        }
        let url = normalize_url(&raw)?;
        tracing::info!(url = %url, "get_webpage_content fetch");
        self.fetch(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// 记录收到的指令，返回固定结果
    #[derive(Default)]
    struct RecordingAgent {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BrowserAgent for RecordingAgent {
        async fn run(&self, instruction: &str) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(instruction.to_string());
            Ok("42 results".to_string())
        }
    }

    struct BrokenAgent;

    #[async_trait]
    impl BrowserAgent for BrokenAgent {
        async fn run(&self, _instruction: &str) -> anyhow::Result<String> {
            anyhow::bail!("browser crashed")
        }
    }

    struct StuckAgent;

    #[async_trait]
    impl BrowserAgent for StuckAgent {
        async fn run(&self, _instruction: &str) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_plain_string_task() {
        let agent = Arc::new(RecordingAgent::default());
        let tool = BrowserTaskTool::new(agent.clone(), 60);

        let out = tool
            .execute(Value::String("Search for the weather in Paris".into()))
            .await
            .unwrap();
        assert_eq!(out, "Browser task completed. Result: 42 results");
        assert_eq!(
            *agent.seen.lock().unwrap(),
            vec!["Search for the weather in Paris".to_string()]
        );
    }

    #[tokio::test]
    async fn test_url_is_prefixed_to_task() {
        let agent = Arc::new(RecordingAgent::default());
        let tool = BrowserTaskTool::new(agent.clone(), 60);

        tool.execute(json!({"task": "extract the contact email", "url": "https://example.com"}))
            .await
            .unwrap();
        assert_eq!(
            agent.seen.lock().unwrap()[0],
            "Go to https://example.com and extract the contact email"
        );
    }

    #[tokio::test]
    async fn test_missing_task_and_backend_errors() {
        let tool = BrowserTaskTool::new(Arc::new(BrokenAgent), 60);

        let err = tool.execute(json!({"url": "https://example.com"})).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No task provided. Please specify a browser task to perform."
        );

        let err = tool.execute(Value::String("open example.com".into())).await.unwrap_err();
        assert_eq!(err.to_string(), "Browser task failed: browser crashed");
    }

    #[tokio::test]
    async fn test_timeout_field_is_enforced() {
        let tool = BrowserTaskTool::new(Arc::new(StuckAgent), 600);
        let err = tool
            .execute(json!({"task": "wait forever", "timeout": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout(ref t) if t == "browser_task"));
    }

    #[test]
    fn test_time_budget_follows_input() {
        let tool = BrowserTaskTool::new(Arc::new(StuckAgent), 300);
        assert_eq!(
            tool.timeout(&json!({"task": "book a flight", "timeout": 120})),
            Some(Duration::from_secs(120))
        );
        assert_eq!(
            tool.timeout(&Value::String("book a flight".into())),
            Some(Duration::from_secs(300))
        );
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("example.com/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_url("http://example.com").unwrap().as_str(),
            "http://example.com/"
        );
        let err = normalize_url("https://").unwrap_err();
        assert!(err.to_string().starts_with("Invalid URL format"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        let out = truncate_text(&"a".repeat(25), 20);
        assert!(out.starts_with(&"a".repeat(20)));
        assert!(out.ends_with("[Content truncated. 5 more characters not shown.]"));
    }

    #[tokio::test]
    async fn test_webpage_missing_url() {
        let tool = WebpageContentTool::new(5, 2000).unwrap();
        let err = tool.execute(json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing url");
    }
}
