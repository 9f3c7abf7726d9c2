//! 应用路径登记表与相关工具
//!
//! AppPathRegistry 由构建器创建并以 Arc 注入三个工具（store / get_stored / get_application_path），
//! 键统一转小写，后写覆盖先写；内部用 RwLock 保护，可被多个会话并发访问。

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::core::ToolError;
use crate::tools::registry::text_arg;
use crate::tools::Tool;

/// 应用名 -> 路径 的内存登记表（不持久化）
#[derive(Debug, Default)]
pub struct AppPathRegistry {
    paths: RwLock<HashMap<String, String>>,
}

impl AppPathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记路径，返回被覆盖的旧值
    pub fn store(&self, name: &str, path: &str) -> Option<String> {
        let mut paths = self.paths.write().unwrap_or_else(|e| e.into_inner());
        paths.insert(name.to_lowercase(), path.to_string())
    }

    /// 按小写名查找
    pub fn retrieve(&self, name: &str) -> Option<String> {
        let paths = self.paths.read().unwrap_or_else(|e| e.into_inner());
        paths.get(&name.to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.paths.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// store_application_path 的参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct StoreAppPathArgs {
    /// 应用名，如 "notepad"、"chrome"
    #[serde(default)]
    pub app_name: String,
    /// 应用可执行文件完整路径
    #[serde(default)]
    pub app_path: String,
}

/// 登记应用路径
pub struct StoreApplicationPathTool {
    registry: Arc<AppPathRegistry>,
}

impl StoreApplicationPathTool {
    pub fn new(registry: Arc<AppPathRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for StoreApplicationPathTool {
    fn name(&self) -> &str {
        "store_application_path"
    }

    fn description(&self) -> &str {
        r#"Stores a mapping between an application name and its full path for future use.

Input should be a JSON object with:
- 'app_name': name of the application (e.g., "notepad", "chrome")
- 'app_path': full path to the application executable (e.g., "C:\\Windows\\notepad.exe")

Example: {"app_name": "vscode", "app_path": "C:\\Program Files\\Microsoft VS Code\\Code.exe"}

Use this tool after getting the application path from the user."#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(StoreAppPathArgs)).unwrap_or(Value::Null)
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: StoreAppPathArgs = match args {
            Value::String(_) => {
                return Err(ToolError::invalid_input(
                    "Input should be a valid JSON object.",
                ))
            }
            Value::Object(_) => serde_json::from_value(args).map_err(|e| {
                ToolError::invalid_input(format!("Invalid arguments: {}", e))
            })?,
            _ => {
                return Err(ToolError::invalid_input(
                    "Input should be a JSON object with 'app_name' and 'app_path' keys.",
                ))
            }
        };

        let app_name = args.app_name.trim();
        let app_path = args.app_path.trim();
        if app_name.is_empty() {
            return Err(ToolError::invalid_input("Application name is required."));
        }
        if app_path.is_empty() {
            return Err(ToolError::invalid_input("Application path is required."));
        }

        if let Some(previous) = self.registry.store(app_name, app_path) {
            tracing::info!(app = %app_name, previous = %previous, "application path replaced");
        } else {
            tracing::info!(app = %app_name, "application path stored");
        }
        Ok(format!(
            "Successfully stored path for '{}': {}",
            app_name, app_path
        ))
    }
}

/// 查询已登记的应用路径；未登记不算错误
pub struct GetStoredApplicationPathTool {
    registry: Arc<AppPathRegistry>,
}

impl GetStoredApplicationPathTool {
    pub fn new(registry: Arc<AppPathRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Tool for GetStoredApplicationPathTool {
    fn name(&self) -> &str {
        "get_stored_application_path"
    }

    fn description(&self) -> &str {
        r#"Retrieves a previously stored application path.

Input should be the name of the application to get the path for.
Returns the stored path or a message that the path is not stored.

Example: "vscode" or "chrome"

Use this tool to check if you already have the path before asking the user."#
    }

    fn parameters_schema(&self) -> Value {
        app_name_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let app_name = text_arg(&args, &["app_name", "name"]);
        let app_name = app_name.trim();
        if app_name.is_empty() {
            return Err(ToolError::invalid_input("Application name is required."));
        }

        Ok(match self.registry.retrieve(app_name) {
            Some(path) => format!("Found stored path for '{}': {}", app_name, path),
            None => format!("No stored path found for '{}'.", app_name),
        })
    }
}

/// 向用户索要应用完整路径的提示（附当前平台的示例路径）
pub struct GetApplicationPathTool;

/// 当前平台上应用的典型安装路径
fn sample_path(app_name: &str) -> String {
    match std::env::consts::OS {
        "windows" => format!("C:\\Program Files\\{0}\\{0}.exe", app_name),
        "macos" => format!("/Applications/{}.app", app_name),
        _ => format!("/usr/bin/{}", app_name.to_lowercase()),
    }
}

#[async_trait]
impl Tool for GetApplicationPathTool {
    fn name(&self) -> &str {
        "get_application_path"
    }

    fn description(&self) -> &str {
        r#"Requests the full file path of an application from the user when the path is unknown.

Input should be the name of the application you want to find the path for.

Example: "notepad" or "arduino"

Use this tool BEFORE trying to open an application when you don't have the exact path."#
    }

    fn parameters_schema(&self) -> Value {
        app_name_schema()
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let app_name = text_arg(&args, &["app_name", "name"]);
        let app_name = app_name.trim();
        if app_name.is_empty() {
            return Err(ToolError::invalid_input("Application name is required."));
        }

        Ok(format!(
            "I need the exact path to '{0}' to open it reliably. \
             Please provide the full path to the {0} executable on your system. \
             It might look something like: '{1}' depending on where it's installed.",
            app_name,
            sample_path(app_name)
        ))
    }
}

fn app_name_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "app_name": { "type": "string", "description": "Application name, e.g. vscode" }
        },
        "required": ["app_name"]
    })
}
