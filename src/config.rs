//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `BEE_TOOLS__*` 覆盖（双下划线表示嵌套，如
//! `BEE_TOOLS__TOOLS__SEARCH__MAX_MATCHES_PER_FILE=10`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub tools: ToolsSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [tools] 段：单次调用超时与各工具参数
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub analyze: AnalyzeSection,
    #[serde(default)]
    pub json_patch: JsonPatchSection,
    #[serde(default)]
    pub browser: BrowserSection,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            search: SearchSection::default(),
            analyze: AnalyzeSection::default(),
            json_patch: JsonPatchSection::default(),
            browser: BrowserSection::default(),
        }
    }
}

/// [tools.search] 段：每个文件展示的匹配行数上限、是否默认递归
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_max_matches_per_file")]
    pub max_matches_per_file: usize,
    #[serde(default)]
    pub recursive_by_default: bool,
}

fn default_max_matches_per_file() -> usize {
    crate::tools::content_search::DEFAULT_MAX_MATCHES_PER_FILE
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_matches_per_file: default_max_matches_per_file(),
            recursive_by_default: false,
        }
    }
}

/// [tools.analyze] 段：文本预览行数
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeSection {
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

fn default_preview_lines() -> usize {
    crate::tools::file_analyzer::DEFAULT_PREVIEW_LINES
}

impl Default for AnalyzeSection {
    fn default() -> Self {
        Self {
            preview_lines: default_preview_lines(),
        }
    }
}

/// [tools.json_patch] 段：备份文件后缀
#[derive(Debug, Clone, Deserialize)]
pub struct JsonPatchSection {
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
}

fn default_backup_suffix() -> String {
    crate::tools::json_patch::DEFAULT_BACKUP_SUFFIX.to_string()
}

impl Default for JsonPatchSection {
    fn default() -> Self {
        Self {
            backup_suffix: default_backup_suffix(),
        }
    }
}

/// [tools.browser] 段：浏览器任务超时、网页抓取超时、返回文本最大字符数
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSection {
    #[serde(default = "default_task_timeout_secs")]
    pub task_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,
}

fn default_task_timeout_secs() -> u64 {
    300
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_max_result_chars() -> usize {
    2000
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            task_timeout_secs: default_task_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_result_chars: default_max_result_chars(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 BEE_TOOLS__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 BEE_TOOLS__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        } else {
            tracing::warn!(path = %path.display(), "config file not found, ignoring");
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("BEE_TOOLS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_sections() {
        let config = AppConfig::default();
        assert_eq!(config.tools.tool_timeout_secs, 30);
        assert_eq!(config.tools.search.max_matches_per_file, 5);
        assert!(!config.tools.search.recursive_by_default);
        assert_eq!(config.tools.analyze.preview_lines, 5);
        assert_eq!(config.tools.json_patch.backup_suffix, ".bak");
        assert_eq!(config.tools.browser.max_result_chars, 2000);
    }

    #[test]
    fn test_load_explicit_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[tools]\ntool_timeout_secs = 7\n\n[tools.search]\nmax_matches_per_file = 12\n",
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.tools.tool_timeout_secs, 7);
        assert_eq!(config.tools.search.max_matches_per_file, 12);
        // 未出现的段保持默认
        assert_eq!(config.tools.analyze.preview_lines, 5);
        assert_eq!(config.tools.browser.fetch_timeout_secs, 10);
    }
}
