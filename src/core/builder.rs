//! 工具箱构建器：按配置统一注册工具
//!
//! AppPathRegistry 与 BrowserAgent 由调用方注入；未注入浏览器后端时不注册 browser_task。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::config::AppConfig;
use crate::tools::{
    AnalyzeFileTool, AppPathRegistry, BrowserAgent, BrowserTaskTool, GetApplicationPathTool,
    GetStoredApplicationPathTool, ModifyJsonFileTool, SearchFileContentTool,
    StoreApplicationPathTool, ToolExecutor, ToolRegistry, WebpageContentTool,
};

/// 工具箱构建器
pub struct ToolboxBuilder {
    config: AppConfig,
    app_paths: Arc<AppPathRegistry>,
    browser_agent: Option<Arc<dyn BrowserAgent>>,
}

impl ToolboxBuilder {
    /// 创建新的构建器（自带一个空的应用路径登记表）
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            app_paths: Arc::new(AppPathRegistry::new()),
            browser_agent: None,
        }
    }

    /// 共享外部的应用路径登记表（多个会话共用同一份）
    pub fn with_app_paths(mut self, app_paths: Arc<AppPathRegistry>) -> Self {
        self.app_paths = app_paths;
        self
    }

    /// 注入浏览器自动化后端，启用 browser_task
    pub fn with_browser_agent(mut self, agent: Arc<dyn BrowserAgent>) -> Self {
        self.browser_agent = Some(agent);
        self
    }

    /// 构建工具注册表
    pub fn build_tool_registry(&self) -> anyhow::Result<ToolRegistry> {
        let tools_cfg = &self.config.tools;
        let mut tools = ToolRegistry::new();

        tools.register(SearchFileContentTool::new(
            tools_cfg.search.max_matches_per_file,
            tools_cfg.search.recursive_by_default,
        ));
        tools.register(AnalyzeFileTool::new(tools_cfg.analyze.preview_lines));
        tools.register(ModifyJsonFileTool::new(
            tools_cfg.json_patch.backup_suffix.clone(),
        ));

        tools.register(StoreApplicationPathTool::new(self.app_paths.clone()));
        tools.register(GetStoredApplicationPathTool::new(self.app_paths.clone()));
        tools.register(GetApplicationPathTool);

        tools.register(
            WebpageContentTool::new(
                tools_cfg.browser.fetch_timeout_secs,
                tools_cfg.browser.max_result_chars,
            )
            .context("Failed to build HTTP client for get_webpage_content")?,
        );
        if let Some(agent) = &self.browser_agent {
            tools.register(BrowserTaskTool::new(
                agent.clone(),
                tools_cfg.browser.task_timeout_secs,
            ));
        }

        Ok(tools)
    }

    /// 构建执行器（带全局超时）
    pub fn build_executor(&self) -> anyhow::Result<ToolExecutor> {
        Ok(ToolExecutor::new(
            self.build_tool_registry()?,
            self.config.tools.tool_timeout_secs,
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn app_paths(&self) -> &Arc<AppPathRegistry> {
        &self.app_paths
    }
}

/// 便捷函数：加载配置（失败时退回默认值）并创建构建器
pub fn create_toolbox_builder(config_path: Option<PathBuf>) -> ToolboxBuilder {
    let config = crate::config::load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });
    ToolboxBuilder::new(config)
}
