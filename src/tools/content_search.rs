//! 文件内容搜索工具 - 在目录下按行搜索模式
//!
//! 模式优先按正则编译，编译失败则转义为字面量；单个文件读取失败只记 warn 并视为无匹配，
//! 不会中断整次搜索。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use regex::Regex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use crate::core::{PathKind, ToolError};
use crate::tools::paths::expand_user;
use crate::tools::Tool;

/// 每个文件默认最多展示的匹配行数
pub const DEFAULT_MAX_MATCHES_PER_FILE: usize = 5;

/// search_file_content 的参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// 要搜索的目录
    pub directory: String,
    /// 搜索模式（正则或子串）
    pub pattern: String,
    /// 是否递归搜索子目录
    #[serde(default)]
    pub recursive: Option<bool>,
}

/// 单个文件的匹配结果：行号从 1 开始
#[derive(Debug)]
struct FileMatches {
    file_path: PathBuf,
    matches: Vec<(usize, String)>,
}

/// 内容搜索工具
pub struct SearchFileContentTool {
    max_matches_per_file: usize,
    recursive_by_default: bool,
}

impl Default for SearchFileContentTool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MATCHES_PER_FILE, false)
    }
}

impl SearchFileContentTool {
    pub fn new(max_matches_per_file: usize, recursive_by_default: bool) -> Self {
        Self {
            max_matches_per_file,
            recursive_by_default,
        }
    }

    fn parse_args(args: Value) -> Result<SearchArgs, ToolError> {
        match &args {
            Value::String(_) => {
                return Err(ToolError::invalid_input(
                    "Invalid input format. Expected JSON with 'directory' and 'pattern'",
                ))
            }
            Value::Object(map) => {
                if !map.contains_key("directory") || !map.contains_key("pattern") {
                    return Err(ToolError::invalid_input(
                        "Input must contain 'directory' and 'pattern'",
                    ));
                }
            }
            _ => {
                return Err(ToolError::invalid_input(
                    "Input must be a dictionary/JSON object",
                ))
            }
        }
        serde_json::from_value(args)
            .map_err(|e| ToolError::invalid_input(format!("Invalid search arguments: {}", e)))
    }

    /// 编译模式；非法正则退化为字面量匹配
    fn compile_pattern(pattern: &str) -> Result<Regex, ToolError> {
        Regex::new(pattern).or_else(|e| {
            tracing::debug!(pattern = %pattern, error = %e, "pattern is not a valid regex, matching literally");
            // 字面量仅在超出正则大小上限时才会失败
            Regex::new(&regex::escape(pattern))
                .map_err(|e| ToolError::invalid_input(format!("Invalid search pattern: {}", e)))
        })
    }

    /// 在单个文件中搜索；读取失败视为无匹配
    fn search_in_file(&self, file_path: &Path, regex: &Regex) -> Option<FileMatches> {
        let bytes = match std::fs::read(file_path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(file = %file_path.display(), error = %e, "Error reading file");
                return None;
            }
        };
        let content = String::from_utf8_lossy(&bytes);

        let matches: Vec<(usize, String)> = content
            .lines()
            .enumerate()
            .filter(|(_, line)| regex.is_match(line))
            .map(|(i, line)| (i + 1, line.trim().to_string()))
            .collect();

        if matches.is_empty() {
            None
        } else {
            Some(FileMatches {
                file_path: file_path.to_path_buf(),
                matches,
            })
        }
    }

    /// 收集待搜索的文件：递归时自顶向下遍历（同一目录先文件后子目录），否则只取直接子文件。
    /// 非递归时目录本身无法列出即为错误；递归遍历中的错误只记 warn。
    fn candidate_files(&self, dir: &Path, recursive: bool) -> std::io::Result<Vec<PathBuf>> {
        if recursive {
            Ok(walkdir::WalkDir::new(dir)
                .sort_by(|a, b| a.file_type().is_dir().cmp(&b.file_type().is_dir()))
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(e) => Some(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping unreadable entry");
                        None
                    }
                })
                // path().is_file() 跟随指向文件的符号链接；目录符号链接不会被展开
                .filter(|e| e.depth() > 0 && e.path().is_file())
                .map(|e| e.into_path())
                .collect())
        } else {
            Ok(std::fs::read_dir(dir)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file())
                .collect())
        }
    }

    /// 执行搜索并生成报告
    pub fn search(&self, args: SearchArgs) -> Result<String, ToolError> {
        let directory = args.directory;
        let pattern = args.pattern;
        let recursive = args.recursive.unwrap_or(self.recursive_by_default);

        let search_dir = expand_user(&directory);
        if !search_dir.exists() {
            return Err(ToolError::NotFound {
                kind: PathKind::Directory,
                path: directory,
            });
        }
        if !search_dir.is_dir() {
            return Err(ToolError::WrongPathType {
                kind: PathKind::Directory,
                path: directory,
            });
        }

        let regex = Self::compile_pattern(&pattern)?;
        let files = self
            .candidate_files(&search_dir, recursive)
            .map_err(|source| ToolError::Read {
                path: directory.clone(),
                source,
            })?;
        let results: Vec<FileMatches> = files
            .iter()
            .filter_map(|path| self.search_in_file(path, &regex))
            .collect();

        if results.is_empty() {
            return Ok(format!(
                "No matches found for pattern '{}' in directory '{}'",
                pattern, directory
            ));
        }

        let mut output = vec![format!(
            "Found {} files with pattern '{}' in directory '{}':",
            results.len(),
            pattern,
            directory
        )];

        for result in &results {
            let rel_path = result
                .file_path
                .strip_prefix(&search_dir)
                .unwrap_or(&result.file_path);
            output.push(format!("\nFile: {}", rel_path.display()));

            for (line_num, line) in result.matches.iter().take(self.max_matches_per_file) {
                output.push(format!("  Line {}: {}", line_num, line));
            }
            if result.matches.len() > self.max_matches_per_file {
                output.push(format!(
                    "  ... and {} more matches",
                    result.matches.len() - self.max_matches_per_file
                ));
            }
        }

        Ok(output.join("\n"))
    }
}

#[async_trait]
impl Tool for SearchFileContentTool {
    fn name(&self) -> &str {
        "search_file_content"
    }

    fn description(&self) -> &str {
        r#"Searches for a pattern in files within a specified directory.

Input should be a JSON object with:
- 'directory': path of the directory to search in
- 'pattern': search pattern (can be a substring or regex pattern)
- 'recursive' (optional): whether to search recursively in subdirectories (default is false)

Example: {"directory": "project/src", "pattern": "TODO", "recursive": true}

Returns a list of files containing the pattern along with the matching lines, or an error message."#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(SearchArgs)).unwrap_or(Value::Null)
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args = Self::parse_args(args)?;
        tracing::info!(
            directory = %args.directory,
            pattern = %args.pattern,
            recursive = ?args.recursive,
            "search_file_content tool execute"
        );
        self.search(args)
    }
}
