//! 文件分析工具：大小、时间戳、MIME 类型、扩展名、权限，文本文件附带前几行预览
//!
//! 预览读取失败只在输出中注明，不影响整体分析结果。

use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde_json::Value;

use crate::core::{PathKind, ToolError};
use crate::tools::paths::expand_user;
use crate::tools::registry::text_arg;
use crate::tools::Tool;

/// 默认预览行数
pub const DEFAULT_PREVIEW_LINES: usize = 5;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// 文件分析工具
pub struct AnalyzeFileTool {
    preview_lines: usize,
}

impl Default for AnalyzeFileTool {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_LINES)
    }
}

/// 千分位分隔：1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// 人类可读大小：>= 1 MiB 用 MB，>= 1 KiB 用 KB，否则字节数
pub fn format_size(bytes: u64) -> String {
    if bytes >= MIB {
        format!(
            "{:.2} MB ({} bytes)",
            bytes as f64 / MIB as f64,
            group_thousands(bytes)
        )
    } else if bytes >= KIB {
        format!(
            "{:.2} KB ({} bytes)",
            bytes as f64 / KIB as f64,
            group_thousands(bytes)
        )
    } else {
        format!("{} bytes", group_thousands(bytes))
    }
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// 按扩展名猜测 MIME 类型（不区分大小写），未知返回 None
pub fn guess_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "txt" | "log" | "text" | "conf" | "ini" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "tsv" => "text/tab-separated-values",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "xml" => "text/xml",
        "js" | "mjs" => "text/javascript",
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "c" | "h" => "text/x-c",
        "cpp" | "hpp" | "cc" => "text/x-c++",
        "java" => "text/x-java",
        "sh" => "text/x-sh",
        "toml" => "text/x-toml",
        "yaml" | "yml" => "text/yaml",
        "json" => "application/json",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "exe" => "application/x-msdownload",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/vnd.microsoft.icon",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

/// 权限：八进制后三位（如 644）
#[cfg(unix)]
fn format_permissions(metadata: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:03o}", metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn format_permissions(metadata: &Metadata) -> String {
    if metadata.permissions().readonly() {
        "444".to_string()
    } else {
        "666".to_string()
    }
}

impl AnalyzeFileTool {
    pub fn new(preview_lines: usize) -> Self {
        Self { preview_lines }
    }

    /// 文本预览：前 N 行（去首尾空白），超出部分给出剩余行数
    fn preview(&self, path: &Path) -> Result<Vec<String>, std::io::Error> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().collect();

        let mut out = vec![format!("\nPreview (first {} lines):", self.preview_lines)];
        for (i, line) in lines.iter().take(self.preview_lines).enumerate() {
            out.push(format!("  {}: {}", i + 1, line.trim()));
        }
        if lines.len() > self.preview_lines {
            out.push(format!(
                "  ... and {} more lines",
                lines.len() - self.preview_lines
            ));
        }
        Ok(out)
    }

    /// 分析文件并生成报告
    pub fn analyze(&self, file_path: &str) -> Result<String, ToolError> {
        if file_path.trim().is_empty() {
            return Err(ToolError::invalid_input("File path is required"));
        }

        let path = expand_user(file_path);
        if !path.exists() {
            return Err(ToolError::NotFound {
                kind: PathKind::File,
                path: file_path.to_string(),
            });
        }
        if !path.is_file() {
            return Err(ToolError::WrongPathType {
                kind: PathKind::File,
                path: file_path.to_string(),
            });
        }

        let metadata = std::fs::metadata(&path).map_err(|source| ToolError::Read {
            path: file_path.to_string(),
            source,
        })?;

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        // 部分平台/文件系统不提供创建时间，退回修改时间
        let created = metadata.created().unwrap_or(modified);
        let accessed = metadata.accessed().unwrap_or(modified);

        let mime = guess_mime(&path);
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "None".to_string());

        let mut output = vec![
            format!("File Analysis for: {}", file_path),
            format!("Size: {}", format_size(metadata.len())),
            format!("Type: {}", mime.unwrap_or("Unknown")),
            format!("Extension: {}", extension),
            format!("Creation Time: {}", format_time(created)),
            format!("Last Modified: {}", format_time(modified)),
            format!("Last Accessed: {}", format_time(accessed)),
            format!("Permissions: {}", format_permissions(&metadata)),
        ];

        if mime.is_some_and(|m| m.contains("text")) {
            match self.preview(&path) {
                Ok(lines) => output.extend(lines),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "preview failed");
                    output.push(format!("\nCould not read file content: {}", e));
                }
            }
        }

        Ok(output.join("\n"))
    }
}

#[async_trait]
impl Tool for AnalyzeFileTool {
    fn name(&self) -> &str {
        "analyze_file"
    }

    fn description(&self) -> &str {
        r#"Analyzes a file and returns metadata such as file size, creation time, modification time, and file type.

Input should be the path of the file to analyze.
Returns file metadata or an error message.

Example: "documents/report.pdf" or "/home/user/documents/report.pdf""#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "Path of the file to analyze" }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let file_path = text_arg(&args, &["file_path", "path"]);
        tracing::info!(path = %file_path, "analyze_file tool execute");
        self.analyze(&file_path)
    }
}
