//! 路径小工具：`~` 展开

use std::path::PathBuf;

/// 展开开头的 `~` / `~/`，其余路径原样返回（与 shell 习惯一致，不处理 `~user`）
pub fn expand_user(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
