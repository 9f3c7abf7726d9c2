//! JSON 修改工具：深度合并 updates 到 JSON 文件
//!
//! 流程：校验输入 -> 读取并解析 -> 顶层必须为对象 -> 写 `<path>.bak` 备份 -> 深度合并 -> 原子写回。
//! 写回通过同目录临时文件 + rename 完成，失败时原文件保持不变，备份仍在磁盘上。

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::core::{PathKind, ToolError};
use crate::tools::paths::expand_user;
use crate::tools::Tool;

/// 默认备份后缀（追加在完整文件名之后）
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// modify_json_file 的参数
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ModifyJsonArgs {
    /// 要修改的 JSON 文件路径
    pub file_path: String,
    /// 要更新或新增的字段（对象会递归合并）
    pub updates: Map<String, Value>,
}

/// 深度合并：双方都是对象时递归，否则直接覆盖（键不存在时新增）
pub fn deep_merge(target: &mut Map<String, Value>, updates: &Map<String, Value>) {
    for (key, value) in updates {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => deep_merge(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// JSON 修改工具
pub struct ModifyJsonFileTool {
    backup_suffix: String,
}

impl Default for ModifyJsonFileTool {
    fn default() -> Self {
        Self::new(DEFAULT_BACKUP_SUFFIX)
    }
}

impl ModifyJsonFileTool {
    pub fn new(backup_suffix: impl Into<String>) -> Self {
        Self {
            backup_suffix: backup_suffix.into(),
        }
    }

    /// `<path><suffix>`，如 config.json -> config.json.bak
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(&self.backup_suffix);
        PathBuf::from(name)
    }

    fn parse_args(args: Value) -> Result<ModifyJsonArgs, ToolError> {
        match &args {
            Value::String(_) => {
                return Err(ToolError::invalid_input(
                    "Invalid JSON input. Expected a JSON object with 'file_path' and 'updates'",
                ))
            }
            Value::Object(map) => {
                if !map.contains_key("file_path") || !map.contains_key("updates") {
                    return Err(ToolError::invalid_input(
                        "Input must contain 'file_path' and 'updates'",
                    ));
                }
                if !map.get("updates").is_some_and(Value::is_object) {
                    return Err(ToolError::invalid_input(
                        "'updates' must be a dictionary/JSON object",
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
            .map_err(|e| ToolError::invalid_input(format!("Invalid arguments: {}", e)))
    }

    /// 原子写入：staging_dir 中的临时文件写完后 rename 覆盖 path，保留原文件权限
    fn write_atomic(path: &Path, staging_dir: &Path, contents: &str) -> std::io::Result<()> {
        let original_perms = std::fs::metadata(path).ok().map(|m| m.permissions());

        let mut temp = NamedTempFile::new_in(staging_dir)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        if let Some(perms) = original_perms {
            temp.as_file().set_permissions(perms)?;
        }
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// 执行修改，返回确认信息（只列出顶层更新键）
    pub fn modify(&self, file_path: &str, updates: &Map<String, Value>) -> Result<String, ToolError> {
        let path = expand_user(file_path);
        // 临时文件与目标同目录，rename 才是原子的
        let staging_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        self.apply(&path, file_path, updates, &staging_dir)
    }

    fn apply(
        &self,
        path: &Path,
        file_path: &str,
        updates: &Map<String, Value>,
        staging_dir: &Path,
    ) -> Result<String, ToolError> {
        if !path.exists() {
            return Err(ToolError::NotFound {
                kind: PathKind::File,
                path: file_path.to_string(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ToolError::Read {
            path: file_path.to_string(),
            source,
        })?;
        let document: Value =
            serde_json::from_str(&raw).map_err(|_| ToolError::InvalidJson(file_path.to_string()))?;
        let Value::Object(mut data) = document else {
            return Err(ToolError::NotJsonObject(file_path.to_string()));
        };

        let backup_path = self.backup_path(path);
        let original = serde_json::to_string_pretty(&data)
            .map_err(|e| ToolError::Backup(std::io::Error::other(e)))?;
        std::fs::write(&backup_path, original).map_err(ToolError::Backup)?;
        tracing::info!(backup = %backup_path.display(), "json backup written");

        deep_merge(&mut data, updates);

        let merged = serde_json::to_string_pretty(&data).map_err(|e| ToolError::Write {
            path: file_path.to_string(),
            source: std::io::Error::other(e),
        })?;
        Self::write_atomic(path, staging_dir, &merged).map_err(|source| ToolError::Write {
            path: file_path.to_string(),
            source,
        })?;

        let updated_fields = updates
            .keys()
            .map(|k| format!("'{}'", k))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!(
            "Successfully updated JSON file '{}'. Updated fields: {}.",
            file_path, updated_fields
        ))
    }
}

#[async_trait]
impl Tool for ModifyJsonFileTool {
    fn name(&self) -> &str {
        "modify_json_file"
    }

    fn description(&self) -> &str {
        r#"Modifies a JSON file by updating or adding fields. Nested objects are merged key by key.

Input should be a JSON object with:
- 'file_path': path of the JSON file to modify
- 'updates': an object containing the fields to update or add (keys are field names, values are the new values)

A backup of the original content is written to '<file_path>.bak' before the file is changed.

Example: {"file_path": "config.json", "updates": {"version": "2.0", "debug": true}}

Returns confirmation or error message."#
    }

    fn parameters_schema(&self) -> Value {
        serde_json::to_value(schemars::schema_for!(ModifyJsonArgs)).unwrap_or(Value::Null)
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args = Self::parse_args(args)?;
        tracing::info!(
            path = %args.file_path,
            fields = args.updates.len(),
            "modify_json_file tool execute"
        );
        self.modify(&args.file_path, &args.updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_deep_merge_preserves_untouched_nested_keys() {
        let mut target = obj(json!({"a": {"x": 1, "y": 2}}));
        deep_merge(&mut target, &obj(json!({"a": {"y": 3, "z": 4}})));
        assert_eq!(Value::Object(target), json!({"a": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn test_deep_merge_mismatched_types_overwrite() {
        let mut target = obj(json!({"a": [1, 2, 3]}));
        deep_merge(&mut target, &obj(json!({"a": {"b": 1}})));
        assert_eq!(Value::Object(target), json!({"a": {"b": 1}}));

        let mut target = obj(json!({"a": {"b": 1}}));
        deep_merge(&mut target, &obj(json!({"a": null, "new": true})));
        assert_eq!(Value::Object(target), json!({"a": null, "new": true}));
    }

    #[test]
    fn test_modify_writes_backup_and_merged_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"name": "bee", "opts": {"debug": false, "level": 1}}"#).unwrap();

        let tool = ModifyJsonFileTool::default();
        let msg = tool
            .modify(
                path.to_str().unwrap(),
                &obj(json!({"opts": {"debug": true}, "version": "2.0"})),
            )
            .unwrap();
        assert_eq!(
            msg,
            format!(
                "Successfully updated JSON file '{}'. Updated fields: 'opts', 'version'.",
                path.display()
            )
        );

        let merged: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            merged,
            json!({"name": "bee", "opts": {"debug": true, "level": 1}, "version": "2.0"})
        );

        let backup_path = dir.path().join("config.json.bak");
        let backup: Value =
            serde_json::from_str(&std::fs::read_to_string(&backup_path).unwrap()).unwrap();
        assert_eq!(backup, json!({"name": "bee", "opts": {"debug": false, "level": 1}}));
    }

    #[test]
    fn test_key_order_and_indent_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("order.json");
        std::fs::write(&path, r#"{"zeta": 1, "alpha": 2}"#).unwrap();

        ModifyJsonFileTool::default()
            .modify(path.to_str().unwrap(), &obj(json!({"mid": 3})))
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"zeta\": 1,\n  \"alpha\": 2,\n  \"mid\": 3\n}");
    }

    #[test]
    fn test_top_level_array_rejected_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let tool = ModifyJsonFileTool::default();
        let err = tool
            .modify(path.to_str().unwrap(), &obj(json!({"a": 1})))
            .unwrap_err();
        assert!(matches!(err, ToolError::NotJsonObject(_)));
        assert!(!dir.path().join("list.json.bak").exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn test_invalid_json_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let tool = ModifyJsonFileTool::default();
        let err = tool
            .modify(path.to_str().unwrap(), &obj(json!({"a": 1})))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("The file '{}' does not contain valid JSON", path.display())
        );

        let err = tool.modify("nope/missing.json", &Map::new()).unwrap_err();
        assert_eq!(err.to_string(), "File 'nope/missing.json' does not exist");
    }

    #[test]
    fn test_backup_failure_stops_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"a": 1}"#).unwrap();
        // 备份路径被目录占用，写备份必然失败
        std::fs::create_dir_all(dir.path().join("cfg.json.bak")).unwrap();

        let tool = ModifyJsonFileTool::default();
        let err = tool
            .modify(path.to_str().unwrap(), &obj(json!({"a": 2})))
            .unwrap_err();
        assert!(matches!(err, ToolError::Backup(_)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_write_failure_keeps_original_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        let original = r#"{"a": 1, "b": {"c": true}}"#;
        std::fs::write(&path, original).unwrap();
        // 临时文件目录不存在，写回必然失败
        let staging_dir = dir.path().join("gone");

        let tool = ModifyJsonFileTool::default();
        let err = tool
            .apply(&path, "cfg.json", &obj(json!({"a": 2})), &staging_dir)
            .unwrap_err();
        assert!(matches!(err, ToolError::Write { ref path, .. } if path == "cfg.json"));
        assert!(err
            .to_string()
            .starts_with("Error writing updated data to 'cfg.json': "));

        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
        let backup: Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("cfg.json.bak")).unwrap())
                .unwrap();
        assert_eq!(backup, json!({"a": 1, "b": {"c": true}}));
    }

    #[test]
    fn test_big_integers_survive_merge_and_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        std::fs::write(&path, r#"{"id": 123456789012345678901234567890, "v": 1}"#).unwrap();

        ModifyJsonFileTool::default()
            .modify(path.to_str().unwrap(), &obj(json!({"v": 2})))
            .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"id\": 123456789012345678901234567890,\n  \"v\": 2\n}"
        );
        let backup = std::fs::read_to_string(dir.path().join("ids.json.bak")).unwrap();
        assert_eq!(
            backup,
            "{\n  \"id\": 123456789012345678901234567890,\n  \"v\": 1\n}"
        );
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        let tool = ModifyJsonFileTool::default();
        assert_eq!(
            tool.backup_path(Path::new("dir/settings.json")),
            PathBuf::from("dir/settings.json.bak")
        );
    }

    #[tokio::test]
    async fn test_execute_input_validation() {
        let tool = ModifyJsonFileTool::default();

        let err = tool.execute(Value::String("config.json".into())).await.unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON input"));

        let err = tool.execute(json!({"file_path": "x.json"})).await.unwrap_err();
        assert_eq!(err.to_string(), "Input must contain 'file_path' and 'updates'");

        let err = tool
            .execute(json!({"file_path": "x.json", "updates": [1]}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "'updates' must be a dictionary/JSON object");

        let err = tool.execute(json!(42)).await.unwrap_err();
        assert_eq!(err.to_string(), "Input must be a dictionary/JSON object");
    }
}
