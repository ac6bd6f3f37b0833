/// Juju hook 工具实现
///
/// 通过调用 `relation-get`、`relation-set`、`leader-get` 等命令访问 hook 环境

use async_trait::async_trait;
use common::{Error, Result};
use tokio::process::Command;
use tracing::{debug, error};

use super::{HookTools, RelationData};

/// 基于 Juju 命令行工具的 hook 环境
pub struct JujuHookTools {
    /// 当前单元名
    local_unit: String,
}

impl JujuHookTools {
    pub fn new(local_unit: impl Into<String>) -> Self {
        Self {
            local_unit: local_unit.into(),
        }
    }

    /// 执行 hook 工具并返回标准输出
    async fn run(&self, tool: &str, args: &[String]) -> Result<Vec<u8>> {
        debug!("执行 hook 工具: {} {:?}", tool, args);

        let output = Command::new(tool)
            .args(args)
            .output()
            .await
            .map_err(|e| Error::HookTool(format!("无法执行 {}: {}", tool, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} 执行失败: {}", tool, stderr);
            return Err(Error::HookTool(format!("{} 执行失败: {}", tool, stderr.trim())));
        }

        Ok(output.stdout)
    }

    /// 执行 hook 工具并按 JSON 解析输出，空输出按 null 处理
    async fn run_json(&self, tool: &str, args: &[String]) -> Result<serde_json::Value> {
        let stdout = self.run(tool, args).await?;
        if stdout.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_slice(&stdout)?)
    }

    /// 将设置转换为 `key=value` 参数
    fn settings_args(settings: &RelationData) -> Vec<String> {
        settings
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }
}

/// 将 JSON 对象转换为字符串映射，非字符串值按 JSON 文本保存
fn to_relation_data(value: serde_json::Value) -> RelationData {
    match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect(),
        _ => RelationData::new(),
    }
}

/// 将 JSON 数组转换为字符串列表
fn to_string_list(value: serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl HookTools for JujuHookTools {
    fn local_unit(&self) -> &str {
        &self.local_unit
    }

    async fn relation_ids(&self, endpoint: &str) -> Result<Vec<String>> {
        let value = self
            .run_json("relation-ids", &["--format=json".to_string(), endpoint.to_string()])
            .await?;
        Ok(to_string_list(value))
    }

    async fn related_units(&self, relation_id: &str) -> Result<Vec<String>> {
        let value = self
            .run_json(
                "related-units",
                &["--format=json".to_string(), "-r".to_string(), relation_id.to_string()],
            )
            .await?;
        Ok(to_string_list(value))
    }

    async fn relation_get(&self, relation_id: &str, unit: &str) -> Result<RelationData> {
        let value = self
            .run_json(
                "relation-get",
                &[
                    "--format=json".to_string(),
                    "-r".to_string(),
                    relation_id.to_string(),
                    "-".to_string(),
                    unit.to_string(),
                ],
            )
            .await?;
        Ok(to_relation_data(value))
    }

    async fn relation_set(&self, relation_id: &str, settings: &RelationData) -> Result<()> {
        if settings.is_empty() {
            return Ok(());
        }

        let mut args = vec!["-r".to_string(), relation_id.to_string()];
        args.extend(Self::settings_args(settings));
        self.run("relation-set", &args).await?;
        Ok(())
    }

    async fn config_get(&self) -> Result<serde_json::Value> {
        self.run_json("config-get", &["--all".to_string(), "--format=json".to_string()])
            .await
    }

    async fn leader_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .run_json("leader-get", &["--format=json".to_string(), key.to_string()])
            .await?;
        Ok(match value {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        })
    }

    async fn leader_set(&self, settings: &RelationData) -> Result<()> {
        if settings.is_empty() {
            return Ok(());
        }
        self.run("leader-set", &Self::settings_args(settings)).await?;
        Ok(())
    }

    async fn is_leader(&self) -> Result<bool> {
        let value = self.run_json("is-leader", &["--format=json".to_string()]).await?;
        value
            .as_bool()
            .ok_or_else(|| Error::HookTool(format!("is-leader 输出无法解析: {}", value)))
    }
}
