/// Hook 环境
///
/// 封装 Juju hook 工具：relation 数据读写、leader 设置、charm 配置

pub mod juju;
#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use common::Result;
use std::collections::BTreeMap;

pub use juju::JujuHookTools;

/// 单个单元在 relation 上发布的数据
pub type RelationData = BTreeMap<String, String>;

/// Hook 工具 Trait
#[async_trait]
pub trait HookTools: Send + Sync + 'static {
    /// 当前单元名，例如 `cinder-ceph/0`
    fn local_unit(&self) -> &str;

    /// 列出端点上的所有 relation ID
    async fn relation_ids(&self, endpoint: &str) -> Result<Vec<String>>;

    /// 列出 relation 上的远端单元
    async fn related_units(&self, relation_id: &str) -> Result<Vec<String>>;

    /// 读取指定单元在 relation 上的数据
    async fn relation_get(&self, relation_id: &str, unit: &str) -> Result<RelationData>;

    /// 写入当前单元在 relation 上的数据，空值表示删除该键
    async fn relation_set(&self, relation_id: &str, settings: &RelationData) -> Result<()>;

    /// 读取全部 charm 配置
    async fn config_get(&self) -> Result<serde_json::Value>;

    /// 读取 leader 设置
    async fn leader_get(&self, key: &str) -> Result<Option<String>>;

    /// 写入 leader 设置（仅 leader 可调用）
    async fn leader_set(&self, settings: &RelationData) -> Result<()>;

    /// 当前单元是否为 leader
    async fn is_leader(&self) -> Result<bool>;
}

/// 端点上是否有远端单元发布了指定键
pub async fn is_relation_made(tools: &dyn HookTools, endpoint: &str, key: &str) -> Result<bool> {
    for rid in tools.relation_ids(endpoint).await? {
        for unit in tools.related_units(&rid).await? {
            let data = tools.relation_get(&rid, &unit).await?;
            if data.get(key).map_or(false, |v| !v.is_empty()) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// 读取端点上第一个远端单元发布的指定键
pub async fn first_remote_value(
    tools: &dyn HookTools,
    endpoint: &str,
    key: &str,
) -> Result<Option<String>> {
    for rid in tools.relation_ids(endpoint).await? {
        for unit in tools.related_units(&rid).await? {
            let data = tools.relation_get(&rid, &unit).await?;
            if let Some(value) = data.get(key).filter(|v| !v.is_empty()) {
                return Ok(Some(value.clone()));
            }
        }
    }
    Ok(None)
}
