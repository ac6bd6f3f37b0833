/// 配置管理

use common::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::host::Paths;

/// 进程配置，来自 Juju 设置的环境变量
#[derive(Debug, Clone)]
pub struct Config {
    /// 当前单元名，例如 `cinder-ceph/0`
    pub unit_name: String,
    /// charm 目录
    pub charm_dir: PathBuf,
    /// 文件系统根目录
    pub root_dir: PathBuf,
    /// 当前 hook 所属的 relation
    pub relation_id: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> anyhow::Result<Self> {
        let unit_name = std::env::var("JUJU_UNIT_NAME")
            .map_err(|_| anyhow::anyhow!("环境变量 JUJU_UNIT_NAME 未设置"))?;

        let charm_dir = std::env::var("CHARM_DIR")
            .unwrap_or_else(|_| ".".to_string())
            .into();

        let root_dir = std::env::var("CHARM_ROOT_DIR")
            .unwrap_or_else(|_| "/".to_string())
            .into();

        let relation_id = std::env::var("JUJU_RELATION_ID")
            .ok()
            .filter(|rid| !rid.is_empty());

        Ok(Self {
            unit_name,
            charm_dir,
            root_dir,
            relation_id,
        })
    }

    /// 应用名，同时用作存储池名和 ceph 用户名
    pub fn service_name(&self) -> &str {
        common::utils::service_name(&self.unit_name)
    }

    pub fn paths(&self) -> Paths {
        Paths::new(self.root_dir.clone())
    }
}

fn default_replication_count() -> i64 {
    3
}

fn default_pool_weight() -> Option<i64> {
    Some(40)
}

/// charm 配置项，来自 `config-get`
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct CharmOptions {
    /// 存储池副本数
    #[serde(default = "default_replication_count")]
    pub ceph_osd_replication_count: i64,

    /// 存储池在集群中所占数据比例（百分比）
    #[serde(default = "default_pool_weight")]
    pub ceph_pool_weight: Option<i64>,

    /// 限制 cinder 只能访问自己需要的存储池
    #[serde(default)]
    pub restrict_ceph_pools: bool,

    /// 是否输出到 syslog
    #[serde(default)]
    pub use_syslog: bool,
}

impl Default for CharmOptions {
    fn default() -> Self {
        Self {
            ceph_osd_replication_count: default_replication_count(),
            ceph_pool_weight: default_pool_weight(),
            restrict_ceph_pools: false,
            use_syslog: false,
        }
    }
}

impl CharmOptions {
    /// 从 `config-get --all` 的输出解析，未设置（null）的选项使用默认值
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let value = match value {
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.into_iter().filter(|(_, v)| !v.is_null()).collect(),
            ),
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => {
                return Err(Error::Config(format!("config-get 输出不是对象: {}", other)));
            }
        };
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = CharmOptions::from_value(json!({})).unwrap();
        assert_eq!(options, CharmOptions::default());
        assert_eq!(options.ceph_osd_replication_count, 3);
        assert_eq!(options.ceph_pool_weight, Some(40));
    }

    #[test]
    fn test_parse_options() {
        let options = CharmOptions::from_value(json!({
            "ceph-osd-replication-count": 2,
            "ceph-pool-weight": 20,
            "restrict-ceph-pools": true,
            "use-syslog": true,
            "unrelated-option": "x"
        }))
        .unwrap();
        assert_eq!(options.ceph_osd_replication_count, 2);
        assert_eq!(options.ceph_pool_weight, Some(20));
        assert!(options.restrict_ceph_pools);
        assert!(options.use_syslog);
    }

    #[test]
    fn test_null_options_use_defaults() {
        let options = CharmOptions::from_value(json!({"ceph-pool-weight": null})).unwrap();
        assert_eq!(options.ceph_pool_weight, Some(40));
        assert_eq!(CharmOptions::from_value(serde_json::Value::Null).unwrap(), CharmOptions::default());
        assert!(CharmOptions::from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_service_name() {
        let cfg = Config {
            unit_name: "mycinder/3".to_string(),
            charm_dir: ".".into(),
            root_dir: "/".into(),
            relation_id: None,
        };
        assert_eq!(cfg.service_name(), "mycinder");
    }
}
