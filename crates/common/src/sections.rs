/// 配置段模型
///
/// 主 charm 通过 `subordinate_configuration` 接收的结构：
/// 服务名 -> 文件路径 -> {"sections": 段名 -> 有序键值对}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::constants::{CHARM_CEPH_CONF, CINDER_CONF};
use crate::models::OpenStackRelease;

/// 配置项的值
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SectionValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for SectionValue {
    /// 按 INI 文件的写法输出
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(v) => write!(f, "{}", v),
            Self::Str(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for SectionValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for SectionValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for SectionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for SectionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

/// 段名 -> 有序键值对
pub type Sections = BTreeMap<String, Vec<(String, SectionValue)>>;

/// 单个配置文件
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileSections {
    pub sections: Sections,
}

/// 服务名 -> 文件路径 -> 配置段
pub type ConfigSectionMap = BTreeMap<String, BTreeMap<String, FileSections>>;

/// RBD 卷驱动
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDriver {
    /// icehouse 之前
    Legacy,
    /// icehouse 及之后
    Rbd,
}

impl VolumeDriver {
    /// 根据发行版本选择驱动
    pub fn for_release(release: OpenStackRelease) -> Self {
        if release >= OpenStackRelease::Icehouse {
            Self::Rbd
        } else {
            Self::Legacy
        }
    }

    /// 驱动类路径
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "cinder.volume.driver.RBDDriver",
            Self::Rbd => "cinder.volume.drivers.rbd.RBDDriver",
        }
    }
}

/// 是否需要声明独占存储池（queens 及之后）
pub fn supports_exclusive_pool(release: OpenStackRelease) -> bool {
    release >= OpenStackRelease::Queens
}

/// charm 为指定服务维护的 ceph.conf 路径
pub fn ceph_config_file(service: &str) -> String {
    CHARM_CEPH_CONF.replace("{}", service)
}

/// 生成 cinder.conf 中 ceph 后端的配置段
pub fn generate_sections(
    service: &str,
    driver: VolumeDriver,
    secret_uuid: &str,
    pool: &str,
    exclusive_pool: bool,
) -> ConfigSectionMap {
    let mut entries: Vec<(String, SectionValue)> = vec![
        ("volume_backend_name".to_string(), service.into()),
        ("volume_driver".to_string(), driver.as_str().into()),
        ("rbd_pool".to_string(), pool.into()),
        ("rbd_user".to_string(), service.into()),
        ("rbd_secret_uuid".to_string(), secret_uuid.into()),
        ("rbd_ceph_conf".to_string(), ceph_config_file(service).into()),
    ];

    if exclusive_pool {
        entries.push(("rbd_exclusive_cinder_pool".to_string(), true.into()));
    }

    let file = FileSections {
        sections: BTreeMap::from([(service.to_string(), entries)]),
    };

    BTreeMap::from([(
        "cinder".to_string(),
        BTreeMap::from([(CINDER_CONF.to_string(), file)]),
    )])
}
