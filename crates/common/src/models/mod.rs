/// 共享数据模型
///
/// 定义 OpenStack 版本以及 charm 使用的常量

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::{Error, Result};

/// OpenStack 发行版本，按发布顺序排列
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OpenStackRelease {
    Folsom,
    Grizzly,
    Havana,
    Icehouse,
    Juno,
    Kilo,
    Liberty,
    Mitaka,
    Newton,
    Ocata,
    Pike,
    Queens,
    Rocky,
    Stein,
    Train,
    Ussuri,
    Victoria,
    Wallaby,
    Xena,
    Yoga,
    Zed,
    Antelope,
    Bobcat,
    Caracal,
}

/// cinder 包版本号与发行版本的对应关系
const CINDER_CODENAMES: &[(&str, OpenStackRelease)] = &[
    ("2012.2", OpenStackRelease::Folsom),
    ("2013.1", OpenStackRelease::Grizzly),
    ("2013.2", OpenStackRelease::Havana),
    ("2014.1", OpenStackRelease::Icehouse),
    ("2014.2", OpenStackRelease::Juno),
    ("2015.1", OpenStackRelease::Kilo),
    ("7", OpenStackRelease::Liberty),
    ("8", OpenStackRelease::Mitaka),
    ("9", OpenStackRelease::Newton),
    ("10", OpenStackRelease::Ocata),
    ("11", OpenStackRelease::Pike),
    ("12", OpenStackRelease::Queens),
    ("13", OpenStackRelease::Rocky),
    ("14", OpenStackRelease::Stein),
    ("15", OpenStackRelease::Train),
    ("16", OpenStackRelease::Ussuri),
    ("17", OpenStackRelease::Victoria),
    ("18", OpenStackRelease::Wallaby),
    ("19", OpenStackRelease::Xena),
    ("20", OpenStackRelease::Yoga),
    ("21", OpenStackRelease::Zed),
    ("22", OpenStackRelease::Antelope),
    ("23", OpenStackRelease::Bobcat),
    ("24", OpenStackRelease::Caracal),
];

impl OpenStackRelease {
    /// 最早支持的版本，包未安装时使用
    pub const EARLIEST: OpenStackRelease = OpenStackRelease::Folsom;

    /// 所有版本
    pub const ALL: [OpenStackRelease; 24] = [
        Self::Folsom,
        Self::Grizzly,
        Self::Havana,
        Self::Icehouse,
        Self::Juno,
        Self::Kilo,
        Self::Liberty,
        Self::Mitaka,
        Self::Newton,
        Self::Ocata,
        Self::Pike,
        Self::Queens,
        Self::Rocky,
        Self::Stein,
        Self::Train,
        Self::Ussuri,
        Self::Victoria,
        Self::Wallaby,
        Self::Xena,
        Self::Yoga,
        Self::Zed,
        Self::Antelope,
        Self::Bobcat,
        Self::Caracal,
    ];

    /// 转换为版本代号
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folsom => "folsom",
            Self::Grizzly => "grizzly",
            Self::Havana => "havana",
            Self::Icehouse => "icehouse",
            Self::Juno => "juno",
            Self::Kilo => "kilo",
            Self::Liberty => "liberty",
            Self::Mitaka => "mitaka",
            Self::Newton => "newton",
            Self::Ocata => "ocata",
            Self::Pike => "pike",
            Self::Queens => "queens",
            Self::Rocky => "rocky",
            Self::Stein => "stein",
            Self::Train => "train",
            Self::Ussuri => "ussuri",
            Self::Victoria => "victoria",
            Self::Wallaby => "wallaby",
            Self::Xena => "xena",
            Self::Yoga => "yoga",
            Self::Zed => "zed",
            Self::Antelope => "antelope",
            Self::Bobcat => "bobcat",
            Self::Caracal => "caracal",
        }
    }

    /// 根据 cinder 包版本号推断发行版本
    ///
    /// 支持 `2:12.0.0-0ubuntu1`、`1:2014.1.3-0ubuntu1` 这类 dpkg 版本号。
    pub fn from_package_version(version: &str) -> Option<Self> {
        let version = version.trim();
        let version = match version.split_once(':') {
            Some((_, rest)) => rest,
            None => version,
        };

        let mut parts = version.split(|c: char| c == '.' || c == '-' || c == '~');
        let major = parts.next()?;
        let key = if major.len() == 4 {
            format!("{}.{}", major, parts.next()?)
        } else {
            major.to_string()
        };

        let release = CINDER_CODENAMES
            .iter()
            .find(|(v, _)| *v == key)
            .map(|(_, release)| *release);
        debug!("包版本 {} -> {:?}", version, release);
        release
    }
}

impl fmt::Display for OpenStackRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OpenStackRelease {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("未知的 OpenStack 版本: {}", s)))
    }
}

/// 常量定义
pub mod constants {
    /// ceph relation 端点
    pub const CEPH_ENDPOINT: &str = "ceph";

    /// 向 cinder 主 charm 提供后端配置的端点
    pub const STORAGE_BACKEND_ENDPOINT: &str = "storage-backend";

    /// 向 nova-compute 提供密钥的端点
    pub const CEPH_ACCESS_ENDPOINT: &str = "ceph-access";

    /// broker 请求键
    pub const BROKER_REQ_KEY: &str = "broker_req";

    /// broker 响应键（未区分请求方）
    pub const BROKER_RSP_KEY: &str = "broker_rsp";

    /// leader 设置中保存 libvirt secret uuid 的键
    pub const SECRET_UUID_KEY: &str = "secret-uuid";

    /// charm 自己维护的 ceph.conf
    pub const CHARM_CEPH_CONF: &str = "/var/lib/charm/{}/ceph.conf";

    /// 系统 ceph.conf
    pub const CEPH_CONF: &str = "/etc/ceph/ceph.conf";

    /// cinder 主配置文件
    pub const CINDER_CONF: &str = "/etc/cinder/cinder.conf";

    /// 需要安装的包
    pub const PACKAGES: &[&str] = &["ceph-common"];

    /// 用于判断 OpenStack 版本的包
    pub const VERSION_PACKAGE: &str = "cinder-common";

    /// 依赖 ceph 配置的服务
    pub const CINDER_VOLUME_SERVICE: &str = "cinder-volume";

    /// keyring 文件属主
    pub const CINDER_USER: &str = "cinder";
    pub const CINDER_GROUP: &str = "cinder";
}
