/// 主机操作
///
/// 包管理、服务重启、alternatives 等需要调用系统命令的操作

pub mod system;
#[cfg(test)]
pub mod recording;

use async_trait::async_trait;
use common::models::constants::VERSION_PACKAGE;
use common::{OpenStackRelease, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

pub use system::SystemHost;

/// 主机操作 Trait
#[async_trait]
pub trait Host: Send + Sync + 'static {
    /// 更新包索引
    async fn apt_update(&self) -> Result<()>;

    /// 安装软件包
    async fn apt_install(&self, packages: &[&str]) -> Result<()>;

    /// 查询已安装包的版本，未安装时返回 None
    async fn package_version(&self, package: &str) -> Result<Option<String>>;

    /// 重启服务
    async fn service_restart(&self, service: &str) -> Result<()>;

    /// 将 source 注册为 target 的 alternative
    async fn install_alternative(
        &self,
        name: &str,
        target: &Path,
        source: &Path,
        priority: u32,
    ) -> Result<()>;

    /// 修改文件属主
    async fn chown(&self, path: &Path, user: &str, group: &str) -> Result<()>;

    /// 执行可执行文件
    async fn run_executable(&self, path: &Path) -> Result<()>;
}

/// 根据已安装的 cinder 包判断 OpenStack 版本
///
/// 包未安装或版本无法识别时使用最早支持的版本。
pub async fn installed_release(host: &dyn Host) -> Result<OpenStackRelease> {
    let version = host.package_version(VERSION_PACKAGE).await?;
    let release = version
        .as_deref()
        .and_then(OpenStackRelease::from_package_version);

    match release {
        Some(release) => Ok(release),
        None => {
            warn!(
                "无法根据 {} 的版本 {:?} 判断 OpenStack 版本，使用 {}",
                VERSION_PACKAGE,
                version,
                OpenStackRelease::EARLIEST
            );
            Ok(OpenStackRelease::EARLIEST)
        }
    }
}

/// 文件系统路径
///
/// charm 使用的都是绝对路径，这里统一挂到 root 下解析，便于在测试中使用临时目录。
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 解析绝对路径
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    pub fn ceph_dir(&self) -> PathBuf {
        self.resolve("/etc/ceph")
    }

    pub fn keyring(&self, service: &str) -> PathBuf {
        self.resolve(&format!("/etc/ceph/ceph.client.{}.keyring", service))
    }

    pub fn environment(&self) -> PathBuf {
        self.resolve("/etc/environment")
    }

    pub fn cinder_volume_override(&self) -> PathBuf {
        self.resolve("/etc/init/cinder-volume.override")
    }
}
