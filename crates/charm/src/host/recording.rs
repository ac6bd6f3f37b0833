/// 记录调用的主机实现，供测试使用

use async_trait::async_trait;
use common::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::Host;

#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
    package_versions: Mutex<HashMap<String, String>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_package_version(&self, package: &str, version: &str) {
        self.package_versions
            .lock()
            .unwrap()
            .insert(package.to_string(), version.to_string());
    }

    /// 所有调用记录
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// 某个服务被重启的次数
    pub fn restarts(&self, service: &str) -> usize {
        let expected = format!("service_restart {}", service);
        self.calls().iter().filter(|c| **c == expected).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Host for RecordingHost {
    async fn apt_update(&self) -> Result<()> {
        self.record("apt_update".to_string());
        Ok(())
    }

    async fn apt_install(&self, packages: &[&str]) -> Result<()> {
        self.record(format!("apt_install {}", packages.join(" ")));
        Ok(())
    }

    async fn package_version(&self, package: &str) -> Result<Option<String>> {
        Ok(self.package_versions.lock().unwrap().get(package).cloned())
    }

    async fn service_restart(&self, service: &str) -> Result<()> {
        self.record(format!("service_restart {}", service));
        Ok(())
    }

    async fn install_alternative(
        &self,
        name: &str,
        target: &Path,
        source: &Path,
        priority: u32,
    ) -> Result<()> {
        self.record(format!(
            "install_alternative {} {} {} {}",
            name,
            target.display(),
            source.display(),
            priority
        ));
        Ok(())
    }

    async fn chown(&self, path: &Path, user: &str, group: &str) -> Result<()> {
        self.record(format!("chown {}:{} {}", user, group, path.display()));
        Ok(())
    }

    async fn run_executable(&self, path: &Path) -> Result<()> {
        self.record(format!("run {}", path.display()));
        Ok(())
    }
}
