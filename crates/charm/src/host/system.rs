/// 基于系统命令的主机操作

use async_trait::async_trait;
use common::{Error, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::{error, info};

use super::Host;

pub struct SystemHost;

impl SystemHost {
    pub fn new() -> Self {
        Self
    }

    /// 执行命令，失败时返回 stderr
    async fn run(&self, program: &str, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(program)
            .args(args)
            .env("DEBIAN_FRONTEND", "noninteractive")
            .output()
            .await
            .map_err(|e| Error::Host(format!("无法执行 {}: {}", program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!("{} {:?} 执行失败: {}", program, args, stderr);
            return Err(Error::Host(format!("{} 执行失败: {}", program, stderr.trim())));
        }

        Ok(output.stdout)
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Host for SystemHost {
    async fn apt_update(&self) -> Result<()> {
        info!("更新包索引");
        self.run("apt-get", &["update", "-q"]).await?;
        Ok(())
    }

    async fn apt_install(&self, packages: &[&str]) -> Result<()> {
        info!("安装软件包: {:?}", packages);
        let mut args = vec![
            "--assume-yes",
            "--option=Dpkg::Options::=--force-confold",
            "install",
        ];
        args.extend_from_slice(packages);
        self.run("apt-get", &args).await?;
        Ok(())
    }

    async fn package_version(&self, package: &str) -> Result<Option<String>> {
        let output = Command::new("dpkg-query")
            .args(["--show", "--showformat=${Status}|${Version}", package])
            .output()
            .await
            .map_err(|e| Error::Host(format!("无法执行 dpkg-query: {}", e)))?;

        // 包不存在时 dpkg-query 返回非零
        if !output.status.success() {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_dpkg_status(&stdout))
    }

    async fn service_restart(&self, service: &str) -> Result<()> {
        info!("重启服务: {}", service);
        self.run("service", &[service, "restart"]).await?;
        Ok(())
    }

    async fn install_alternative(
        &self,
        name: &str,
        target: &Path,
        source: &Path,
        priority: u32,
    ) -> Result<()> {
        let target = target.to_string_lossy().to_string();
        let source = source.to_string_lossy().to_string();
        let priority = priority.to_string();
        info!("注册 alternative: {} {} -> {}", name, target, source);
        self.run(
            "update-alternatives",
            &[
                "--force",
                "--install",
                target.as_str(),
                name,
                source.as_str(),
                priority.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn chown(&self, path: &Path, user: &str, group: &str) -> Result<()> {
        let owner = format!("{}:{}", user, group);
        let path = path.to_string_lossy().to_string();
        self.run("chown", &[owner.as_str(), path.as_str()]).await?;
        Ok(())
    }

    async fn run_executable(&self, path: &Path) -> Result<()> {
        info!("执行 {:?}", path);
        let status = Command::new(path)
            .status()
            .await
            .map_err(|e| Error::Host(format!("无法执行 {:?}: {}", path, e)))?;

        if !status.success() {
            return Err(Error::Host(format!("{:?} 退出码 {:?}", path, status.code())));
        }
        Ok(())
    }
}

/// 解析 `${Status}|${Version}` 输出，只有已安装的包才返回版本
fn parse_dpkg_status(output: &str) -> Option<String> {
    let (status, version) = output.trim().split_once('|')?;
    if status.ends_with(" installed") && !version.is_empty() {
        Some(version.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dpkg_status() {
        assert_eq!(
            parse_dpkg_status("install ok installed|2:12.0.0-0ubuntu1\n"),
            Some("2:12.0.0-0ubuntu1".to_string())
        );
        assert_eq!(parse_dpkg_status("deinstall ok config-files|2:12.0.0-0ubuntu1"), None);
        assert_eq!(parse_dpkg_status("unknown ok not-installed|"), None);
        assert_eq!(parse_dpkg_status(""), None);
    }
}
