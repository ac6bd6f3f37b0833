/// CEPH_ARGS 环境变量

use common::Result;
use tokio::fs;
use tracing::info;

use crate::host::Paths;
use crate::templating::renderer::write_file;

/// 让 cinder-volume 以 charm 的 ceph 用户访问集群
///
/// `/etc/environment` 中没有 CEPH_ARGS 时追加一行；upstart override 每次重写。
pub async fn set_ceph_env_variables(paths: &Paths, service: &str) -> Result<()> {
    let ceph_args = format!("CEPH_ARGS=\"--id {}\"", service);

    let environment = paths.environment();
    let current = fs::read_to_string(&environment).await.unwrap_or_default();
    if !current.lines().any(|line| line.trim_start().starts_with("CEPH_ARGS")) {
        let mut content = current;
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        content.push_str(&ceph_args);
        content.push('\n');
        info!("在 {:?} 中设置 {}", environment, ceph_args);
        write_file(&environment, &content).await?;
    }

    write_file(&paths.cinder_volume_override(), &format!("env {}\n", ceph_args)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_env_variables() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        write_file(&paths.environment(), "PATH=\"/usr/bin\"").await.unwrap();

        set_ceph_env_variables(&paths, "cinder-ceph").await.unwrap();
        set_ceph_env_variables(&paths, "cinder-ceph").await.unwrap();

        assert_eq!(
            std::fs::read_to_string(paths.environment()).unwrap(),
            "PATH=\"/usr/bin\"\nCEPH_ARGS=\"--id cinder-ceph\"\n"
        );
        assert_eq!(
            std::fs::read_to_string(paths.cinder_volume_override()).unwrap(),
            "env CEPH_ARGS=\"--id cinder-ceph\"\n"
        );
    }

    #[tokio::test]
    async fn test_existing_ceph_args_kept() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        write_file(&paths.environment(), "CEPH_ARGS=\"--id other\"\n").await.unwrap();

        set_ceph_env_variables(&paths, "cinder-ceph").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(paths.environment()).unwrap(),
            "CEPH_ARGS=\"--id other\"\n"
        );
    }
}
