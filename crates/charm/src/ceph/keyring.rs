/// ceph 客户端 keyring
///
/// 密钥来自 ceph relation，文件属主为 cinder 用户

use common::models::constants::CEPH_ENDPOINT;
use common::{Error, Result};
use tokio::fs;
use tracing::{debug, info};

use crate::hookenv::{first_remote_value, HookTools};
use crate::host::{Host, Paths};
use crate::templating::renderer::write_file;

fn keyring_content(service: &str, key: &str) -> String {
    format!("[client.{}]\n\tkey = {}\n", service, key)
}

/// 根据 ceph relation 上发布的密钥写入 keyring
///
/// 尚无密钥时返回 false；内容未变化时不重写文件。
pub async fn ensure_ceph_keyring(
    tools: &dyn HookTools,
    host: &dyn Host,
    paths: &Paths,
    service: &str,
    user: &str,
    group: &str,
) -> Result<bool> {
    let key = match first_remote_value(tools, CEPH_ENDPOINT, "key").await? {
        Some(key) => key,
        None => return Ok(false),
    };

    let path = paths.keyring(service);
    let content = keyring_content(service, &key);
    if fs::read_to_string(&path).await.ok().as_deref() == Some(content.as_str()) {
        debug!("keyring {:?} 未变化", path);
        return Ok(true);
    }

    info!("写入 ceph keyring: {:?}", path);
    write_file(&path, &content).await?;
    host.chown(&path, user, group).await?;
    Ok(true)
}

/// 删除 keyring，不存在时忽略
pub async fn delete_keyring(paths: &Paths, service: &str) -> Result<()> {
    let path = paths.keyring(service);
    match fs::remove_file(&path).await {
        Ok(()) => {
            info!("已删除 ceph keyring: {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::File(format!("无法删除 {:?}: {}", path, e))),
    }
}
