/// 配置变化时重启服务
///
/// hook 执行前记录受管文件的内容，执行后比较，变化的文件对应的服务各重启一次。

use common::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

use crate::host::{Host, Paths};

struct Watched {
    path: PathBuf,
    services: Vec<String>,
    before: Option<Vec<u8>>,
}

pub struct RestartOnChange {
    watched: Vec<Watched>,
}

impl RestartOnChange {
    /// 记录 restart_map 中所有文件当前的内容
    pub async fn capture(paths: &Paths, restart_map: &BTreeMap<String, Vec<String>>) -> Self {
        let mut watched = Vec::with_capacity(restart_map.len());
        for (file, services) in restart_map {
            let path = paths.resolve(file);
            let before = fs::read(&path).await.ok();
            watched.push(Watched {
                path,
                services: services.clone(),
                before,
            });
        }
        Self { watched }
    }

    /// 重启内容发生变化的文件对应的服务以及 always 中的服务，每个服务只重启一次
    pub async fn restart_changed(self, host: &dyn Host, always: &[&str]) -> Result<Vec<String>> {
        let mut restart: Vec<String> = always.iter().map(|s| s.to_string()).collect();
        for watched in &self.watched {
            let after = fs::read(&watched.path).await.ok();
            if after == watched.before {
                continue;
            }
            info!("配置文件 {:?} 已变化", watched.path);
            for service in &watched.services {
                if !restart.contains(service) {
                    restart.push(service.clone());
                }
            }
        }

        for service in &restart {
            info!("重启服务: {}", service);
            host.service_restart(service).await?;
        }
        Ok(restart)
    }
}
