/// 配置注册表
///
/// 记录本次 hook 执行需要维护的配置文件、对应的上下文以及文件变化时需要重启的服务。
/// 每次 hook 执行构建一次，不使用全局状态。

use common::models::constants::{CEPH_CONF, CEPH_ENDPOINT, CINDER_VOLUME_SERVICE};
use common::sections::{ceph_config_file, Sections};
use common::Result;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};

use super::renderer::{render_sections, write_file};
use crate::config::CharmOptions;
use crate::contexts::{CephConfContext, ContextGenerator};
use crate::hookenv::HookTools;
use crate::host::{Host, Paths};

/// alternatives 优先级
const ALTERNATIVE_PRIORITY: u32 = 50;

/// 注册的配置文件
struct ConfigFile {
    /// 绝对路径（未挂 root）
    path: String,
    contexts: Vec<Box<dyn ContextGenerator>>,
    services: Vec<String>,
}

/// 配置注册表
pub struct ConfigRegistry {
    paths: Paths,
    files: Vec<ConfigFile>,
}

impl ConfigRegistry {
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            files: Vec::new(),
        }
    }

    /// 注册配置文件
    pub fn register(
        &mut self,
        path: impl Into<String>,
        contexts: Vec<Box<dyn ContextGenerator>>,
        services: Vec<String>,
    ) {
        let path = path.into();
        debug!("注册配置文件: {}", path);
        self.files.push(ConfigFile {
            path,
            contexts,
            services,
        });
    }

    /// 已注册的文件
    pub fn registered_files(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// 数据齐全的上下文名称
    pub fn complete_contexts(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .files
            .iter()
            .flat_map(|f| f.contexts.iter())
            .filter(|ctx| ctx.is_complete())
            .map(|ctx| ctx.name())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// 指定上下文是否齐全
    pub fn is_complete(&self, name: &str) -> bool {
        self.complete_contexts().contains(&name)
    }

    /// 配置文件 -> 需要重启的服务
    pub fn restart_map(&self) -> BTreeMap<String, Vec<String>> {
        self.files
            .iter()
            .filter(|f| !f.services.is_empty())
            .map(|f| (f.path.clone(), f.services.clone()))
            .collect()
    }

    /// 渲染单个配置文件
    pub async fn write(&self, path: &str) -> Result<()> {
        let file = match self.files.iter().find(|f| f.path == path) {
            Some(file) => file,
            None => {
                warn!("配置文件 {} 未注册，跳过", path);
                return Ok(());
            }
        };

        let mut sections = Sections::new();
        for ctx in &file.contexts {
            for files in ctx.generate().into_values() {
                if let Some(generated) = files.get(path) {
                    for (name, entries) in &generated.sections {
                        sections
                            .entry(name.clone())
                            .or_default()
                            .extend(entries.iter().cloned());
                    }
                }
            }
        }

        info!("写入配置文件: {}", path);
        write_file(&self.paths.resolve(path), &render_sections(&sections)).await
    }

    /// 渲染全部配置文件
    pub async fn write_all(&self) -> Result<()> {
        for file in &self.files {
            self.write(&file.path).await?;
        }
        Ok(())
    }
}

/// 构建本次 hook 执行的配置注册表
///
/// 存在 ceph relation 时维护 charm 自己的 ceph.conf，并将其注册为系统 ceph.conf 的 alternative。
pub async fn register_configs(
    tools: &dyn HookTools,
    host: &dyn Host,
    paths: &Paths,
    service: &str,
    options: &CharmOptions,
) -> Result<ConfigRegistry> {
    let mut registry = ConfigRegistry::new(paths.clone());

    if tools.relation_ids(CEPH_ENDPOINT).await?.is_empty() {
        return Ok(registry);
    }

    let charm_conf = ceph_config_file(service);
    let charm_conf_path = paths.resolve(&charm_conf);
    let ceph_conf_path = paths.resolve(CEPH_CONF);

    for path in [&charm_conf_path, &ceph_conf_path] {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }
    }

    // 先创建空文件，供 alternative 指向
    if fs::metadata(&charm_conf_path).await.is_err() {
        write_file(&charm_conf_path, "").await?;
    }

    install_alternative(host, "ceph.conf", &ceph_conf_path, &charm_conf_path).await?;

    let ctx = CephConfContext::load(tools, service, options.use_syslog).await?;
    registry.register(
        charm_conf,
        vec![Box::new(ctx)],
        vec![CINDER_VOLUME_SERVICE.to_string()],
    );

    Ok(registry)
}

/// 注册 alternative，目标位置已有普通文件时先备份
async fn install_alternative(host: &dyn Host, name: &str, target: &Path, source: &Path) -> Result<()> {
    if let Ok(metadata) = fs::symlink_metadata(target).await {
        if !metadata.file_type().is_symlink() {
            let backup = target.with_extension("conf.bak");
            info!("备份已有的 {:?} 到 {:?}", target, backup);
            fs::rename(target, &backup).await?;
        }
    }

    host.install_alternative(name, target, source, ALTERNATIVE_PRIORITY)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hookenv::memory::MemoryHookTools;
    use crate::host::recording::RecordingHost;

    fn complete_ceph(tools: &MemoryHookTools) {
        tools.add_relation("ceph", "ceph:1");
        tools.set_remote("ceph:1", "ceph-mon/0", "auth", "cephx");
        tools.set_remote("ceph:1", "ceph-mon/0", "key", "AQBsecret==");
        tools.set_remote("ceph:1", "ceph-mon/0", "ceph-public-address", "10.0.0.1");
    }

    #[tokio::test]
    async fn test_no_ceph_relation() {
        let dir = tempfile::tempdir().unwrap();
        let tools = MemoryHookTools::new("cinder-ceph/0");
        let host = RecordingHost::new();
        let registry = register_configs(
            &tools,
            &host,
            &Paths::new(dir.path()),
            "cinder-ceph",
            &CharmOptions::default(),
        )
        .await
        .unwrap();

        assert!(registry.registered_files().is_empty());
        assert!(registry.complete_contexts().is_empty());
        assert!(host.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_ceph_conf() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        std::fs::create_dir_all(paths.ceph_dir()).unwrap();
        std::fs::write(paths.resolve(CEPH_CONF), "[global]\n").unwrap();

        let tools = MemoryHookTools::new("cinder-ceph/0");
        tools.add_relation("ceph", "ceph:1");
        let host = RecordingHost::new();
        let registry = register_configs(&tools, &host, &paths, "cinder-ceph", &CharmOptions::default())
            .await
            .unwrap();

        assert_eq!(registry.registered_files(), vec!["/var/lib/charm/cinder-ceph/ceph.conf"]);
        assert!(!registry.is_complete("ceph"));
        assert!(paths.resolve("/var/lib/charm/cinder-ceph/ceph.conf").exists());
        assert!(dir.path().join("etc/ceph/ceph.conf.bak").exists());
        assert_eq!(
            host.calls(),
            vec![format!(
                "install_alternative ceph.conf {} {} 50",
                paths.resolve(CEPH_CONF).display(),
                paths.resolve("/var/lib/charm/cinder-ceph/ceph.conf").display()
            )]
        );
        assert_eq!(
            registry.restart_map(),
            BTreeMap::from([(
                "/var/lib/charm/cinder-ceph/ceph.conf".to_string(),
                vec!["cinder-volume".to_string()]
            )])
        );
    }

    #[tokio::test]
    async fn test_write_all_renders_ceph_conf() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path());
        let tools = MemoryHookTools::new("cinder-ceph/0");
        complete_ceph(&tools);
        let host = RecordingHost::new();

        let registry = register_configs(&tools, &host, &paths, "cinder-ceph", &CharmOptions::default())
            .await
            .unwrap();
        assert_eq!(registry.complete_contexts(), vec!["ceph"]);

        registry.write_all().await.unwrap();
        let rendered =
            std::fs::read_to_string(paths.resolve("/var/lib/charm/cinder-ceph/ceph.conf")).unwrap();
        assert_eq!(
            rendered,
            "[global]\n\
             auth_supported = cephx\n\
             keyring = /etc/ceph/$cluster.$name.keyring\n\
             mon host = 10.0.0.1\n\
             log to syslog = false\n\
             err to syslog = false\n\
             clog to syslog = false\n"
        );
    }

    #[tokio::test]
    async fn test_write_unregistered_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let registry = ConfigRegistry::new(Paths::new(dir.path()));
        registry.write("/etc/ceph/ceph.conf").await.unwrap();
        assert!(!dir.path().join("etc/ceph/ceph.conf").exists());
    }
}
