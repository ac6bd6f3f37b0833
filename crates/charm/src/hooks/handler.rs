/// Hook 处理器
///
/// 每个 hook 一次执行：加载 charm 配置，构建配置注册表，然后按事件分发。

use common::models::constants::{
    CEPH_ACCESS_ENDPOINT, CEPH_ENDPOINT, CINDER_GROUP, CINDER_USER, CINDER_VOLUME_SERVICE,
    PACKAGES, SECRET_UUID_KEY, STORAGE_BACKEND_ENDPOINT,
};
use common::utils::generate_id;
use common::{build_request, BrokerRequest, Result};
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info};

use super::HookEvent;
use crate::ceph::{delete_keyring, ensure_ceph_keyring, set_ceph_env_variables};
use crate::config::{CharmOptions, Config};
use crate::contexts::{CephSubordinateContext, ContextGenerator};
use crate::hookenv::{first_remote_value, HookTools, RelationData};
use crate::host::{Host, Paths};
use crate::reconciler::{BrokerReconciler, RequestState};
use crate::templating::{register_configs, ConfigRegistry, RestartOnChange};

/// ceph.conf 上下文名称
const CEPH_CONTEXT: &str = "ceph";

pub struct HookHandlers {
    config: Config,
    options: CharmOptions,
    tools: Arc<dyn HookTools>,
    host: Arc<dyn Host>,
    paths: Paths,
    configs: ConfigRegistry,
}

impl HookHandlers {
    pub async fn new(config: Config, tools: Arc<dyn HookTools>, host: Arc<dyn Host>) -> Result<Self> {
        let options = CharmOptions::from_value(tools.config_get().await?)?;
        debug!("charm 配置: {:?}", options);

        let paths = config.paths();
        let configs = register_configs(
            tools.as_ref(),
            host.as_ref(),
            &paths,
            config.service_name(),
            &options,
        )
        .await?;
        debug!("受管配置文件: {:?}", configs.registered_files());

        Ok(Self {
            config,
            options,
            tools,
            host,
            paths,
            configs,
        })
    }

    fn service(&self) -> &str {
        self.config.service_name()
    }

    /// 处理 hook 事件
    pub async fn handle(&self, event: HookEvent) -> Result<()> {
        info!("处理 hook: {}", event);

        let guard = if event.restarts_on_change() {
            Some(RestartOnChange::capture(&self.paths, &self.configs.restart_map()).await)
        } else {
            None
        };

        let mut always_restart = Vec::new();
        match event {
            HookEvent::Install => self.install().await?,
            HookEvent::ConfigChanged => {
                if self.config_changed().await? {
                    always_restart.push(CINDER_VOLUME_SERVICE);
                }
            }
            HookEvent::UpgradeCharm => self.upgrade_charm().await?,
            HookEvent::CephRelationJoined => self.ceph_joined().await?,
            HookEvent::CephRelationChanged => {
                if self.ceph_changed().await? {
                    always_restart.push(CINDER_VOLUME_SERVICE);
                }
            }
            HookEvent::CephRelationBroken => self.ceph_broken().await?,
            HookEvent::StorageBackendRelationJoined | HookEvent::StorageBackendRelationChanged => {
                for rid in self.target_relations(STORAGE_BACKEND_ENDPOINT).await? {
                    self.publish_storage_backend(&rid).await?;
                }
            }
            HookEvent::CephAccessRelationJoined => {
                for rid in self.target_relations(CEPH_ACCESS_ENDPOINT).await? {
                    self.publish_ceph_access(&rid).await?;
                }
            }
            HookEvent::LeaderElected => {
                self.seed_secret_uuid().await?;
            }
            HookEvent::LeaderSettingsChanged => self.leader_settings_changed().await?,
        }

        if let Some(guard) = guard {
            let restarted = guard.restart_changed(self.host.as_ref(), &always_restart).await?;
            if !restarted.is_empty() {
                info!("已重启服务: {:?}", restarted);
            }
        }

        info!("hook {} 处理完成", event);
        Ok(())
    }

    /// 当前 hook 所属的 relation，不在 relation hook 中时为端点上的全部 relation
    async fn target_relations(&self, endpoint: &str) -> Result<Vec<String>> {
        match &self.config.relation_id {
            Some(rid) => Ok(vec![rid.clone()]),
            None => self.tools.relation_ids(endpoint).await,
        }
    }

    fn broker_request(&self) -> BrokerRequest {
        build_request(
            self.service(),
            self.options.ceph_osd_replication_count,
            self.options.ceph_pool_weight,
            self.options.restrict_ceph_pools,
        )
    }

    async fn install(&self) -> Result<()> {
        self.run_pre_install().await?;
        self.host.apt_update().await?;

        let mut missing = Vec::new();
        for package in PACKAGES {
            if self.host.package_version(package).await?.is_none() {
                missing.push(*package);
            }
        }

        if missing.is_empty() {
            info!("所需软件包均已安装");
            return Ok(());
        }
        info!("安装软件包: {:?}", missing);
        self.host.apt_install(&missing).await
    }

    /// 执行 `exec.d/*/charm-pre-install`
    async fn run_pre_install(&self) -> Result<()> {
        let execd = self.config.charm_dir.join("exec.d");
        let mut entries = match fs::read_dir(&execd).await {
            Ok(entries) => entries,
            Err(_) => return Ok(()),
        };

        let mut scripts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let script = entry.path().join("charm-pre-install");
            if let Ok(metadata) = fs::metadata(&script).await {
                if metadata.is_file() && metadata.permissions().mode() & 0o111 != 0 {
                    scripts.push(script);
                }
            }
        }
        scripts.sort();

        for script in scripts {
            info!("执行预安装脚本: {:?}", script);
            self.host.run_executable(&script).await?;
        }
        Ok(())
    }

    async fn ceph_joined(&self) -> Result<()> {
        fs::create_dir_all(self.paths.ceph_dir()).await?;

        let settings = RelationData::from([(
            "application-name".to_string(),
            self.service().to_string(),
        )]);
        for rid in self.target_relations(CEPH_ENDPOINT).await? {
            self.tools.relation_set(&rid, &settings).await?;
        }
        Ok(())
    }

    /// 返回 ceph 资源是否已就绪
    async fn ceph_changed(&self) -> Result<bool> {
        if !self.configs.is_complete(CEPH_CONTEXT) {
            info!("ceph relation 数据不完整，对端尚未就绪");
            return Ok(false);
        }

        let keyring_written = ensure_ceph_keyring(
            self.tools.as_ref(),
            self.host.as_ref(),
            &self.paths,
            self.service(),
            CINDER_USER,
            CINDER_GROUP,
        )
        .await?;
        if !keyring_written {
            info!("无法创建 ceph keyring，对端尚未就绪");
            return Ok(false);
        }

        let desired = self.broker_request();
        let reconciler = BrokerReconciler::new(self.tools.as_ref());
        match reconciler.status(&desired).await? {
            RequestState::Fulfilled => {
                info!("broker 请求已完成");
                set_ceph_env_variables(&self.paths, self.service()).await?;
                self.configs.write_all().await?;
                for rid in self.tools.relation_ids(STORAGE_BACKEND_ENDPOINT).await? {
                    self.publish_storage_backend(&rid).await?;
                }
                for rid in self.tools.relation_ids(CEPH_ACCESS_ENDPOINT).await? {
                    self.publish_ceph_access(&rid).await?;
                }
                Ok(true)
            }
            RequestState::Failed {
                exit_code,
                exit_msg,
            } => {
                error!("broker 请求失败 (exit-code {}): {}", exit_code, exit_msg);
                Ok(false)
            }
            RequestState::NoRequestSent | RequestState::Pending => {
                let state = reconciler.reconcile(&desired).await?;
                debug!("broker 请求状态: {:?}", state);
                Ok(false)
            }
        }
    }

    async fn ceph_broken(&self) -> Result<()> {
        delete_keyring(&self.paths, self.service()).await?;
        self.configs.write_all().await
    }

    /// 配置文件只在 broker 请求完成后由 ceph_changed 写入
    async fn config_changed(&self) -> Result<bool> {
        self.seed_secret_uuid().await?;
        self.ceph_changed().await
    }

    async fn upgrade_charm(&self) -> Result<()> {
        if !self.configs.is_complete(CEPH_CONTEXT) {
            return Ok(());
        }

        self.configs.write_all().await?;
        set_ceph_env_variables(&self.paths, self.service()).await?;
        for rid in self.tools.relation_ids(STORAGE_BACKEND_ENDPOINT).await? {
            self.publish_storage_backend(&rid).await?;
        }
        Ok(())
    }

    async fn leader_settings_changed(&self) -> Result<()> {
        for rid in self.tools.relation_ids(CEPH_ACCESS_ENDPOINT).await? {
            self.publish_ceph_access(&rid).await?;
        }
        for rid in self.tools.relation_ids(STORAGE_BACKEND_ENDPOINT).await? {
            self.publish_storage_backend(&rid).await?;
        }
        Ok(())
    }

    /// 读取 libvirt secret uuid，leader 在缺失时生成
    async fn seed_secret_uuid(&self) -> Result<Option<String>> {
        if let Some(secret) = self.tools.leader_get(SECRET_UUID_KEY).await? {
            return Ok(Some(secret));
        }
        if !self.tools.is_leader().await? {
            return Ok(None);
        }

        let secret = generate_id();
        info!("生成 {}", SECRET_UUID_KEY);
        self.tools
            .leader_set(&RelationData::from([(SECRET_UUID_KEY.to_string(), secret.clone())]))
            .await?;
        Ok(Some(secret))
    }

    /// 向 cinder 主 charm 发布后端配置
    async fn publish_storage_backend(&self, rid: &str) -> Result<()> {
        if !self.configs.is_complete(CEPH_CONTEXT) {
            info!("ceph relation 数据不完整，暂不发布 storage-backend");
            return Ok(());
        }
        if self.seed_secret_uuid().await?.is_none() {
            info!("leader 尚未生成 {}，推迟发布 storage-backend", SECRET_UUID_KEY);
            return Ok(());
        }

        let ctx =
            CephSubordinateContext::load(self.tools.as_ref(), self.host.as_ref(), self.service())
                .await?;
        let subordinate_configuration = serde_json::to_string(&ctx.generate())?;

        let settings = RelationData::from([
            ("backend_name".to_string(), self.service().to_string()),
            ("subordinate_configuration".to_string(), subordinate_configuration),
            ("stateless".to_string(), "True".to_string()),
        ]);
        info!("在 {} 上发布后端配置", rid);
        self.tools.relation_set(rid, &settings).await
    }

    /// 向 nova-compute 发布 ceph 密钥和 libvirt secret uuid
    async fn publish_ceph_access(&self, rid: &str) -> Result<()> {
        if !self.configs.is_complete(CEPH_CONTEXT) {
            info!("ceph relation 数据不完整，推迟发布 ceph-access");
            return Ok(());
        }

        let secret = match self.seed_secret_uuid().await? {
            Some(secret) => secret,
            None => {
                info!("leader 尚未生成 {}，推迟发布 ceph-access", SECRET_UUID_KEY);
                return Ok(());
            }
        };
        let key = match first_remote_value(self.tools.as_ref(), CEPH_ENDPOINT, "key").await? {
            Some(key) => key,
            None => return Ok(()),
        };

        let settings = RelationData::from([
            ("key".to_string(), key),
            (SECRET_UUID_KEY.to_string(), secret),
        ]);
        info!("在 {} 上发布 ceph-access 数据", rid);
        self.tools.relation_set(rid, &settings).await
    }
}
