/// cinder 后端配置上下文
///
/// 通过 storage-backend relation 交给 cinder 主 charm 写入 cinder.conf

use common::models::constants::{CEPH_ENDPOINT, SECRET_UUID_KEY};
use common::sections::supports_exclusive_pool;
use common::{generate_sections, ConfigSectionMap, OpenStackRelease, Result, VolumeDriver};

use super::ContextGenerator;
use crate::hookenv::{is_relation_made, HookTools};
use crate::host::{installed_release, Host};

#[derive(Debug, Clone)]
pub struct CephSubordinateContext {
    /// ceph relation 是否已提供密钥
    relation_made: bool,
    service: String,
    release: OpenStackRelease,
    secret_uuid: Option<String>,
}

impl CephSubordinateContext {
    pub fn new(
        relation_made: bool,
        service: impl Into<String>,
        release: OpenStackRelease,
        secret_uuid: Option<String>,
    ) -> Self {
        Self {
            relation_made,
            service: service.into(),
            release,
            secret_uuid,
        }
    }

    /// 读取 relation、leader 设置和已安装的 cinder 版本
    pub async fn load(tools: &dyn HookTools, host: &dyn Host, service: &str) -> Result<Self> {
        let relation_made = is_relation_made(tools, CEPH_ENDPOINT, "key").await?;
        if !relation_made {
            return Ok(Self::new(false, service, OpenStackRelease::EARLIEST, None));
        }

        let release = installed_release(host).await?;
        let secret_uuid = tools.leader_get(SECRET_UUID_KEY).await?;
        Ok(Self::new(true, service, release, secret_uuid))
    }
}

impl ContextGenerator for CephSubordinateContext {
    fn name(&self) -> &'static str {
        "ceph-cinder"
    }

    fn is_complete(&self) -> bool {
        self.relation_made
    }

    fn generate(&self) -> ConfigSectionMap {
        if !self.relation_made {
            return ConfigSectionMap::new();
        }

        generate_sections(
            &self.service,
            VolumeDriver::for_release(self.release),
            self.secret_uuid.as_deref().unwrap_or_default(),
            &self.service,
            supports_exclusive_pool(self.release),
        )
    }
}
