/// ceph.conf 上下文
///
/// 从 ceph relation 读取认证方式、密钥和 monitor 地址

use common::models::constants::{CEPH_ENDPOINT, CINDER_VOLUME_SERVICE};
use common::sections::{ceph_config_file, FileSections, Sections};
use common::{ConfigSectionMap, Result, SectionValue};
use std::collections::{BTreeMap, BTreeSet};

use super::ContextGenerator;
use crate::hookenv::HookTools;

#[derive(Debug, Clone, Default)]
pub struct CephConfContext {
    /// charm ceph.conf 路径
    conf_path: String,
    auth: Option<String>,
    key: Option<String>,
    mon_hosts: BTreeSet<String>,
    use_syslog: bool,
}

/// IPv6 地址需要加方括号
fn format_mon_address(address: &str) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{}]", address)
    } else {
        address.to_string()
    }
}

impl CephConfContext {
    /// 读取 ceph relation 上所有远端单元的数据
    pub async fn load(tools: &dyn HookTools, service: &str, use_syslog: bool) -> Result<Self> {
        let mut ctx = Self {
            conf_path: ceph_config_file(service),
            use_syslog,
            ..Default::default()
        };

        for rid in tools.relation_ids(CEPH_ENDPOINT).await? {
            for unit in tools.related_units(&rid).await? {
                let data = tools.relation_get(&rid, &unit).await?;
                let non_empty = |key: &str| data.get(key).filter(|v| !v.is_empty()).cloned();

                if let Some(auth) = non_empty("auth") {
                    ctx.auth = Some(auth);
                }
                if let Some(key) = non_empty("key") {
                    ctx.key = Some(key);
                }
                if let Some(address) = non_empty("ceph-public-address").or_else(|| non_empty("private-address")) {
                    ctx.mon_hosts.insert(format_mon_address(&address));
                }
            }
        }

        Ok(ctx)
    }

    fn sections(&self) -> Sections {
        let mut global: Vec<(String, SectionValue)> = Vec::new();

        if let Some(auth) = self.auth.as_deref().filter(|_| self.is_complete()) {
            let mon_hosts: Vec<&str> = self.mon_hosts.iter().map(String::as_str).collect();
            global.push(("auth_supported".to_string(), auth.into()));
            global.push(("keyring".to_string(), "/etc/ceph/$cluster.$name.keyring".into()));
            global.push(("mon host".to_string(), mon_hosts.join(" ").into()));
        }

        let syslog = if self.use_syslog { "true" } else { "false" };
        global.push(("log to syslog".to_string(), syslog.into()));
        global.push(("err to syslog".to_string(), syslog.into()));
        global.push(("clog to syslog".to_string(), syslog.into()));

        BTreeMap::from([("global".to_string(), global)])
    }
}

impl ContextGenerator for CephConfContext {
    fn name(&self) -> &'static str {
        "ceph"
    }

    fn is_complete(&self) -> bool {
        self.auth.is_some() && self.key.is_some() && !self.mon_hosts.is_empty()
    }

    fn generate(&self) -> ConfigSectionMap {
        let file = FileSections {
            sections: self.sections(),
        };
        BTreeMap::from([(
            CINDER_VOLUME_SERVICE.to_string(),
            BTreeMap::from([(self.conf_path.clone(), file)]),
        )])
    }
}
