/// Hook 事件分发

pub mod handler;

use common::Error;
use std::fmt;
use std::str::FromStr;

pub use handler::HookHandlers;

/// charm 处理的 hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    Install,
    ConfigChanged,
    UpgradeCharm,
    CephRelationJoined,
    CephRelationChanged,
    CephRelationBroken,
    StorageBackendRelationJoined,
    StorageBackendRelationChanged,
    CephAccessRelationJoined,
    LeaderElected,
    LeaderSettingsChanged,
}

impl HookEvent {
    pub const ALL: [HookEvent; 11] = [
        HookEvent::Install,
        HookEvent::ConfigChanged,
        HookEvent::UpgradeCharm,
        HookEvent::CephRelationJoined,
        HookEvent::CephRelationChanged,
        HookEvent::CephRelationBroken,
        HookEvent::StorageBackendRelationJoined,
        HookEvent::StorageBackendRelationChanged,
        HookEvent::CephAccessRelationJoined,
        HookEvent::LeaderElected,
        HookEvent::LeaderSettingsChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::Install => "install",
            HookEvent::ConfigChanged => "config-changed",
            HookEvent::UpgradeCharm => "upgrade-charm",
            HookEvent::CephRelationJoined => "ceph-relation-joined",
            HookEvent::CephRelationChanged => "ceph-relation-changed",
            HookEvent::CephRelationBroken => "ceph-relation-broken",
            HookEvent::StorageBackendRelationJoined => "storage-backend-relation-joined",
            HookEvent::StorageBackendRelationChanged => "storage-backend-relation-changed",
            HookEvent::CephAccessRelationJoined => "ceph-access-relation-joined",
            HookEvent::LeaderElected => "leader-elected",
            HookEvent::LeaderSettingsChanged => "leader-settings-changed",
        }
    }

    /// 执行前后比较配置文件，变化时重启服务
    pub fn restarts_on_change(&self) -> bool {
        matches!(
            self,
            HookEvent::ConfigChanged
                | HookEvent::UpgradeCharm
                | HookEvent::CephRelationChanged
                | HookEvent::CephRelationBroken
        )
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HookEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| Error::InvalidArgument(format!("未知的 hook: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hook_names() {
        for event in HookEvent::ALL {
            assert_eq!(event.as_str().parse::<HookEvent>().unwrap(), event);
        }
        assert_eq!(
            "ceph-relation-changed".parse::<HookEvent>().unwrap(),
            HookEvent::CephRelationChanged
        );
    }

    #[test]
    fn test_unknown_hook() {
        assert!(matches!(
            "update-status".parse::<HookEvent>(),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_restart_on_change_hooks() {
        let guarded: Vec<&str> = HookEvent::ALL
            .iter()
            .filter(|e| e.restarts_on_change())
            .map(|e| e.as_str())
            .collect();
        assert_eq!(
            guarded,
            vec!["config-changed", "upgrade-charm", "ceph-relation-changed", "ceph-relation-broken"]
        );
    }
}
