/// 构建 charm 期望的 broker 请求

use std::collections::BTreeMap;

use super::message::{BrokerOp, BrokerRequest};

/// 存储池所属的组
pub const POOL_GROUP: &str = "volumes";

/// 开启 restrict-ceph-pools 时申请访问的组，顺序固定
pub const ACCESS_GROUPS: [&str; 3] = ["volumes", "images", "vms"];

/// 根据当前配置构建期望的 broker 请求
///
/// 副本数和权重不做校验，原样传给 broker。
pub fn build_request(
    service: &str,
    replicas: i64,
    weight: Option<i64>,
    restrict_pools: bool,
) -> BrokerRequest {
    let mut request = BrokerRequest::new();

    request.add_op(BrokerOp::CreatePool {
        name: service.to_string(),
        replicas,
        weight,
        group: Some(POOL_GROUP.to_string()),
    });

    if restrict_pools {
        for group in ACCESS_GROUPS {
            request.add_op(BrokerOp::RequestAccessToGroup {
                name: group.to_string(),
                object_prefix_permissions: BTreeMap::from([(
                    "class-read".to_string(),
                    vec!["rbd_children".to_string()],
                )]),
                permission: "rwx".to_string(),
            });
        }
    }

    request
}
