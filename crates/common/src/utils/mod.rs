/// 工具函数集合

use uuid::Uuid;

/// 生成唯一 ID
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// 将单元名转换为可用作 relation 键的形式
///
/// `cinder-ceph/0` -> `cinder-ceph-0`
pub fn unit_key(unit_name: &str) -> String {
    unit_name.replace('/', "-")
}

/// 从单元名中提取应用名
///
/// `cinder-ceph/0` -> `cinder-ceph`
pub fn service_name(unit_name: &str) -> &str {
    unit_name.split('/').next().unwrap_or(unit_name)
}
