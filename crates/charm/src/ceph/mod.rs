/// ceph 客户端文件
///
/// keyring 与 CEPH_ARGS 环境变量

pub mod env;
pub mod keyring;

pub use env::set_ceph_env_variables;
pub use keyring::{delete_keyring, ensure_ceph_keyring};
