/// cinder-ceph - 公共库
/// 
/// 提供 charm 使用的 broker 协议类型、配置段模型、错误处理、工具函数等

pub mod broker;
pub mod errors;
pub mod models;
pub mod sections;
pub mod utils;

// 重新导出常用类型
pub use broker::{build_request, BrokerOp, BrokerRequest, BrokerResponse};
pub use errors::{Error, Result};
pub use models::OpenStackRelease;
pub use sections::{generate_sections, ConfigSectionMap, SectionValue, VolumeDriver};
