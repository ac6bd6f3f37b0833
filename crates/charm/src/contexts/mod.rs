/// 模板上下文
///
/// 每个上下文在加载时读取一次 relation / 主机状态，之后 `generate` 是纯函数

pub mod ceph;
pub mod subordinate;

use common::ConfigSectionMap;

pub use ceph::CephConfContext;
pub use subordinate::CephSubordinateContext;

/// 上下文生成器 Trait
pub trait ContextGenerator: Send + Sync {
    /// 上下文名称，用于判断依赖的 relation 是否完整
    fn name(&self) -> &'static str;

    /// 所需数据是否已经齐全
    fn is_complete(&self) -> bool;

    /// 生成配置段
    fn generate(&self) -> ConfigSectionMap;
}
