/// 配置文件渲染
///
/// 按 hook 执行构建配置注册表，渲染 INI 文件，并在文件变化时重启相关服务

pub mod registry;
pub mod renderer;
pub mod restart;

pub use registry::{register_configs, ConfigRegistry};
pub use restart::RestartOnChange;
