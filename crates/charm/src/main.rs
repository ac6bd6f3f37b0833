/// cinder-ceph charm
///
/// hooks/ 下的每个 hook 都是指向本程序的符号链接，每次执行处理一个 hook。

use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

mod ceph;
mod config;
mod contexts;
mod hookenv;
mod hooks;
mod host;
mod reconciler;
mod templating;

use hookenv::JujuHookTools;
use hooks::{HookEvent, HookHandlers};
use host::SystemHost;

#[derive(Parser, Debug)]
#[command(name = "cinder-ceph", version, about = "cinder-ceph charm hook 程序")]
struct Cli {
    /// hook 名称，缺省时使用程序被调用时的文件名
    hook: Option<String>,
}

/// 命令行参数优先，其次是 argv[0] 的文件名
fn resolve_hook_name(hook: Option<String>, argv0: Option<&str>) -> Option<String> {
    hook.or_else(|| {
        argv0
            .and_then(|argv0| Path::new(argv0).file_name())
            .map(|name| name.to_string_lossy().into_owned())
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Juju 将 stderr 收集到单元日志，可以通过 RUST_LOG 调整级别
    tracing_subscriber::fmt()
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let argv0 = std::env::args().next();
    let hook_name = resolve_hook_name(cli.hook, argv0.as_deref())
        .ok_or_else(|| anyhow::anyhow!("无法确定 hook 名称"))?;

    let event = match hook_name.parse::<HookEvent>() {
        Ok(event) => event,
        Err(_) => {
            info!("hook {} 无需处理", hook_name);
            return Ok(());
        }
    };

    let cfg = config::Config::from_env()?;
    info!("🚀 cinder-ceph 单元 {} 执行 hook {}", cfg.unit_name, event);

    let tools = Arc::new(JujuHookTools::new(cfg.unit_name.clone()));
    let host = Arc::new(SystemHost::new());
    let handlers = HookHandlers::new(cfg, tools, host).await?;
    handlers.handle(event).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_hook_name() {
        assert_eq!(
            resolve_hook_name(Some("install".to_string()), Some("/var/lib/juju/hooks/config-changed")),
            Some("install".to_string())
        );
        assert_eq!(
            resolve_hook_name(None, Some("/var/lib/juju/charm/hooks/ceph-relation-changed")),
            Some("ceph-relation-changed".to_string())
        );
        assert_eq!(resolve_hook_name(None, None), None);
    }

    #[test]
    fn test_cli_parse() {
        let cli = Cli::parse_from(["cinder-ceph", "leader-elected"]);
        assert_eq!(cli.hook.as_deref(), Some("leader-elected"));

        let cli = Cli::parse_from(["config-changed"]);
        assert_eq!(cli.hook, None);
    }
}
