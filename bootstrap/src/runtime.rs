//! 服务运行时

use guide_config::AppConfig;
use guide_telemetry::{LogLevelHandle, init_metrics, init_tracing, init_tracing_json};
use tracing::{info, warn};

use crate::error::BootstrapResult;

/// 初始化服务运行时，返回日志级别控制句柄
pub fn init_runtime(config: &AppConfig) -> BootstrapResult<LogLevelHandle> {
    // 初始化 tracing
    let handle = if config.is_production() {
        init_tracing_json(&config.telemetry.log_level)?
    } else {
        init_tracing(&config.telemetry.log_level)?
    };

    if let Some(port) = config.telemetry.metrics_port {
        init_metrics(port)?;
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );

    Ok(handle)
}

/// 从配置重新读取日志级别并生效，返回新的级别
pub fn reload_log_level(handle: &LogLevelHandle, config_dir: &str) -> BootstrapResult<String> {
    let level = AppConfig::reload_log_level(config_dir)?;
    handle.modify_level(&level)?;
    Ok(level)
}

/// 收到 SIGUSR1 时重新读取日志级别
#[cfg(unix)]
pub fn spawn_log_level_reloader(
    handle: LogLevelHandle,
    config_dir: String,
) -> tokio::task::JoinHandle<()> {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut user1 = match signal(SignalKind::user_defined1()) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "Failed to install SIGUSR1 handler, log level reload disabled");
                return;
            }
        };

        while user1.recv().await.is_some() {
            match reload_log_level(&handle, &config_dir) {
                Ok(level) => info!(level = %level, "Log level reloaded"),
                Err(e) => warn!(error = %e, "Log level reload failed, keeping current level"),
            }
        }
    })
}

/// 等待关闭信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
