//! telemetry - 可观测性库
//!
//! 日志级别过滤器通过 reload 层安装，运行期可随时替换，
//! 不会影响正在输出中的日志事件

use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("Invalid log level '{level}': {reason}")]
    InvalidLevel { level: String, reason: String },

    #[error("Failed to reload log filter: {0}")]
    Reload(#[from] reload::Error),

    #[error("Failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to install Prometheus exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// 日志级别控制句柄
///
/// 可克隆，多个持有者并发修改时以最后一次为准
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// 当前生效的过滤规则
    pub fn current_level(&self) -> Result<String, TelemetryError> {
        Ok(self.inner.with_current(|filter| filter.to_string())?)
    }

    /// 动态修改全局日志级别
    pub fn modify_level(&self, level: &str) -> Result<(), TelemetryError> {
        let filter = parse_filter(level)?;
        let before = self.current_level()?;
        self.inner.reload(filter)?;
        info!(before = %before, after = %level, "Log level modified");
        Ok(())
    }
}

fn parse_filter(level: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(level).map_err(|e| TelemetryError::InvalidLevel {
        level: level.to_string(),
        reason: e.to_string(),
    })
}

/// `RUST_LOG` 优先于配置文件中的级别
fn initial_filter(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_filter(log_level),
    }
}

fn reloadable_filter(
    filter: EnvFilter,
) -> (reload::Layer<EnvFilter, Registry>, LogLevelHandle) {
    let (layer, inner) = reload::Layer::new(filter);
    (layer, LogLevelHandle { inner })
}

/// 初始化 tracing
pub fn init_tracing(log_level: &str) -> Result<LogLevelHandle, TelemetryError> {
    let (filter, handle) = reloadable_filter(initial_filter(log_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    Ok(handle)
}

/// 初始化 JSON 格式的 tracing（生产环境）
pub fn init_tracing_json(log_level: &str) -> Result<LogLevelHandle, TelemetryError> {
    let (filter, handle) = reloadable_filter(initial_filter(log_level)?);

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .try_init()?;

    Ok(handle)
}

/// 初始化 Prometheus metrics，在给定端口暴露 `/metrics`
pub fn init_metrics(port: u16) -> Result<(), TelemetryError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}
