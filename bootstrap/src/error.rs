//! 启动错误

use guide_config::ConfigError;
use guide_interceptor::InterceptError;
use guide_telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    #[error(transparent)]
    Interceptor(#[from] InterceptError),

    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("Invalid listen address '{addr}': {reason}")]
    Addr { addr: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;
