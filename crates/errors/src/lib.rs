//! guide-errors - 统一错误处理
//!
//! 业务服务与启动骨架共用的错误类型，可直接转换为 gRPC Status

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// 转换为 gRPC 状态码
    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::NotFound(_) => tonic::Code::NotFound,
            Self::Validation(_) => tonic::Code::InvalidArgument,
            Self::Internal(_) => tonic::Code::Internal,
            Self::Config(_) => tonic::Code::FailedPrecondition,
            Self::Unavailable(_) => tonic::Code::Unavailable,
        }
    }

    /// 不带前缀的错误描述，作为 gRPC status message 返回给调用方
    pub fn detail(&self) -> &str {
        match self {
            Self::NotFound(msg)
            | Self::Validation(msg)
            | Self::Internal(msg)
            | Self::Config(msg)
            | Self::Unavailable(msg) => msg,
        }
    }
}

impl From<AppError> for tonic::Status {
    fn from(err: AppError) -> Self {
        tonic::Status::new(err.grpc_code(), err.detail().to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grpc_code_mapping() {
        assert_eq!(AppError::not_found("x").grpc_code(), tonic::Code::NotFound);
        assert_eq!(
            AppError::validation("x").grpc_code(),
            tonic::Code::InvalidArgument
        );
        assert_eq!(AppError::internal("x").grpc_code(), tonic::Code::Internal);
        assert_eq!(
            AppError::config("x").grpc_code(),
            tonic::Code::FailedPrecondition
        );
        assert_eq!(
            AppError::unavailable("x").grpc_code(),
            tonic::Code::Unavailable
        );
    }

    #[test]
    fn test_status_carries_detail_only() {
        let status: tonic::Status = AppError::validation("latitude out of range").into();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
        assert_eq!(status.message(), "latitude out of range");
    }

    #[test]
    fn test_display_has_category_prefix() {
        let err = AppError::not_found("feature db");
        assert_eq!(err.to_string(), "Not found: feature db");
    }
}
