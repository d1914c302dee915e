//! guide-config - 配置加载库
//!
//! 加载顺序：`default.toml` -> `<APP_ENV>.toml` -> `APP_` 前缀环境变量，
//! 嵌套字段用 `__` 分隔，例如 `APP_SERVER__PORT=20202`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    20202
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 设置后在该端口暴露 Prometheus 指标
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

/// 回退反序列化失败时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionFailureMode {
    /// 记录错误后终止进程
    #[default]
    Abort,
    /// 输出失败标记，调用继续
    Mark,
}

/// 日志拦截器配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterceptorConfig {
    #[serde(default)]
    pub extraction_failure: ExtractionFailureMode,
    #[serde(default)]
    pub pretty_json: bool,
}

/// RouteGuide 业务配置
#[derive(Debug, Clone, Deserialize)]
pub struct RouteGuideConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    "data/route_guide_db.json".to_string()
}

impl Default for RouteGuideConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub interceptor: InterceptorConfig,
    #[serde(default)]
    pub route_guide: RouteGuideConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_dir).extract()?;
        Ok(config)
    }

    /// 重新读取日志级别，供运行期信号触发的热更新使用
    pub fn reload_log_level(config_dir: &str) -> Result<String, ConfigError> {
        let level: String = Self::figment(config_dir)
            .extract_inner("telemetry.log_level")
            .or_else(|e| {
                if e.missing() {
                    Ok(default_log_level())
                } else {
                    Err(e)
                }
            })?;
        Ok(level)
    }

    fn figment(config_dir: &str) -> Figment {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Figment::from(Serialized::default("app_name", "route-guide"))
            .merge(Serialized::default("app_env", &env))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__").ignore(&["env"]))
    }

    /// 监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
