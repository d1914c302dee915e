//! route-guide - 带调用日志拦截的 RouteGuide 服务
//!
//! 服务端与客户端都安装了日志拦截器，每个调用的元数据、消息和状态
//! 都会以结构化记录输出

pub mod client;
pub mod db;
pub mod geo;
pub mod proto;
pub mod service;

pub use db::FeatureDb;
pub use service::RouteGuideService;
