//! guide-bootstrap - 统一服务启动骨架
//!
//! 服务端与客户端共用的启动逻辑：运行时初始化、拦截器装配、监听与连接

mod connect;
mod error;
mod interceptor;
mod runtime;
mod starter;

pub use connect::*;
pub use error::*;
pub use interceptor::*;
pub use runtime::*;
pub use starter::*;
