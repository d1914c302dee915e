//! RouteGuide 服务入口

use clap::Parser;
use guide_bootstrap::{bind, build_interceptor_factory, init_runtime, serve, shutdown_signal};
use guide_config::AppConfig;
use route_guide::proto::route_guide_server::RouteGuideServer;
use route_guide::proto::{METHOD_PATHS, method_inventory};
use route_guide::{FeatureDb, RouteGuideService};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "route-guide", about = "RouteGuide gRPC server with call logging")]
struct Args {
    /// 监听端口，覆盖配置文件
    #[arg(long)]
    port: Option<u16>,

    /// 地点数据库文件，覆盖配置文件
    #[arg(long)]
    db_path: Option<String>,

    /// 配置目录
    #[arg(long, default_value = "config")]
    config_dir: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load(&args.config_dir)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(db_path) = args.db_path {
        config.route_guide.db_path = db_path;
    }

    let log_handle = init_runtime(&config)?;
    #[cfg(unix)]
    guide_bootstrap::spawn_log_level_reloader(log_handle, args.config_dir.clone());
    #[cfg(not(unix))]
    drop(log_handle);

    let db = FeatureDb::load(&config.route_guide.db_path)?;
    info!(
        path = %config.route_guide.db_path,
        features = db.len(),
        "Feature database loaded"
    );

    let factory =
        build_interceptor_factory(&config.interceptor, method_inventory(), METHOD_PATHS, None)?;
    let listener = bind(&config.server_addr()).await?;

    serve(
        RouteGuideServer::new(RouteGuideService::new(db)),
        factory,
        listener,
        shutdown_signal(),
    )
    .await?;

    Ok(())
}
