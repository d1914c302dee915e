//! RouteGuide 客户端入口

use clap::Parser;
use guide_bootstrap::{build_interceptor_factory, connect_intercepted, init_runtime};
use guide_config::AppConfig;
use route_guide::FeatureDb;
use route_guide::client::run_demo;
use route_guide::proto::route_guide_client::RouteGuideClient;
use route_guide::proto::{METHOD_PATHS, method_inventory};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "route-guide-client", about = "RouteGuide demo client with call logging")]
struct Args {
    /// 服务端地址
    #[arg(long, default_value = "http://127.0.0.1:20202")]
    server: String,

    /// 地点数据库文件，用于生成 RecordRoute 的路线
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
    if let Some(db_path) = args.db_path {
        config.route_guide.db_path = db_path;
    }
    let _log_handle = init_runtime(&config)?;

    let db = FeatureDb::load(&config.route_guide.db_path)?;
    let factory =
        build_interceptor_factory(&config.interceptor, method_inventory(), METHOD_PATHS, None)?;
    let channel = connect_intercepted(&args.server, factory).await?;

    let mut client = RouteGuideClient::new(channel);
    run_demo(&mut client, &db).await?;

    info!("Demo finished");
    Ok(())
}
