//! 股票看板服务
//!
//! 作为分析服务的客户端：轮询实时价格、维护业绩基准、投影线图/K线图、渲染市场扫描推荐，
//! 并通过 RESTful API 输出视图模型

mod config;     // 配置
mod error;      // 错误定义
mod handlers;   // HTTP 请求处理器
mod middleware; // 中间件
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use actix_web::{web, App, HttpServer, middleware::Logger};
use env_logger::Env;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::middleware::ApiKeyMiddleware;
use crate::services::dashboard::Dashboard;
use crate::services::market_api::HttpMarketApi;

/// 应用程序入口
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, report) = AppConfig::load();

    // RUST_LOG 优先于配置文件中的日志级别
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    report.log();

    config.validate()?;

    if config.api.api_key.is_empty() {
        log::warn!("未设置 API_KEY，接口认证已关闭");
    }

    let api = HttpMarketApi::new(
        &config.upstream.base_url,
        config.request_timeout(),
        config.connect_timeout(),
    )?;
    let dashboard = web::Data::new(Dashboard::new(Arc::new(api), config.live.poll_settings()));

    log::info!(
        "启动股票看板服务 {}，分析服务 {}",
        config.bind_addr(),
        config.upstream.base_url
    );

    let api_key = config.api.api_key.clone();
    let app_data = dashboard.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .wrap(Logger::default())  // 添加请求日志中间件
            .wrap(ApiKeyMiddleware::new(api_key.clone()))  // API Key 认证
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(config.bind_addr())?.run().await?;

    dashboard.stop_live().await;
    log::info!("服务已停止");
    Ok(())
}
