use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use crate::models::{ApiResponse, ChartDisplayMode, ChartRange, SeriesRef};
use crate::services::dashboard::Dashboard;
use super::error_response;

#[derive(Debug, Deserialize)]
pub struct TooltipQuery {
    pub series: String,
    pub index: usize,
}

/// 看板快照
pub async fn get_dashboard(dashboard: web::Data<Dashboard>) -> Result<HttpResponse> {
    let view = dashboard.view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

/// 分析股票（输入代码或快捷按钮）
pub async fn analyze(
    dashboard: web::Data<Dashboard>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let symbol = path.into_inner();

    match dashboard.analyze(&symbol).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// 切换图表时间范围
pub async fn set_range(
    dashboard: web::Data<Dashboard>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let range = match path.into_inner().parse::<ChartRange>() {
        Ok(range) => range,
        Err(e) => return Ok(error_response(&e)),
    };

    match dashboard.set_range(range).await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// 切换图表显示模式
pub async fn set_mode(
    dashboard: web::Data<Dashboard>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    match path.into_inner().parse::<ChartDisplayMode>() {
        Ok(mode) => {
            let view = dashboard.set_chart_mode(mode).await;
            Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
        }
        Err(e) => Ok(error_response(&e)),
    }
}

/// 实时价格与业绩条
pub async fn get_live(dashboard: web::Data<Dashboard>) -> Result<HttpResponse> {
    let view = dashboard.live_view().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

/// 停止实时轮询
pub async fn stop_live(dashboard: web::Data<Dashboard>) -> Result<HttpResponse> {
    let stopped = dashboard.stop_live().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(stopped)))
}

/// 图表提示框
pub async fn get_tooltip(
    dashboard: web::Data<Dashboard>,
    query: web::Query<TooltipQuery>,
) -> Result<HttpResponse> {
    let series = match query.series.parse::<SeriesRef>() {
        Ok(series) => series,
        Err(e) => return Ok(error_response(&e)),
    };

    match dashboard.tooltip(series, query.index).await {
        Ok(tooltip) => Ok(HttpResponse::Ok().json(ApiResponse::success(tooltip))),
        Err(e) => Ok(error_response(&e)),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("", web::get().to(get_dashboard))
            .route("/analyze/{symbol}", web::post().to(analyze))
            .route("/range/{range}", web::post().to(set_range))
            .route("/mode/{mode}", web::post().to(set_mode))
            .route("/live", web::get().to(get_live))
            .route("/live/stop", web::post().to(stop_live))
            .route("/chart/tooltip", web::get().to(get_tooltip))
    );
}
