use actix_web::{web, HttpResponse, Result};

use crate::models::ApiResponse;
use crate::services::dashboard::Dashboard;
use super::error_response;

/// 执行市场扫描
pub async fn scan(dashboard: web::Data<Dashboard>) -> Result<HttpResponse> {
    match dashboard.load_recommendations().await {
        Ok(view) => Ok(HttpResponse::Ok().json(ApiResponse::success(view))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// 最近一次扫描结果，尚未扫描时 data 为 null
pub async fn latest(dashboard: web::Data<Dashboard>) -> Result<HttpResponse> {
    let view = dashboard.recommendations().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/recommendations")
            .route("", web::get().to(latest))
            .route("/scan", web::post().to(scan))
    );
}
