pub mod dashboard;
pub mod health;
pub mod recommendations;

use actix_web::{web, HttpResponse};

use crate::error::{DashboardError, ErrorKind};
use crate::models::ApiResponse;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(health::config)
            .configure(dashboard::config)
            .configure(recommendations::config)
    );
}

/// 错误转换为统一响应
///
/// 用户输入错误 400，业务错误 404，网络/解析失败 502；详细原因只写日志
pub fn error_response(err: &DashboardError) -> HttpResponse {
    let body = ApiResponse::<()>::error(err.user_message());
    match err.kind() {
        ErrorKind::UserInput => HttpResponse::BadRequest().json(body),
        ErrorKind::Business => HttpResponse::NotFound().json(body),
        ErrorKind::Transport => {
            log::error!("分析服务请求失败: {}", err);
            HttpResponse::BadGateway().json(body)
        }
    }
}
