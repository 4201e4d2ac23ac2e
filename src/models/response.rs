//! 通用 API 响应模型
//!
//! 定义统一的 API 响应格式

use chrono::Utc;
use chrono_tz::America::New_York;
use serde::{Deserialize, Serialize};

/// 获取美东时间字符串（ISO 8601 格式，带时区偏移）
pub fn market_time_now() -> String {
    Utc::now().with_timezone(&New_York).to_rfc3339()
}

/// 统一 API 响应结构
///
/// - success: 请求是否成功
/// - data: 响应数据（成功时有值）
/// - message: 响应消息
/// - timestamp: 响应时间戳（美东时间）
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: String,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
            timestamp: market_time_now(),
        }
    }

    /// 创建错误响应
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
            timestamp: market_time_now(),
        }
    }
}
