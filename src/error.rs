//! 错误定义
//!
//! 按来源划分为三类：用户输入错误、分析服务返回的业务错误、网络/解析失败

use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 用户输入错误，不发起请求
    UserInput,
    /// 分析服务在响应中返回 `error` 字段
    Business,
    /// 网络异常或响应无法解析
    Transport,
}

/// 看板错误
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    #[error("请输入股票代码")]
    EmptySymbol,

    #[error("无效的股票代码: {0}")]
    InvalidSymbol(String),

    #[error("未知的图表模式: {0}")]
    InvalidMode(String),

    #[error("未知的时间范围: {0}")]
    InvalidRange(String),

    #[error("未知的图表序列: {0}")]
    InvalidSeries(String),

    #[error("尚未分析任何股票")]
    NoActiveSymbol,

    #[error("{0}")]
    Business(String),

    #[error("连接分析服务失败: {0}")]
    Transport(String),

    #[error("解析响应数据失败: {0}")]
    Parse(String),
}

/// 网络类错误对用户展示的统一提示
pub const CONNECTIVITY_MESSAGE: &str = "连接分析服务失败，请确认服务已启动";

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySymbol
            | Self::InvalidSymbol(_)
            | Self::InvalidMode(_)
            | Self::InvalidRange(_)
            | Self::InvalidSeries(_)
            | Self::NoActiveSymbol => ErrorKind::UserInput,
            Self::Business(_) => ErrorKind::Business,
            Self::Transport(_) | Self::Parse(_) => ErrorKind::Transport,
        }
    }

    /// 可以展示给用户的信息
    ///
    /// 网络和解析失败的具体原因只记录日志，对外统一返回连接提示
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Transport => CONNECTIVITY_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            DashboardError::Parse(err.to_string())
        } else {
            DashboardError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
