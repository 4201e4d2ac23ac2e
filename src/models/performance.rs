//! 业绩周期模型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 业绩周期，展示顺序固定为声明顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowKey {
    #[serde(rename = "1D")]
    OneDay,
    #[serde(rename = "5D")]
    FiveDays,
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
}

impl WindowKey {
    /// 固定展示顺序
    pub const ORDER: [WindowKey; 7] = [
        WindowKey::OneDay,
        WindowKey::FiveDays,
        WindowKey::OneMonth,
        WindowKey::SixMonths,
        WindowKey::YearToDate,
        WindowKey::OneYear,
        WindowKey::FiveYears,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Self::OneDay => "1D",
            Self::FiveDays => "5D",
            Self::OneMonth => "1M",
            Self::SixMonths => "6M",
            Self::YearToDate => "YTD",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
        }
    }

    /// 徽章上的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneDay => "1日",
            Self::FiveDays => "5日",
            Self::OneMonth => "1个月",
            Self::SixMonths => "6个月",
            Self::YearToDate => "年初至今",
            Self::OneYear => "1年",
            Self::FiveYears => "5年",
        }
    }
}

impl fmt::Display for WindowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for WindowKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WindowKey::ORDER
            .iter()
            .copied()
            .find(|k| k.code() == s)
            .ok_or(())
    }
}

/// 单个周期的基准
///
/// `base_price` 在一次分析会话内不变；`initial_change_pct` 是分析服务给出的
/// 初始涨跌幅（已换算为百分比），只用于首次渲染
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceWindow {
    pub key: WindowKey,
    pub base_price: f64,
    pub initial_change_pct: Option<f64>,
}

impl PerformanceWindow {
    /// 以最新价计算涨跌幅（百分比）
    pub fn change_pct(&self, latest_price: f64) -> f64 {
        (latest_price / self.base_price - 1.0) * 100.0
    }
}
