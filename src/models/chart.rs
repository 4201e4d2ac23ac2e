//! 图表数据模型
//!
//! 线图和K线图共用同一份 `ChartSeries`，切换显示模式只重新投影，不重新请求

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::lenient;
use crate::error::DashboardError;

/// 图表显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartDisplayMode {
    #[default]
    Line,
    Candle,
}

impl ChartDisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Candle => "candle",
        }
    }
}

impl FromStr for ChartDisplayMode {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(Self::Line),
            "candle" | "candles" | "candlestick" => Ok(Self::Candle),
            other => Err(DashboardError::InvalidMode(other.to_string())),
        }
    }
}

/// 图表时间范围，对应分析接口的 `range` 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartRange {
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "5y")]
    FiveYears,
}

impl ChartRange {
    pub fn as_query(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::ThreeMonths => "3mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::FiveYears => "5y",
        }
    }
}

impl fmt::Display for ChartRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

impl FromStr for ChartRange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1mo" | "1m" => Ok(Self::OneMonth),
            "3mo" | "3m" => Ok(Self::ThreeMonths),
            "6mo" | "6m" => Ok(Self::SixMonths),
            "1y" => Ok(Self::OneYear),
            "5y" => Ok(Self::FiveYears),
            other => Err(DashboardError::InvalidRange(other.to_string())),
        }
    }
}

/// 单根K线
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candle {
    pub t: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// 图表序列
///
/// `prices`、`sma20`、`sma50` 与 `dates` 按下标对齐，`None` 表示该位置不画点
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub prices: Vec<Option<f64>>,
    pub sma20: Option<Vec<Option<f64>>>,
    pub sma50: Option<Vec<Option<f64>>>,
    pub candles: Vec<Candle>,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.candles.is_empty()
    }
}

// ==================== 接口原始格式 ====================

#[derive(Debug, Clone, Deserialize)]
pub struct RawCandle {
    #[serde(default, alias = "time", alias = "date")]
    pub t: String,
    #[serde(default, alias = "open", deserialize_with = "lenient::opt_f64")]
    pub o: Option<f64>,
    #[serde(default, alias = "high", deserialize_with = "lenient::opt_f64")]
    pub h: Option<f64>,
    #[serde(default, alias = "low", deserialize_with = "lenient::opt_f64")]
    pub l: Option<f64>,
    #[serde(default, alias = "close", deserialize_with = "lenient::opt_f64")]
    pub c: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawChartSeries {
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default, deserialize_with = "lenient::vec_opt_f64")]
    pub prices: Vec<Option<f64>>,
    #[serde(default, alias = "sma20", deserialize_with = "lenient::vec_opt_f64")]
    pub sma_20: Vec<Option<f64>>,
    #[serde(default, alias = "sma50", deserialize_with = "lenient::vec_opt_f64")]
    pub sma_50: Vec<Option<f64>>,
    #[serde(default)]
    pub candles: Vec<RawCandle>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub support: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub resistance: Option<f64>,
}

/// 旧版接口的收盘价点位 `{time, value}`
#[derive(Debug, Clone, Deserialize)]
pub struct ChartPoint {
    #[serde(default, alias = "date")]
    pub time: String,
    #[serde(default, alias = "price", deserialize_with = "lenient::opt_f64")]
    pub value: Option<f64>,
}

/// `chart_data` 字段，兼容完整序列和旧版点位列表两种格式
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ChartPayload {
    Points(Vec<ChartPoint>),
    Series(RawChartSeries),
}

impl From<ChartPayload> for ChartSeries {
    fn from(payload: ChartPayload) -> Self {
        match payload {
            ChartPayload::Series(raw) => from_raw_series(raw),
            ChartPayload::Points(points) => ChartSeries {
                dates: points.iter().map(|p| normalize_date(&p.time)).collect(),
                prices: points.iter().map(|p| p.value).collect(),
                ..Default::default()
            },
        }
    }
}

fn from_raw_series(raw: RawChartSeries) -> ChartSeries {
    // 价格与日期长度不一致时截断到公共长度
    let len = raw.dates.len().min(raw.prices.len());
    let dates: Vec<String> = raw.dates.iter().take(len).map(|d| normalize_date(d)).collect();
    let prices = raw.prices.into_iter().take(len).collect();

    let candles = raw
        .candles
        .into_iter()
        .filter_map(|c| {
            Some(Candle {
                t: normalize_date(&c.t),
                open: c.o?,
                high: c.h?,
                low: c.l?,
                close: c.c?,
            })
        })
        .collect();

    ChartSeries {
        sma20: align_overlay(raw.sma_20, len),
        sma50: align_overlay(raw.sma_50, len),
        dates,
        prices,
        candles,
        support: raw.support,
        resistance: raw.resistance,
    }
}

/// 均线按下标与日期对齐，不足补空位；全为空则视为没有该均线
fn align_overlay(mut values: Vec<Option<f64>>, len: usize) -> Option<Vec<Option<f64>>> {
    values.resize(len, None);
    if values.iter().any(Option::is_some) {
        Some(values)
    } else {
        None
    }
}

/// 统一日期标签为 YYYY-MM-DD，无法识别的保留原文
pub fn normalize_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.date().format("%Y-%m-%d").to_string();
        }
    }
    raw.to_string()
}
