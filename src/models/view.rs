//! 视图模型
//!
//! 由 services 中的纯函数生成，handlers 只负责序列化输出

use serde::Serialize;
use std::str::FromStr;

use super::chart::{ChartDisplayMode, ChartRange};
use super::performance::WindowKey;
use crate::error::DashboardError;

/// 涨跌方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// 符号与样式只由 `value >= 0` 决定
    pub fn of(value: f64) -> Self {
        if value >= 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

// ==================== 业绩条 ====================

/// 业绩徽章
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceBadge {
    pub key: WindowKey,
    pub label: String,
    pub value: f64,
    /// 如 "+1.23%"
    pub text: String,
    pub direction: Direction,
    /// perf-up / perf-down
    pub class: String,
}

// ==================== 实时价格 ====================

#[derive(Debug, Clone, Default, Serialize)]
pub struct LiveView {
    pub symbol: Option<String>,
    pub price: Option<f64>,
    pub price_text: String,
    /// 价格变动时的短暂高亮
    pub highlight: Option<Direction>,
    /// LIVE 指示灯
    pub live: bool,
    pub performance: Vec<PerformanceBadge>,
    pub ticks: u64,
    pub consecutive_failures: u32,
    pub last_tick_at: Option<String>,
    pub notice: Option<String>,
}

// ==================== 图表 ====================

/// 图表中的序列标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesRef {
    Price,
    Sma20,
    Sma50,
    Wick,
    Body,
    Support,
    Resistance,
}

impl FromStr for SeriesRef {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" => Ok(Self::Price),
            "sma20" | "sma_20" => Ok(Self::Sma20),
            "sma50" | "sma_50" => Ok(Self::Sma50),
            "wick" => Ok(Self::Wick),
            "body" => Ok(Self::Body),
            "support" => Ok(Self::Support),
            "resistance" => Ok(Self::Resistance),
            other => Err(DashboardError::InvalidSeries(other.to_string())),
        }
    }
}

/// 连续线序列
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeriesView {
    pub id: SeriesRef,
    pub name: String,
    pub color: String,
    /// 虚线样式 [实线长度, 间隔]，None 为实线
    pub dash: Option<[u8; 2]>,
    pub fill: bool,
    pub points: Vec<Option<f64>>,
}

/// 影线 [low, high]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WickBar {
    pub low: f64,
    pub high: f64,
}

/// 实体 [open, close]，保留高低价供提示框使用
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyBar {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub direction: Direction,
    pub color: String,
}

/// 支撑/阻力水平线
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub id: SeriesRef,
    pub name: String,
    pub color: String,
    pub value: f64,
    pub points: Vec<f64>,
}

/// 图表投影结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartView {
    Line {
        labels: Vec<String>,
        price: LineSeriesView,
        overlays: Vec<LineSeriesView>,
        reference_lines: Vec<ReferenceLine>,
    },
    Candle {
        labels: Vec<String>,
        wicks: Vec<WickBar>,
        bodies: Vec<BodyBar>,
        overlays: Vec<LineSeriesView>,
        reference_lines: Vec<ReferenceLine>,
    },
}

/// 已渲染的图表实例，每次重绘都会整体替换
#[derive(Debug, Clone, Serialize)]
pub struct RenderedChart {
    pub instance: u64,
    pub symbol: String,
    pub mode: ChartDisplayMode,
    pub range: Option<ChartRange>,
    pub view: ChartView,
}

/// 提示框内容
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tooltip {
    Value {
        series: String,
        label: String,
        value: f64,
    },
    Ohlc {
        label: String,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
    },
}

// ==================== 推荐卡片 ====================

/// 建议徽章样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BadgeClass {
    #[serde(rename = "badge-strong-buy")]
    StrongBuy,
    #[serde(rename = "badge-buy")]
    Buy,
    #[serde(rename = "badge-strong-sell")]
    StrongSell,
    #[serde(rename = "badge-sell")]
    Sell,
    #[serde(rename = "badge-hold")]
    Hold,
}

/// 风险样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskClass {
    Low,
    Moderate,
    High,
}

/// 卡片类型，决定取哪个建议字段以及卡片样式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Short,
    Long,
    Momentum,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationCardView {
    pub symbol: String,
    pub name: String,
    pub price_text: String,
    pub recommendation: String,
    pub badge: BadgeClass,
    pub trend: String,
    pub risk_text: String,
    pub risk: RiskClass,
    pub score: f64,
    pub score_text: String,
    /// 评分条填充百分比 [0, 100]
    pub score_fill: f64,
    pub card_type: CardType,
    pub css_class: String,
    /// 点击卡片后分析该股票
    pub analyze_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Hot,
    Safe,
    Best,
    Stable,
    Momentum,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub kind: CategoryKind,
    pub heading: String,
    pub cards: Vec<RecommendationCardView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    ShortTerm,
    LongTerm,
    Momentum,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSection {
    pub horizon: Horizon,
    pub title: String,
    pub categories: Vec<CategoryView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanView {
    pub summary: String,
    pub market_scanned: Option<u32>,
    pub total_analyzed: Option<u32>,
    pub sections: Vec<ScanSection>,
}

// ==================== 静态概览 ====================

#[derive(Debug, Clone, Serialize)]
pub struct RecBadgeView {
    pub text: String,
    pub badge: BadgeClass,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskView {
    pub level: String,
    pub class: RiskClass,
    pub volatility: String,
    pub beta: String,
    pub score: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceView {
    pub price_text: String,
    pub change_text: String,
    pub change_direction: Direction,
    pub change_30d_text: String,
    pub change_30d_direction: Direction,
    pub high_52w: String,
    pub low_52w: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyView {
    pub label: String,
    /// badge-warning / badge-success / badge-neutral
    pub class: String,
    pub narrative_html: String,
    pub volatility_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsItemView {
    pub publisher: String,
    pub published: String,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverviewView {
    pub symbol: String,
    pub name: String,
    pub short_term: RecBadgeView,
    pub short_term_confidence: String,
    pub long_term: RecBadgeView,
    pub risk: RiskView,
    pub trend: String,
    pub momentum: String,
    pub pe_rating: String,
    pub market_cap: String,
    pub beta: String,
    pub price: PriceView,
    pub strategy: Option<StrategyView>,
    pub analysis_html: Option<String>,
    pub news: Vec<NewsItemView>,
    pub news_placeholder: Option<String>,
}

// ==================== 看板 ====================

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub symbol: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub overview: Option<OverviewView>,
    pub live: LiveView,
    pub chart_mode: ChartDisplayMode,
    pub chart_range: Option<ChartRange>,
    pub chart: Option<RenderedChart>,
    pub recommendations: Option<ScanView>,
}
