//! 分析接口数据模型
//!
//! 对应 `GET /api/analyze/{symbol}` 和 `GET /api/price/{symbol}` 的响应。
//! 除 `error` 外的各部分都可能缺失，缺失时取默认值

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::chart::ChartPayload;
use super::lenient;

/// 综合建议
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationSummary {
    #[serde(default)]
    pub symbol: String,
    #[serde(default, alias = "name")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub short_term: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub long_term: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub short_term_confidence: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default, alias = "detailed_analysis_he")]
    pub detailed_analysis: Option<String>,
}

/// 风险评估
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RiskSummary {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub volatility: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub beta: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub score: Option<String>,
}

/// 技术面摘要
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TechnicalSummary {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub trend: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub momentum: Option<String>,
}

/// 基本面摘要
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FundamentalSummary {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub pe_rating: Option<String>,
}

/// 公司概况
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyOverview {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub beta: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub high_52w: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub low_52w: Option<f64>,
}

/// 价格数据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceData {
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub current_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change_30d: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub high_52w: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub low_52w: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub volume: Option<f64>,
}

/// 投资策略
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvestmentStrategy {
    #[serde(default)]
    pub strategy: String,
    #[serde(default, alias = "recommendation_he")]
    pub narrative: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub volatility: Option<f64>,
}

/// 新闻条目
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub published: Option<String>,
}

/// 完整分析结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub recommendation: RecommendationSummary,
    #[serde(default)]
    pub risk: RiskSummary,
    #[serde(default)]
    pub technical: TechnicalSummary,
    #[serde(default)]
    pub fundamental: FundamentalSummary,
    #[serde(default)]
    pub overview: CompanyOverview,
    #[serde(default)]
    pub price_data: PriceData,
    /// 周期 -> {base, change}，逐项宽松解析，格式不对的条目直接跳过
    #[serde(default)]
    pub performance: HashMap<String, Value>,
    #[serde(default)]
    pub investment_strategy: Option<InvestmentStrategy>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
    #[serde(default)]
    pub chart_data: Option<ChartPayload>,
}

/// 实时价格
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change_percent: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
