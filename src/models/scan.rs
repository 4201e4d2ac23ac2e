//! 市场扫描数据模型
//!
//! 对应 `GET /api/recommendations` 的响应

use serde::Deserialize;

use super::lenient;

/// 单只被扫描的股票
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScannedStock {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub score: f64,
    #[serde(default)]
    pub trend: String,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub risk: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub short_term: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub long_term: Option<String>,
}

/// 短线分组
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShortTermPicks {
    #[serde(default)]
    pub hot_picks: Vec<ScannedStock>,
    #[serde(default)]
    pub safe_picks: Vec<ScannedStock>,
}

/// 长线分组
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LongTermPicks {
    #[serde(default)]
    pub best_picks: Vec<ScannedStock>,
    #[serde(default)]
    pub stable_picks: Vec<ScannedStock>,
}

/// 扫描结果
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub short_term: ShortTermPicks,
    #[serde(default)]
    pub long_term: LongTermPicks,
    #[serde(default)]
    pub high_momentum: Option<Vec<ScannedStock>>,
    #[serde(default)]
    pub market_scanned: Option<u32>,
    #[serde(default)]
    pub total_analyzed: Option<u32>,
}
