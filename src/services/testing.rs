//! 测试用的内存数据源
//!
//! 记录每一次调用，按股票返回预设的价格/分析结果，可为分析请求设置延迟

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::models::{AnalysisResponse, ChartRange, PriceQuote, ScanResult};
use super::market_api::{decode_payload, MarketApi};

#[derive(Default)]
pub struct FakeMarketApi {
    price_queue: Mutex<HashMap<String, VecDeque<Result<f64>>>>,
    steady_price: Mutex<HashMap<String, f64>>,
    analyses: Mutex<HashMap<String, Value>>,
    analyze_delays: Mutex<HashMap<String, Duration>>,
    scan: Mutex<Option<Value>>,
    calls: Mutex<Vec<String>>,
}

fn range_key(range: Option<ChartRange>) -> &'static str {
    range.map(|r| r.as_query()).unwrap_or("-")
}

impl FakeMarketApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// 队列为空后一直返回的价格
    pub fn set_price(&self, symbol: &str, price: f64) {
        self.steady_price.lock().unwrap().insert(symbol.to_string(), price);
    }

    /// 依次返回的价格结果，优先于固定价格
    pub fn push_price(&self, symbol: &str, result: Result<f64>) {
        self.price_queue
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .push_back(result);
    }

    /// 分析接口返回的原始 JSON，可带 `error` 字段
    pub fn set_analysis(&self, symbol: &str, payload: Value) {
        self.analyses.lock().unwrap().insert(symbol.to_string(), payload);
    }

    pub fn set_analyze_delay(&self, symbol: &str, range: Option<ChartRange>, delay: Duration) {
        self.analyze_delays
            .lock()
            .unwrap()
            .insert(format!("{}:{}", symbol, range_key(range)), delay);
    }

    pub fn set_scan(&self, payload: Value) {
        *self.scan.lock().unwrap() = Some(payload);
    }

    /// 以 `prefix` 开头的调用次数，如 "price:AAPL"、"analyze:"
    pub fn calls(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MarketApi for FakeMarketApi {
    async fn analyze(&self, symbol: &str, range: Option<ChartRange>) -> Result<AnalysisResponse> {
        let key = format!("{}:{}", symbol, range_key(range));
        self.record(format!("analyze:{}", key));

        let delay = self.analyze_delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let payload = self.analyses.lock().unwrap().get(symbol).cloned();
        match payload {
            Some(value) => decode_payload(value),
            None => Err(DashboardError::Transport("connection refused".to_string())),
        }
    }

    async fn price(&self, symbol: &str) -> Result<PriceQuote> {
        self.record(format!("price:{}", symbol));

        let queued = self
            .price_queue
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(VecDeque::pop_front);
        let result = match queued {
            Some(result) => result,
            None => self
                .steady_price
                .lock()
                .unwrap()
                .get(symbol)
                .copied()
                .ok_or_else(|| DashboardError::Transport("connection refused".to_string())),
        };

        result.map(|price| PriceQuote {
            symbol: Some(symbol.to_string()),
            price: Some(price),
            ..Default::default()
        })
    }

    async fn recommendations(&self) -> Result<ScanResult> {
        self.record("recommendations".to_string());
        let payload = self.scan.lock().unwrap().clone();
        match payload {
            Some(value) => decode_payload(value),
            None => Err(DashboardError::Transport("connection refused".to_string())),
        }
    }
}
