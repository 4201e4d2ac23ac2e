//! 分析服务客户端
//!
//! 对接后端分析服务的三个接口：
//! - GET /api/analyze/{symbol}[?range=R] - 完整分析
//! - GET /api/price/{symbol} - 实时价格（轮询）
//! - GET /api/recommendations - 市场扫描
//!
//! 任何响应只要带有 `error` 字段即视为业务错误

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::{DashboardError, Result};
use crate::models::{AnalysisResponse, ChartRange, PriceQuote, ScanResult};

/// 数据获取层
///
/// 轮询器和看板只依赖这个 trait，测试中可替换为内存实现
#[async_trait]
pub trait MarketApi: Send + Sync {
    /// 完整分析
    async fn analyze(&self, symbol: &str, range: Option<ChartRange>) -> Result<AnalysisResponse>;

    /// 最新价格
    async fn price(&self, symbol: &str) -> Result<PriceQuote>;

    /// 市场扫描
    async fn recommendations(&self) -> Result<ScanResult>;
}

/// 基于 reqwest 的 HTTP 实现
pub struct HttpMarketApi {
    client: Client,
    base_url: Url,
}

impl HttpMarketApi {
    pub fn new(base_url: &str, timeout: Duration, connect_timeout: Duration) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("分析服务地址不能作为基础地址: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// 在基础地址后追加路径段，路径段会被正确转义
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DashboardError::Transport(format!("无效的服务地址: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        log::debug!("📡 请求分析服务 URL: {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        // 分析服务在 404/500 时同样返回 {"error": ...}，先按 JSON 解析再看状态码
        let value: Value = match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) if status.is_success() => return Err(DashboardError::Parse(e.to_string())),
            Err(_) => {
                return Err(DashboardError::Transport(format!("分析服务返回状态 {}", status)))
            }
        };

        decode_payload(value)
    }
}

#[async_trait]
impl MarketApi for HttpMarketApi {
    async fn analyze(&self, symbol: &str, range: Option<ChartRange>) -> Result<AnalysisResponse> {
        let mut url = self.endpoint(&["analyze", symbol])?;
        if let Some(range) = range {
            url.query_pairs_mut().append_pair("range", range.as_query());
        }
        self.get_json(url).await
    }

    async fn price(&self, symbol: &str) -> Result<PriceQuote> {
        let url = self.endpoint(&["price", symbol])?;
        self.get_json(url).await
    }

    async fn recommendations(&self) -> Result<ScanResult> {
        let url = self.endpoint(&["recommendations"])?;
        self.get_json(url).await
    }
}

/// 检查 `error` 字段后再反序列化
pub fn decode_payload<T: DeserializeOwned>(value: Value) -> Result<T> {
    if let Some(err) = value.get("error").filter(|e| !e.is_null()) {
        let message = err
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(DashboardError::Business(message));
    }
    Ok(serde_json::from_value(value)?)
}
