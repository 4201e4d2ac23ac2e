//! 看板编排
//!
//! 用户操作（输入代码、切换范围、切换模式、扫描市场）都从这里进入：
//! 发起一次性请求，成功后重置基准表、渲染静态区块、替换图表序列并重新绑定轮询器。
//!
//! 一次性请求用单调递增的请求代号丢弃过期响应：
//! - 分析请求同时递增分析代号和图表代号，范围切换只递增图表代号
//! - 分析结果仅在分析代号仍是最新时应用；其中的图表在图表代号仍是最新、
//!   或当前图表属于其他股票时应用
//! - 范围切换的结果仅在图表代号仍是最新且股票未变时应用
//!
//! 锁顺序固定为 state -> poller -> live

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

use crate::error::{DashboardError, Result};
use crate::models::{
    AnalysisResponse, ChartDisplayMode, ChartRange, ChartSeries, DashboardView, LiveView,
    OverviewView, ScanView, SeriesRef, Tooltip,
};
use super::chart::ChartState;
use super::live::{LiveState, SharedLiveState};
use super::market_api::MarketApi;
use super::overview::render_overview;
use super::poller::{PollSettings, QuotePoller};
use super::recommendation::render_scan;

const MAX_SYMBOL_LEN: usize = 15;

/// 规范化用户输入的股票代码：去空白、转大写并校验字符
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(DashboardError::EmptySymbol);
    }

    let valid_chars = symbol
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));
    if !valid_chars || symbol.len() > MAX_SYMBOL_LEN {
        return Err(DashboardError::InvalidSymbol(symbol));
    }

    Ok(symbol)
}

#[derive(Debug, Default)]
struct DashboardState {
    symbol: Option<String>,
    overview: Option<OverviewView>,
    chart: ChartState,
    error: Option<String>,
    loading: u32,
    recommendations: Option<ScanView>,
}

impl DashboardState {
    fn begin_loading(&mut self) {
        self.loading += 1;
    }

    fn end_loading(&mut self) {
        self.loading = self.loading.saturating_sub(1);
    }
}

fn chart_series(data: &mut AnalysisResponse) -> ChartSeries {
    data.chart_data.take().map(ChartSeries::from).unwrap_or_default()
}

/// 看板
pub struct Dashboard {
    api: Arc<dyn MarketApi>,
    live: SharedLiveState,
    poller: Mutex<QuotePoller>,
    state: RwLock<DashboardState>,
    analysis_seq: AtomicU64,
    chart_seq: AtomicU64,
}

impl Dashboard {
    pub fn new(api: Arc<dyn MarketApi>, settings: PollSettings) -> Self {
        let live = LiveState::shared();
        let poller = QuotePoller::new(api.clone(), live.clone(), settings);
        Self {
            api,
            live,
            poller: Mutex::new(poller),
            state: RwLock::new(DashboardState::default()),
            analysis_seq: AtomicU64::new(0),
            chart_seq: AtomicU64::new(0),
        }
    }

    /// 分析一只股票
    ///
    /// 失败时看板保持原状，只记录错误信息
    pub async fn analyze(&self, raw_symbol: &str) -> Result<DashboardView> {
        let symbol = match normalize_symbol(raw_symbol) {
            Ok(symbol) => symbol,
            Err(e) => {
                self.state.write().await.error = Some(e.user_message());
                return Err(e);
            }
        };

        let analysis_gen = self.analysis_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let chart_gen = self.chart_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let range = {
            let mut state = self.state.write().await;
            state.begin_loading();
            state.error = None;
            state.chart.range()
        };

        log::info!("🔍 开始分析 {} (范围 {:?})", symbol, range);
        let result = self.api.analyze(&symbol, range).await;

        let mut state = self.state.write().await;
        state.end_loading();

        let is_latest = analysis_gen == self.analysis_seq.load(Ordering::SeqCst);
        let mut data = match result {
            Ok(data) => data,
            Err(e) => {
                log::error!("❌ 分析 {} 失败: {}", symbol, e);
                if is_latest {
                    state.error = Some(e.user_message());
                }
                return Err(e);
            }
        };

        if !is_latest {
            log::info!("⏭️ 丢弃过期的分析结果: {}", symbol);
            return Ok(self.snapshot(&state).await);
        }

        state.overview = Some(render_overview(&data, &symbol));
        state.symbol = Some(symbol.clone());

        let chart_is_latest = chart_gen == self.chart_seq.load(Ordering::SeqCst);
        if chart_is_latest || state.chart.symbol() != Some(symbol.as_str()) {
            let series = chart_series(&mut data);
            state.chart.replace_series(&symbol, range, series);
        } else {
            log::info!("⏭️ 保留更新的范围切换结果: {}", symbol);
        }

        self.live.write().await.reset_session(
            &symbol,
            data.price_data.current_price,
            &data.performance,
        );
        self.poller.lock().await.start(&symbol).await;

        log::info!("✅ {} 分析完成", symbol);
        Ok(self.snapshot(&state).await)
    }

    /// 切换时间范围，重新请求并整体替换图表序列
    pub async fn set_range(&self, range: ChartRange) -> Result<DashboardView> {
        let symbol = {
            let mut state = self.state.write().await;
            let Some(symbol) = state.symbol.clone() else {
                return Err(DashboardError::NoActiveSymbol);
            };
            state.chart.select_range(Some(range));
            state.begin_loading();
            symbol
        };
        let chart_gen = self.chart_seq.fetch_add(1, Ordering::SeqCst) + 1;

        log::info!("📅 {} 切换时间范围: {}", symbol, range);
        let result = self.api.analyze(&symbol, Some(range)).await;

        let mut state = self.state.write().await;
        state.end_loading();

        let is_latest = chart_gen == self.chart_seq.load(Ordering::SeqCst)
            && state.symbol.as_deref() == Some(symbol.as_str());

        match result {
            Ok(mut data) if is_latest => {
                let series = chart_series(&mut data);
                state.chart.replace_series(&symbol, Some(range), series);
                state.error = None;
            }
            Ok(_) => {
                log::info!("⏭️ 丢弃过期的图表数据: {} {}", symbol, range);
            }
            Err(e) => {
                log::error!("❌ {} 获取 {} 图表数据失败: {}", symbol, range, e);
                if is_latest {
                    state.error = Some(e.user_message());
                }
                return Err(e);
            }
        }

        Ok(self.snapshot(&state).await)
    }

    /// 切换显示模式，只重新投影已有序列，不发起请求
    pub async fn set_chart_mode(&self, mode: ChartDisplayMode) -> DashboardView {
        let mut state = self.state.write().await;
        if state.chart.set_mode(mode) {
            log::debug!("🕯️ 图表模式切换为 {}", mode.as_str());
        }
        self.snapshot(&state).await
    }

    /// 执行一次市场扫描
    pub async fn load_recommendations(&self) -> Result<ScanView> {
        log::info!("🛰️ 开始市场扫描");
        let scan = self.api.recommendations().await.map_err(|e| {
            log::error!("❌ 市场扫描失败: {}", e);
            e
        })?;

        let view = render_scan(&scan);
        log::info!(
            "✅ 市场扫描完成: 扫描 {:?} 只, 分析 {:?} 只",
            view.market_scanned,
            view.total_analyzed
        );
        self.state.write().await.recommendations = Some(view.clone());
        Ok(view)
    }

    /// 最近一次扫描结果
    pub async fn recommendations(&self) -> Option<ScanView> {
        self.state.read().await.recommendations.clone()
    }

    /// 停止实时轮询，可重复调用，不影响进行中的一次性请求
    pub async fn stop_live(&self) -> bool {
        self.poller.lock().await.stop().await
    }

    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.is_polling()
    }

    pub async fn live_view(&self) -> LiveView {
        self.live.read().await.view()
    }

    pub async fn tooltip(&self, series: SeriesRef, index: usize) -> Result<Option<Tooltip>> {
        self.state.read().await.chart.tooltip(series, index)
    }

    pub async fn view(&self) -> DashboardView {
        let state = self.state.read().await;
        self.snapshot(&state).await
    }

    async fn snapshot(&self, state: &DashboardState) -> DashboardView {
        DashboardView {
            symbol: state.symbol.clone(),
            loading: state.loading > 0,
            error: state.error.clone(),
            overview: state.overview.clone(),
            live: self.live.read().await.view(),
            chart_mode: state.chart.mode(),
            chart_range: state.chart.range(),
            chart: state.chart.rendered().cloned(),
            recommendations: state.recommendations.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, CONNECTIVITY_MESSAGE};
    use crate::models::ChartView;
    use crate::services::testing::FakeMarketApi;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time;

    fn analysis(symbol: &str, price: f64) -> Value {
        json!({
            "recommendation": {
                "symbol": symbol,
                "company_name": format!("{} Corp", symbol),
                "short_term": "Buy",
                "long_term": "Hold"
            },
            "price_data": {"current_price": price, "change_percent": 0.5},
            "performance": {
                "1D": {"base": price, "change": 0.0},
                "1Y": {"base": price / 2.0, "change": 1.0}
            },
            "chart_data": {
                "dates": ["2024-01-02", "2024-01-03"],
                "prices": [price - 1.0, price],
                "sma_20": [null, price],
                "candles": [{"t": "2024-01-02", "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5}],
                "support": price - 5.0
            }
        })
    }

    fn setup() -> (Arc<FakeMarketApi>, Dashboard) {
        let api = Arc::new(FakeMarketApi::new());
        api.set_analysis("AAPL", analysis("AAPL", 190.0));
        api.set_analysis("MSFT", analysis("MSFT", 410.0));
        let dashboard = Dashboard::new(api.clone(), PollSettings::default());
        (api, dashboard)
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert_eq!(normalize_symbol("^gspc").unwrap(), "^GSPC");
        assert!(matches!(normalize_symbol("   "), Err(DashboardError::EmptySymbol)));
        assert!(matches!(
            normalize_symbol("AAPL/../x"),
            Err(DashboardError::InvalidSymbol(_))
        ));
        assert!(normalize_symbol("ABCDEFGHIJKLMNOP").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_populates_dashboard() {
        println!("\n========== 测试完整分析流程 ==========");
        let (api, dashboard) = setup();

        let view = dashboard.analyze(" aapl ").await.unwrap();
        println!("  看板股票: {:?}", view.symbol);

        assert_eq!(view.symbol.as_deref(), Some("AAPL"));
        assert!(!view.loading);
        assert!(view.error.is_none());
        assert_eq!(view.overview.as_ref().unwrap().name, "AAPL Corp");
        assert_eq!(view.live.price_text, "$190.00");
        assert!(view.live.live);
        assert_eq!(view.live.performance.len(), 2);

        let chart = view.chart.unwrap();
        assert_eq!(chart.symbol, "AAPL");
        assert!(matches!(chart.view, ChartView::Line { .. }));

        assert_eq!(api.calls("analyze:AAPL:-"), 1);
        assert!(dashboard.is_polling().await);
        println!("✅ 完整分析流程测试通过！");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mode_switch_issues_no_request() {
        println!("\n========== 测试切换图表模式不发请求 ==========");
        let (api, dashboard) = setup();
        let before = dashboard.analyze("AAPL").await.unwrap();
        let instance = before.chart.unwrap().instance;
        dashboard.stop_live().await;
        let calls = api.total_calls();

        let view = dashboard.set_chart_mode(ChartDisplayMode::Candle).await;
        let chart = view.chart.unwrap();

        println!("  请求次数: {} -> {}", calls, api.total_calls());
        assert_eq!(api.total_calls(), calls);
        assert_eq!(view.chart_mode, ChartDisplayMode::Candle);
        assert!(matches!(chart.view, ChartView::Candle { .. }));
        assert!(chart.instance > instance);
        println!("✅ 模式切换测试通过！");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_symbol_issues_no_request() {
        let (api, dashboard) = setup();
        let err = dashboard.analyze("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UserInput);
        assert_eq!(api.total_calls(), 0);
        assert_eq!(dashboard.view().await.error.as_deref(), Some("请输入股票代码"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_business_error_keeps_previous_state() {
        let (api, dashboard) = setup();
        api.set_analysis("ZZZZ", json!({"error": "No data found for ZZZZ"}));
        dashboard.analyze("AAPL").await.unwrap();

        let err = dashboard.analyze("ZZZZ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);

        let view = dashboard.view().await;
        assert_eq!(view.error.as_deref(), Some("No data found for ZZZZ"));
        assert_eq!(view.symbol.as_deref(), Some("AAPL"));
        assert_eq!(view.overview.unwrap().symbol, "AAPL");
        assert_eq!(view.live.symbol.as_deref(), Some("AAPL"));
        assert!(!view.loading);
        assert!(dashboard.is_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_shows_generic_message() {
        let (_api, dashboard) = setup();
        let err = dashboard.analyze("NVDA").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        let view = dashboard.view().await;
        assert_eq!(view.error.as_deref(), Some(CONNECTIVITY_MESSAGE));
        assert!(view.symbol.is_none());
        assert!(!dashboard.is_polling().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_requires_active_symbol() {
        let (api, dashboard) = setup();
        let err = dashboard.set_range(ChartRange::OneYear).await.unwrap_err();
        assert!(matches!(err, DashboardError::NoActiveSymbol));
        assert_eq!(api.total_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_range_response_is_discarded() {
        println!("\n========== 测试过期的范围切换响应 ==========");
        let (api, dashboard) = setup();
        dashboard.analyze("AAPL").await.unwrap();
        api.set_analyze_delay("AAPL", Some(ChartRange::OneMonth), Duration::from_secs(3));

        let (slow, fast) = tokio::join!(dashboard.set_range(ChartRange::OneMonth), async {
            time::sleep(Duration::from_millis(100)).await;
            dashboard.set_range(ChartRange::OneYear).await
        });
        assert!(slow.is_ok());
        assert!(fast.is_ok());

        let view = dashboard.view().await;
        let chart = view.chart.unwrap();
        println!("  最终图表范围: {:?}", chart.range);
        assert_eq!(chart.range, Some(ChartRange::OneYear));
        assert_eq!(view.chart_range, Some(ChartRange::OneYear));
        assert!(!view.loading);
        assert_eq!(api.calls("analyze:AAPL:1mo"), 1);
        assert_eq!(api.calls("analyze:AAPL:1y"), 1);
        println!("✅ 过期响应测试通过！");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_analysis_is_discarded() {
        let (api, dashboard) = setup();
        api.set_analyze_delay("AAPL", None, Duration::from_secs(3));

        let (slow, fast) = tokio::join!(dashboard.analyze("AAPL"), async {
            time::sleep(Duration::from_millis(100)).await;
            dashboard.analyze("MSFT").await
        });
        assert!(slow.is_ok());
        assert!(fast.is_ok());

        let view = dashboard.view().await;
        assert_eq!(view.symbol.as_deref(), Some("MSFT"));
        assert_eq!(view.chart.unwrap().symbol, "MSFT");
        assert_eq!(view.live.symbol.as_deref(), Some("MSFT"));
        assert_eq!(view.live.price, Some(410.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_does_not_cancel_inflight_analysis() {
        let (api, dashboard) = setup();
        api.set_analyze_delay("AAPL", None, Duration::from_secs(1));
        assert!(!dashboard.stop_live().await);

        let (analyzed, stopped) = tokio::join!(dashboard.analyze("AAPL"), async {
            dashboard.stop_live().await
        });
        assert!(analyzed.is_ok());
        assert!(!stopped);
        assert!(dashboard.is_polling().await);

        assert!(dashboard.stop_live().await);
        assert!(!dashboard.stop_live().await);
        assert!(!dashboard.live_view().await.live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ticks_update_live_view() {
        let (api, dashboard) = setup();
        api.set_price("AAPL", 199.5);
        dashboard.analyze("AAPL").await.unwrap();

        time::sleep(Duration::from_millis(5_100)).await;
        let live = dashboard.live_view().await;
        assert_eq!(live.price, Some(199.5));
        assert_eq!(live.ticks, 1);
        assert_eq!(live.performance[0].text, "+5.00%");

        // 静态区块不受轮询影响
        let view = dashboard.view().await;
        assert_eq!(view.overview.unwrap().price.price_text, "$190.00");
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_recommendations() {
        let (api, dashboard) = setup();
        assert!(dashboard.load_recommendations().await.is_err());
        assert!(dashboard.recommendations().await.is_none());

        api.set_scan(json!({
            "short_term": {"hot_picks": [], "safe_picks": [{"symbol": "KO", "name": "Coca-Cola", "price": 60.1, "score": 1.2}]},
            "long_term": {"best_picks": [], "stable_picks": []},
            "market_scanned": 40,
            "total_analyzed": 39
        }));
        let view = dashboard.load_recommendations().await.unwrap();
        assert_eq!(view.sections[0].categories.len(), 1);
        assert_eq!(dashboard.recommendations().await.unwrap().total_analyzed, Some(39));

        api.set_scan(json!({"error": "Scan failed"}));
        let err = dashboard.load_recommendations().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Business);
        // 失败不覆盖上一次结果
        assert!(dashboard.recommendations().await.is_some());
    }
}
