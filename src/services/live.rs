//! 实时会话状态
//!
//! 一次分析会话内的可变状态：当前股票、最近展示的价格、基准表、业绩徽章、
//! 高亮与 LIVE 指示灯。轮询任务和看板通过 `SharedLiveState` 共享同一份状态，
//! 锁从不跨 await 持有

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::{market_time_now, Direction, LiveView, PerformanceBadge, WindowKey};
use super::baseline::BaselineStore;
use super::format::format_price;
use super::performance;

pub type SharedLiveState = Arc<RwLock<LiveState>>;

/// 一次价格跳动
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTick {
    pub symbol: String,
    pub old_price: Option<f64>,
    pub new_price: f64,
    /// 与上次展示价格的差值；上次没有价格时为 None
    pub delta: Option<f64>,
    pub percentages: BTreeMap<WindowKey, f64>,
}

impl PriceTick {
    /// 价格发生变化时的方向
    pub fn direction(&self) -> Option<Direction> {
        match self.delta {
            Some(d) if d > 0.0 => Some(Direction::Up),
            Some(d) if d < 0.0 => Some(Direction::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct LiveState {
    symbol: Option<String>,
    last_displayed_price: Option<f64>,
    baselines: BaselineStore,
    performance: Vec<PerformanceBadge>,
    highlight: Option<Direction>,
    indicator_visible: bool,
    ticks: u64,
    consecutive_failures: u32,
    last_tick_at: Option<String>,
    notice: Option<String>,
}

impl LiveState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLiveState {
        Arc::new(RwLock::new(Self::new()))
    }

    /// 开始新的分析会话，旧会话的所有状态全部作废
    pub fn reset_session(
        &mut self,
        symbol: &str,
        current_price: Option<f64>,
        windows: &HashMap<String, Value>,
    ) {
        let kept = self.baselines.reset(windows);
        self.symbol = Some(symbol.to_string());
        self.last_displayed_price = current_price.filter(|p| p.is_finite());
        self.performance = performance::render_initial(&self.baselines, self.last_displayed_price);
        self.highlight = None;
        self.ticks = 0;
        self.consecutive_failures = 0;
        self.last_tick_at = None;
        self.notice = None;

        log::info!("🔄 {} 会话已重置，业绩周期 {} 个", symbol, kept);
    }

    /// 应用一次轮询得到的价格
    ///
    /// 股票已切换时返回 None 且不修改任何状态
    pub fn apply_price(&mut self, symbol: &str, new_price: f64) -> Option<PriceTick> {
        if self.symbol.as_deref() != Some(symbol) {
            log::debug!("丢弃过期的价格: {} (当前 {:?})", symbol, self.symbol);
            return None;
        }

        let old_price = self.last_displayed_price;
        let delta = old_price.map(|old| new_price - old);
        let percentages = self.baselines.recompute(new_price);

        let tick = PriceTick {
            symbol: symbol.to_string(),
            old_price,
            new_price,
            delta,
            percentages,
        };

        self.last_displayed_price = Some(new_price);
        if let Some(direction) = tick.direction() {
            self.highlight = Some(direction);
        }
        self.performance = performance::render_badges(&tick.percentages);
        self.ticks += 1;
        self.consecutive_failures = 0;
        self.last_tick_at = Some(market_time_now());
        self.notice = None;

        Some(tick)
    }

    /// 记录一次失败的轮询，返回连续失败次数
    ///
    /// 不属于当前会话的失败不计数，返回 None
    pub fn record_failure(&mut self, symbol: &str) -> Option<u32> {
        if self.symbol.as_deref() != Some(symbol) {
            log::debug!("忽略过期的轮询失败: {} (当前 {:?})", symbol, self.symbol);
            return None;
        }
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        Some(self.consecutive_failures)
    }

    pub fn clear_highlight(&mut self) {
        self.highlight = None;
    }

    pub fn set_indicator(&mut self, visible: bool) {
        self.indicator_visible = visible;
    }

    pub fn set_notice(&mut self, notice: Option<String>) {
        self.notice = notice;
    }

    pub fn last_displayed_price(&self) -> Option<f64> {
        self.last_displayed_price
    }

    pub fn highlight(&self) -> Option<Direction> {
        self.highlight
    }

    pub fn indicator_visible(&self) -> bool {
        self.indicator_visible
    }

    pub fn view(&self) -> LiveView {
        LiveView {
            symbol: self.symbol.clone(),
            price: self.last_displayed_price,
            price_text: format_price(self.last_displayed_price),
            highlight: self.highlight,
            live: self.indicator_visible,
            performance: self.performance.clone(),
            ticks: self.ticks,
            consecutive_failures: self.consecutive_failures,
            last_tick_at: self.last_tick_at.clone(),
            notice: self.notice.clone(),
        }
    }
}
