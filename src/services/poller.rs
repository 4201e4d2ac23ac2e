//! 实时价格轮询
//!
//! 状态机 Idle -> Polling -> Idle。任意时刻最多一个轮询任务：
//! `start` 会先完整停止旧任务再启动新任务，`stop` 可重复调用。
//!
//! 单次轮询失败（网络异常、业务错误、价格缺失）只跳过本次，不改变状态也不提示用户；
//! 同一任务内的轮询串行执行，响应按发送顺序应用

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::live::SharedLiveState;
use super::market_api::MarketApi;

/// 轮询参数
#[derive(Debug, Clone)]
pub struct PollSettings {
    /// 轮询间隔
    pub interval: Duration,
    /// 价格高亮持续时间
    pub flash: Duration,
    /// 连续失败多少次后停止轮询，0 表示一直重试
    pub max_failures: u32,
    /// 每连续失败多少次记录一条警告日志，0 表示不记录
    pub warn_every: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            flash: Duration::from_millis(1000),
            max_failures: 0,
            warn_every: 12,
        }
    }
}

struct PollTask {
    symbol: String,
    handle: JoinHandle<()>,
}

/// 实时价格轮询器
pub struct QuotePoller {
    api: Arc<dyn MarketApi>,
    live: SharedLiveState,
    settings: PollSettings,
    task: Option<PollTask>,
}

impl QuotePoller {
    pub fn new(api: Arc<dyn MarketApi>, live: SharedLiveState, settings: PollSettings) -> Self {
        Self {
            api,
            live,
            settings,
            task: None,
        }
    }

    /// 开始轮询指定股票，已有任务会先被停止
    pub async fn start(&mut self, symbol: &str) {
        self.stop().await;

        self.live.write().await.set_indicator(true);

        let handle = tokio::spawn(poll_loop(
            self.api.clone(),
            self.live.clone(),
            symbol.to_string(),
            self.settings.clone(),
        ));
        self.task = Some(PollTask {
            symbol: symbol.to_string(),
            handle,
        });

        log::info!(
            "▶️ 开始轮询 {} 实时价格，间隔 {:?}",
            symbol,
            self.settings.interval
        );
    }

    /// 停止轮询并隐藏 LIVE 指示灯
    ///
    /// 返回是否真的停止了一个任务；空闲时调用没有任何效果
    pub async fn stop(&mut self) -> bool {
        let Some(task) = self.task.take() else {
            return false;
        };

        task.handle.abort();
        self.live.write().await.set_indicator(false);
        log::info!("⏹️ 停止轮询 {} 实时价格", task.symbol);
        true
    }

    pub fn is_polling(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }

    pub fn symbol(&self) -> Option<&str> {
        self.task.as_ref().map(|task| task.symbol.as_str())
    }
}

impl Drop for QuotePoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

async fn poll_loop(
    api: Arc<dyn MarketApi>,
    live: SharedLiveState,
    symbol: String,
    settings: PollSettings,
) {
    // 第一次轮询在一个间隔之后
    let mut ticker = time::interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(price) = fetch_price(api.as_ref(), &symbol).await else {
            let mut state = live.write().await;
            let Some(failures) = state.record_failure(&symbol) else {
                log::debug!("{} 会话已结束，轮询退出", symbol);
                break;
            };

            if settings.warn_every > 0 && failures % settings.warn_every == 0 {
                log::warn!("⚠️ {} 实时价格已连续失败 {} 次", symbol, failures);
            }
            if settings.max_failures > 0 && failures >= settings.max_failures {
                state.set_indicator(false);
                state.set_notice(Some(format!("实时价格连续 {} 次获取失败，已暂停更新", failures)));
                log::warn!("⏸️ {} 实时价格连续失败 {} 次，停止轮询", symbol, failures);
                break;
            }
            continue;
        };

        let tick = live.write().await.apply_price(&symbol, price);
        let Some(tick) = tick else {
            continue;
        };

        log::debug!(
            "📈 {} 价格 {:?} -> {:.2}",
            tick.symbol,
            tick.old_price,
            tick.new_price
        );

        if tick.direction().is_some() {
            schedule_highlight_reset(live.clone(), settings.flash);
        }
    }
}

/// 单次获取价格，任何失败都返回 None
async fn fetch_price(api: &dyn MarketApi, symbol: &str) -> Option<f64> {
    match api.price(symbol).await {
        Ok(quote) => match quote.price {
            Some(price) => Some(price),
            None => {
                log::debug!("跳过本次轮询: {} 响应中没有价格", symbol);
                None
            }
        },
        Err(e) => {
            log::debug!("跳过本次轮询: {} {}", symbol, e);
            None
        }
    }
}

/// 高亮到期后清除
///
/// 每次跳动各自计时，互不取消；清除是幂等的
fn schedule_highlight_reset(live: SharedLiveState, flash: Duration) {
    tokio::spawn(async move {
        time::sleep(flash).await;
        live.write().await.clear_highlight();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use crate::models::Direction;
    use crate::services::live::LiveState;
    use crate::services::testing::FakeMarketApi;
    use std::collections::HashMap;

    async fn setup(settings: PollSettings) -> (Arc<FakeMarketApi>, SharedLiveState, QuotePoller) {
        let api = Arc::new(FakeMarketApi::new());
        let live = LiveState::shared();
        let poller = QuotePoller::new(api.clone(), live.clone(), settings);
        (api, live, poller)
    }

    async fn begin_session(live: &SharedLiveState, symbol: &str, price: f64) {
        live.write()
            .await
            .reset_session(symbol, Some(price), &HashMap::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_timer() {
        println!("\n========== 测试切换股票后只有一个轮询任务 ==========");
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        api.set_price("AAPL", 190.0);
        api.set_price("MSFT", 410.0);

        begin_session(&live, "AAPL", 190.0).await;
        poller.start("AAPL").await;
        begin_session(&live, "MSFT", 410.0).await;
        poller.start("MSFT").await;

        // 5 个间隔
        time::sleep(Duration::from_millis(25_500)).await;

        println!("  AAPL 请求次数: {}", api.calls("price:AAPL"));
        println!("  MSFT 请求次数: {}", api.calls("price:MSFT"));
        assert_eq!(api.calls("price:AAPL"), 0);
        assert_eq!(api.calls("price:MSFT"), 5);
        assert!(poller.is_polling());
        assert_eq!(poller.symbol(), Some("MSFT"));
        println!("✅ 单轮询任务测试通过！");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_same_symbol_does_not_double_fire() {
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        api.set_price("AAPL", 190.0);

        begin_session(&live, "AAPL", 190.0).await;
        poller.start("AAPL").await;
        time::sleep(Duration::from_millis(2_000)).await;
        poller.start("AAPL").await;

        // 重启后的第一次轮询在 2s + 5s
        time::sleep(Duration::from_millis(20_500)).await;
        assert_eq!(api.calls("price:AAPL"), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        api.set_price("AAPL", 190.0);
        begin_session(&live, "AAPL", 190.0).await;

        poller.start("AAPL").await;
        assert!(live.read().await.indicator_visible());

        assert!(poller.stop().await);
        assert!(!live.read().await.indicator_visible());
        assert!(!poller.stop().await);
        assert!(!poller.is_polling());

        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.calls("price:"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ticks_are_skipped() {
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        api.push_price("AAPL", Err(DashboardError::Transport("timeout".into())));
        api.push_price("AAPL", Err(DashboardError::Business("No data found".into())));
        api.set_price("AAPL", 191.0);
        begin_session(&live, "AAPL", 190.0).await;

        poller.start("AAPL").await;

        time::sleep(Duration::from_millis(10_500)).await;
        {
            let view = live.read().await.view();
            assert_eq!(view.price, Some(190.0));
            assert_eq!(view.consecutive_failures, 2);
            assert!(view.notice.is_none());
        }

        time::sleep(Duration::from_secs(5)).await;
        let view = live.read().await.view();
        assert_eq!(view.price, Some(191.0));
        assert_eq!(view.consecutive_failures, 0);
        assert!(poller.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_highlight_clears_after_flash() {
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        api.push_price("AAPL", Ok(189.0));
        api.set_price("AAPL", 189.0);
        begin_session(&live, "AAPL", 190.0).await;

        poller.start("AAPL").await;

        time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(live.read().await.highlight(), Some(Direction::Down));

        time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(live.read().await.highlight(), None);

        // 价格不变，不再高亮
        time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(live.read().await.highlight(), None);
        assert_eq!(live.read().await.view().ticks, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_after_max_failures() {
        let settings = PollSettings {
            max_failures: 3,
            ..Default::default()
        };
        let (api, live, mut poller) = setup(settings).await;
        begin_session(&live, "AAPL", 190.0).await;

        poller.start("AAPL").await;
        time::sleep(Duration::from_secs(60)).await;

        assert_eq!(api.calls("price:AAPL"), 3);
        assert!(!poller.is_polling());
        let view = live.read().await.view();
        assert!(!view.live);
        assert!(view.notice.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_outside_session_does_not_count() {
        let (api, live, mut poller) = setup(PollSettings::default()).await;
        // 会话已切到 MSFT，AAPL 任务的失败不计入
        begin_session(&live, "MSFT", 410.0).await;

        poller.start("AAPL").await;
        time::sleep(Duration::from_millis(5_500)).await;

        assert_eq!(api.calls("price:AAPL"), 1);
        assert_eq!(live.read().await.view().consecutive_failures, 0);
        assert!(!poller.is_polling());
    }
}
