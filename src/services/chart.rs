//! 图表状态与投影
//!
//! `project` 是唯一的渲染分发入口：同一份 `ChartSeries` 按显示模式投影为线图或K线图。
//! 每次重绘都销毁旧实例并生成新实例，不做增量更新

use std::collections::HashMap;

use crate::error::{DashboardError, Result};
use crate::models::{
    BodyBar, ChartDisplayMode, ChartRange, ChartSeries, ChartView, Direction, LineSeriesView,
    ReferenceLine, RenderedChart, SeriesRef, Tooltip, WickBar,
};

const PRICE_COLOR: &str = "#6366f1";
const SMA20_COLOR: &str = "#10b981";
const SMA50_COLOR: &str = "#f59e0b";
const UP_COLOR: &str = "#4ade80";
const DOWN_COLOR: &str = "#f87171";
const SUPPORT_COLOR: &str = "#38bdf8";
const RESISTANCE_COLOR: &str = "#f472b6";

/// 当前图表数据所属的股票和时间范围
#[derive(Debug, Clone)]
struct LoadedSeries {
    symbol: String,
    range: Option<ChartRange>,
    series: ChartSeries,
}

/// 图表状态：显示模式、时间范围、最近一次收到的序列和当前实例
#[derive(Debug, Default)]
pub struct ChartState {
    mode: ChartDisplayMode,
    range: Option<ChartRange>,
    loaded: Option<LoadedSeries>,
    next_instance: u64,
    rendered: Option<RenderedChart>,
}

impl ChartState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ChartDisplayMode {
        self.mode
    }

    /// 用户当前选择的时间范围，None 表示使用接口默认范围
    pub fn range(&self) -> Option<ChartRange> {
        self.range
    }

    pub fn symbol(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.symbol.as_str())
    }

    pub fn series(&self) -> Option<&ChartSeries> {
        self.loaded.as_ref().map(|l| &l.series)
    }

    pub fn rendered(&self) -> Option<&RenderedChart> {
        self.rendered.as_ref()
    }

    pub fn select_range(&mut self, range: Option<ChartRange>) {
        self.range = range;
    }

    /// 整体替换图表序列并重绘
    pub fn replace_series(&mut self, symbol: &str, range: Option<ChartRange>, series: ChartSeries) {
        log::debug!(
            "📊 {} 图表数据已替换: {} 个日期, {} 根K线",
            symbol,
            series.dates.len(),
            series.candles.len()
        );
        self.loaded = Some(LoadedSeries {
            symbol: symbol.to_string(),
            range,
            series,
        });
        self.render();
    }

    /// 切换显示模式，只重新投影已有序列
    ///
    /// 返回模式是否发生变化
    pub fn set_mode(&mut self, mode: ChartDisplayMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.render();
        true
    }

    /// 按指定序列和下标生成提示框内容
    ///
    /// 下标越界或该位置没有值时返回 None；当前模式下不存在的序列类型返回错误
    pub fn tooltip(&self, series: SeriesRef, index: usize) -> Result<Option<Tooltip>> {
        match &self.rendered {
            Some(chart) => tooltip_for(&chart.view, series, index),
            None => Ok(None),
        }
    }

    fn destroy(&mut self) {
        if let Some(old) = self.rendered.take() {
            log::debug!("🗑️ 销毁图表实例 #{}", old.instance);
        }
    }

    fn render(&mut self) {
        self.destroy();

        let Some(loaded) = &self.loaded else {
            return;
        };
        if loaded.series.is_empty() {
            log::warn!("⚠️ {} 没有图表数据", loaded.symbol);
            return;
        }

        let chart = RenderedChart {
            instance: self.next_instance + 1,
            symbol: loaded.symbol.clone(),
            mode: self.mode,
            range: loaded.range,
            view: project(&loaded.series, self.mode),
        };
        self.next_instance = chart.instance;
        self.rendered = Some(chart);
    }
}

/// 渲染分发：按显示模式投影序列
pub fn project(series: &ChartSeries, mode: ChartDisplayMode) -> ChartView {
    match mode {
        ChartDisplayMode::Line => project_line(series),
        ChartDisplayMode::Candle => project_candle(series),
    }
}

fn project_line(series: &ChartSeries) -> ChartView {
    let labels = series.dates.clone();

    let mut overlays = Vec::new();
    if let Some(sma20) = &series.sma20 {
        overlays.push(sma_overlay(SeriesRef::Sma20, sma20));
    }
    if let Some(sma50) = &series.sma50 {
        overlays.push(sma_overlay(SeriesRef::Sma50, sma50));
    }

    ChartView::Line {
        reference_lines: reference_lines(series, labels.len()),
        price: LineSeriesView {
            id: SeriesRef::Price,
            name: series_name(SeriesRef::Price).to_string(),
            color: PRICE_COLOR.to_string(),
            dash: None,
            fill: true,
            points: series.prices.clone(),
        },
        overlays,
        labels,
    }
}

fn project_candle(series: &ChartSeries) -> ChartView {
    let labels: Vec<String> = series.candles.iter().map(|c| c.t.clone()).collect();

    let wicks = series
        .candles
        .iter()
        .map(|c| WickBar {
            low: c.low,
            high: c.high,
        })
        .collect();

    let bodies = series
        .candles
        .iter()
        .map(|c| {
            let direction = if c.is_up() { Direction::Up } else { Direction::Down };
            BodyBar {
                open: c.open,
                close: c.close,
                high: c.high,
                low: c.low,
                direction,
                color: match direction {
                    Direction::Up => UP_COLOR.to_string(),
                    Direction::Down => DOWN_COLOR.to_string(),
                },
            }
        })
        .collect();

    // K线模式只叠加 SMA 50，按日期对齐到K线
    let overlays = series
        .sma50
        .as_ref()
        .map(|sma50| {
            let aligned = align_to_candles(series, sma50);
            vec![sma_overlay(SeriesRef::Sma50, &aligned)]
        })
        .unwrap_or_default();

    ChartView::Candle {
        reference_lines: reference_lines(series, labels.len()),
        wicks,
        bodies,
        overlays,
        labels,
    }
}

/// 均线与 `dates` 按下标对齐，K线可能缺根，按日期重新映射
fn align_to_candles(series: &ChartSeries, values: &[Option<f64>]) -> Vec<Option<f64>> {
    let by_date: HashMap<&str, usize> = series
        .dates
        .iter()
        .enumerate()
        .map(|(i, d)| (d.as_str(), i))
        .collect();

    series
        .candles
        .iter()
        .map(|c| {
            by_date
                .get(c.t.as_str())
                .and_then(|&i| values.get(i).copied().flatten())
        })
        .collect()
}

fn sma_overlay(id: SeriesRef, values: &[Option<f64>]) -> LineSeriesView {
    let (color, dash) = match id {
        SeriesRef::Sma20 => (SMA20_COLOR, [5, 5]),
        _ => (SMA50_COLOR, [10, 5]),
    };
    LineSeriesView {
        id,
        name: series_name(id).to_string(),
        color: color.to_string(),
        dash: Some(dash),
        fill: false,
        points: values.to_vec(),
    }
}

/// 支撑/阻力线横跨整个可见范围，缺失时不画
fn reference_lines(series: &ChartSeries, len: usize) -> Vec<ReferenceLine> {
    let lines = [
        (SeriesRef::Support, SUPPORT_COLOR, series.support),
        (SeriesRef::Resistance, RESISTANCE_COLOR, series.resistance),
    ];

    lines
        .into_iter()
        .filter_map(|(id, color, value)| {
            let value = value.filter(|v| v.is_finite())?;
            Some(ReferenceLine {
                id,
                name: series_name(id).to_string(),
                color: color.to_string(),
                value,
                points: vec![value; len],
            })
        })
        .collect()
}

fn tooltip_for(view: &ChartView, series: SeriesRef, index: usize) -> Result<Option<Tooltip>> {
    let (labels, overlays, reference_lines) = match view {
        ChartView::Line {
            labels,
            overlays,
            reference_lines,
            ..
        }
        | ChartView::Candle {
            labels,
            overlays,
            reference_lines,
            ..
        } => (labels, overlays, reference_lines),
    };
    let Some(label) = labels.get(index) else {
        return Ok(None);
    };

    let value = match (view, series) {
        (ChartView::Line { price, .. }, SeriesRef::Price) => line_value(price, index),
        // K线模式下影线和实体都展示完整 OHLC
        (ChartView::Candle { bodies, .. }, SeriesRef::Body | SeriesRef::Wick) => {
            return Ok(bodies.get(index).map(|b| Tooltip::Ohlc {
                label: label.clone(),
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
            }));
        }
        (ChartView::Candle { .. }, SeriesRef::Sma20) => {
            return Err(DashboardError::InvalidSeries("sma20".to_string()));
        }
        (_, SeriesRef::Sma20 | SeriesRef::Sma50) => overlays
            .iter()
            .find(|o| o.id == series)
            .and_then(|o| line_value(o, index)),
        (_, SeriesRef::Support | SeriesRef::Resistance) => reference_lines
            .iter()
            .find(|l| l.id == series)
            .map(|l| l.value),
        (_, other) => {
            return Err(DashboardError::InvalidSeries(
                format!("{:?}", other).to_lowercase(),
            ));
        }
    };

    Ok(value.map(|value| Tooltip::Value {
        series: series_name(series).to_string(),
        label: label.clone(),
        value,
    }))
}

fn line_value(line: &LineSeriesView, index: usize) -> Option<f64> {
    line.points.get(index).copied().flatten()
}

fn series_name(id: SeriesRef) -> &'static str {
    match id {
        SeriesRef::Price => "价格",
        SeriesRef::Sma20 => "SMA 20",
        SeriesRef::Sma50 => "SMA 50",
        SeriesRef::Wick => "影线",
        SeriesRef::Body => "实体",
        SeriesRef::Support => "支撑位",
        SeriesRef::Resistance => "阻力位",
    }
}
