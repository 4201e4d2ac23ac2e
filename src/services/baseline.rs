//! 业绩基准价存储
//!
//! 每次完整分析成功后整体替换（不合并），实时价格到达时据此重新计算各周期涨跌幅。
//! 基准价为 0 或缺失的周期不会进入表中，格式错误的条目静默跳过

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::models::lenient::value_to_f64;
use crate::models::{PerformanceWindow, WindowKey};

/// 周期 -> 基准
pub type BaselineTable = BTreeMap<WindowKey, PerformanceWindow>;

#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    table: BaselineTable,
}

impl BaselineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用分析结果中的 `performance` 整体替换基准表
    ///
    /// 返回保留下来的周期数量；没有任何有效周期时基准表被清空
    pub fn reset(&mut self, windows: &HashMap<String, Value>) -> usize {
        let table: BaselineTable = windows
            .iter()
            .filter_map(|(key, value)| parse_window(key, value))
            .map(|w| (w.key, w))
            .collect();

        if table.len() < windows.len() {
            log::debug!(
                "业绩周期 {} 个，有效 {} 个，其余已跳过",
                windows.len(),
                table.len()
            );
        }

        self.table = table;
        self.table.len()
    }

    /// 以最新价重新计算每个周期的涨跌幅（百分比）
    ///
    /// 价格与上一次相同时照常返回，不做抑制
    pub fn recompute(&self, latest_price: f64) -> BTreeMap<WindowKey, f64> {
        self.table
            .values()
            .filter(|w| is_usable_base(w.base_price))
            .map(|w| (w.key, w.change_pct(latest_price)))
            .collect()
    }

    /// 首次渲染使用的涨跌幅
    ///
    /// 优先使用分析服务给出的值，缺失时用当前价格现算；两者都没有的周期暂不展示
    pub fn initial_percentages(&self, current_price: Option<f64>) -> BTreeMap<WindowKey, f64> {
        self.table
            .values()
            .filter_map(|w| {
                let pct = w
                    .initial_change_pct
                    .or_else(|| current_price.map(|p| w.change_pct(p)))?;
                Some((w.key, pct))
            })
            .collect()
    }

    pub fn table(&self) -> &BaselineTable {
        &self.table
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

fn is_usable_base(base: f64) -> bool {
    base.is_finite() && base != 0.0
}

/// 解析 `{"base": 190.1, "change": 0.0123}`，`change` 为小数比例
fn parse_window(key: &str, value: &Value) -> Option<PerformanceWindow> {
    let key: WindowKey = key.parse().ok()?;
    let base_price = value.get("base").and_then(value_to_f64)?;
    if !is_usable_base(base_price) {
        return None;
    }
    let initial_change_pct = value
        .get("change")
        .and_then(value_to_f64)
        .map(|change| change * 100.0);

    Some(PerformanceWindow {
        key,
        base_price,
        initial_change_pct,
    })
}
