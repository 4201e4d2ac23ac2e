//! 业绩条渲染
//!
//! 按固定周期顺序输出徽章，源数据中不存在的周期直接省略

use std::collections::BTreeMap;

use crate::models::{Direction, PerformanceBadge, WindowKey};
use super::baseline::BaselineStore;

/// 带符号、两位小数的百分比，如 "+1.23%" / "-0.50%"
pub fn format_signed_pct(value: f64) -> String {
    match Direction::of(value) {
        Direction::Up => format!("+{:.2}%", value.abs()),
        Direction::Down => format!("-{:.2}%", value.abs()),
    }
}

pub fn badge(key: WindowKey, value: f64) -> PerformanceBadge {
    let direction = Direction::of(value);
    PerformanceBadge {
        key,
        label: key.label().to_string(),
        value,
        text: format_signed_pct(value),
        direction,
        class: match direction {
            Direction::Up => "perf-up".to_string(),
            Direction::Down => "perf-down".to_string(),
        },
    }
}

/// 由涨跌幅映射生成徽章（实时更新）
pub fn render_badges(percentages: &BTreeMap<WindowKey, f64>) -> Vec<PerformanceBadge> {
    WindowKey::ORDER
        .iter()
        .filter_map(|key| percentages.get(key).map(|value| badge(*key, *value)))
        .collect()
}

/// 由基准表生成徽章（分析完成后的首次渲染）
pub fn render_initial(store: &BaselineStore, current_price: Option<f64>) -> Vec<PerformanceBadge> {
    render_badges(&store.initial_percentages(current_price))
}
