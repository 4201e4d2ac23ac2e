//! 市场扫描推荐渲染
//!
//! 扫描结果按 短线{热门, 稳健}、长线{优选, 稳健}、高动量 分组；
//! 空分组不输出标题和卡片，没有占位

use crate::models::{
    BadgeClass, CardType, CategoryKind, CategoryView, Horizon, RecommendationCardView, RiskClass,
    ScanResult, ScanSection, ScanView, ScannedStock,
};
use super::format::{format_price, or_na};

/// 建议文本到徽章样式，不区分大小写，按优先级首个匹配生效
pub fn classify_badge(recommendation: Option<&str>) -> BadgeClass {
    let text = recommendation.unwrap_or_default().to_lowercase();

    if text.contains("strong buy") {
        BadgeClass::StrongBuy
    } else if text.contains("buy") {
        BadgeClass::Buy
    } else if text.contains("strong sell") {
        BadgeClass::StrongSell
    } else if text.contains("sell") {
        BadgeClass::Sell
    } else {
        BadgeClass::Hold
    }
}

/// 风险文本到风险样式，区分大小写；缺失时为 Moderate
pub fn classify_risk(risk: Option<&str>) -> RiskClass {
    match risk {
        Some(r) if r.contains("Low") => RiskClass::Low,
        Some(r) if r.contains("High") => RiskClass::High,
        _ => RiskClass::Moderate,
    }
}

/// 评分条填充百分比：(score + 5) * 10，截断到 [0, 100]
pub fn score_fill(score: f64) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    ((score + 5.0) * 10.0).clamp(0.0, 100.0)
}

/// 单张推荐卡片，卡片类型决定取短线还是长线建议
pub fn render_card(stock: &ScannedStock, card_type: CardType) -> RecommendationCardView {
    let recommendation = match card_type {
        CardType::Short => stock.short_term.as_deref(),
        CardType::Long | CardType::Momentum => stock.long_term.as_deref(),
    };
    let css_class = match card_type {
        CardType::Short => "short-card",
        CardType::Long => "long-card",
        CardType::Momentum => "momentum-card",
    };

    RecommendationCardView {
        symbol: stock.symbol.clone(),
        name: stock.name.clone(),
        price_text: format_price(Some(stock.price)),
        recommendation: or_na(recommendation),
        badge: classify_badge(recommendation),
        trend: or_na(Some(stock.trend.as_str())),
        risk_text: or_na(stock.risk.as_deref()),
        risk: classify_risk(stock.risk.as_deref()),
        score: stock.score,
        score_text: format!("评分: {:.1}", stock.score),
        score_fill: score_fill(stock.score),
        card_type,
        css_class: css_class.to_string(),
        analyze_path: format!("/api/v1/dashboard/analyze/{}", stock.symbol),
    }
}

fn category(
    kind: CategoryKind,
    heading: &str,
    stocks: &[ScannedStock],
    card_type: CardType,
) -> Option<CategoryView> {
    if stocks.is_empty() {
        return None;
    }
    Some(CategoryView {
        kind,
        heading: heading.to_string(),
        cards: stocks.iter().map(|s| render_card(s, card_type)).collect(),
    })
}

/// 扫描摘要行
pub fn summary_line(market_scanned: Option<u32>, total_analyzed: Option<u32>) -> String {
    let count = |n: Option<u32>| n.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string());
    format!(
        "✅ 已扫描 {} 只标普500成分股 | 成功分析 {} 只",
        count(market_scanned),
        count(total_analyzed)
    )
}

/// 渲染整个扫描结果
///
/// 短线、长线两个区块始终输出标题；高动量区块只在有数据时输出
pub fn render_scan(scan: &ScanResult) -> ScanView {
    let short_term = ScanSection {
        horizon: Horizon::ShortTerm,
        title: "⚡ 短线 (1-3个月)".to_string(),
        categories: [
            category(
                CategoryKind::Hot,
                "🔥 热门推荐 - 买入机会",
                &scan.short_term.hot_picks,
                CardType::Short,
            ),
            category(
                CategoryKind::Safe,
                "🛡️ 短线稳健 (低风险)",
                &scan.short_term.safe_picks,
                CardType::Short,
            ),
        ]
        .into_iter()
        .flatten()
        .collect(),
    };

    let long_term = ScanSection {
        horizon: Horizon::LongTerm,
        title: "🎯 长线 (6-12个月)".to_string(),
        categories: [
            category(
                CategoryKind::Best,
                "🏆 优选推荐 - 长期投资",
                &scan.long_term.best_picks,
                CardType::Long,
            ),
            category(
                CategoryKind::Stable,
                "💎 长线稳健 (低风险)",
                &scan.long_term.stable_picks,
                CardType::Long,
            ),
        ]
        .into_iter()
        .flatten()
        .collect(),
    };

    let mut sections = vec![short_term, long_term];

    let momentum = scan.high_momentum.as_deref().and_then(|stocks| {
        category(
            CategoryKind::Momentum,
            "🚀 高动量股票",
            stocks,
            CardType::Momentum,
        )
    });
    if let Some(momentum) = momentum {
        sections.push(ScanSection {
            horizon: Horizon::Momentum,
            title: "🚀 高动量".to_string(),
            categories: vec![momentum],
        });
    }

    ScanView {
        summary: summary_line(scan.market_scanned, scan.total_analyzed),
        market_scanned: scan.market_scanned,
        total_analyzed: scan.total_analyzed,
        sections,
    }
}
