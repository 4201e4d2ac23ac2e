//! 静态概览区块
//!
//! 分析完成后一次性生成：公司、建议、风险、技术面、基本面、价格、投资策略、新闻。
//! 缺失字段降级为占位符或直接省略

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{
    AnalysisResponse, Direction, InvestmentStrategy, NewsItem, NewsItemView, OverviewView,
    PriceData, PriceView, RecBadgeView, RiskSummary, RiskView, StrategyView,
};
use super::format::{format_market_cap, format_price, or_na};
use super::performance::format_signed_pct;
use super::recommendation::{classify_badge, classify_risk};

pub const NO_NEWS_PLACEHOLDER: &str = "暂无最新新闻";

pub fn render_overview(data: &AnalysisResponse, symbol: &str) -> OverviewView {
    let rec = &data.recommendation;
    let name = rec
        .company_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| symbol.to_string());

    let news: Vec<NewsItemView> = data.news.iter().map(render_news_item).collect();
    let news_placeholder = news.is_empty().then(|| NO_NEWS_PLACEHOLDER.to_string());

    OverviewView {
        symbol: symbol.to_string(),
        name,
        short_term: rec_badge(rec.short_term.as_deref()),
        short_term_confidence: or_na(rec.short_term_confidence.as_deref()),
        long_term: rec_badge(rec.long_term.as_deref()),
        risk: render_risk(&data.risk),
        trend: or_na(data.technical.trend.as_deref()),
        momentum: or_na(data.technical.momentum.as_deref()),
        pe_rating: or_na(data.fundamental.pe_rating.as_deref()),
        market_cap: format_market_cap(data.overview.market_cap),
        beta: or_na(data.overview.beta.as_deref()),
        price: render_price(&data.price_data, data),
        strategy: data.investment_strategy.as_ref().map(render_strategy),
        analysis_html: rec
            .detailed_analysis
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(render_markup),
        news,
        news_placeholder,
    }
}

fn rec_badge(text: Option<&str>) -> RecBadgeView {
    RecBadgeView {
        text: or_na(text),
        badge: classify_badge(text),
    }
}

fn render_risk(risk: &RiskSummary) -> RiskView {
    RiskView {
        level: or_na(risk.level.as_deref()),
        class: classify_risk(risk.level.as_deref()),
        volatility: or_na(risk.volatility.as_deref()),
        beta: or_na(risk.beta.as_deref()),
        score: match risk.score.as_deref() {
            Some(score) => format!("{}/5", score),
            None => "N/A".to_string(),
        },
    }
}

fn render_price(price: &PriceData, data: &AnalysisResponse) -> PriceView {
    let change = price.change_percent.unwrap_or(0.0);
    let change_30d = price.change_30d.unwrap_or(0.0);

    PriceView {
        price_text: format_price(price.current_price),
        change_text: format_signed_pct(change),
        change_direction: Direction::of(change),
        change_30d_text: format_signed_pct(change_30d),
        change_30d_direction: Direction::of(change_30d),
        // price_data 缺少 52 周区间时退回 overview
        high_52w: format_price(price.high_52w.or(data.overview.high_52w)),
        low_52w: format_price(price.low_52w.or(data.overview.low_52w)),
    }
}

/// 策略样式：DCA -> warning，Lump Sum -> success，其余 neutral
pub fn strategy_class(strategy: &str) -> &'static str {
    if strategy.contains("DCA") {
        "badge-warning"
    } else if strategy.contains("Lump Sum") {
        "badge-success"
    } else {
        "badge-neutral"
    }
}

fn render_strategy(strategy: &InvestmentStrategy) -> StrategyView {
    StrategyView {
        label: or_na(Some(strategy.strategy.as_str())),
        class: strategy_class(&strategy.strategy).to_string(),
        narrative_html: strategy
            .narrative
            .as_deref()
            .map(render_markup)
            .unwrap_or_default(),
        volatility_text: match strategy.volatility {
            Some(v) => format!("{}% (日)", v),
            None => "N/A".to_string(),
        },
    }
}

fn render_news_item(item: &NewsItem) -> NewsItemView {
    NewsItemView {
        publisher: item.publisher.clone(),
        published: item.published.clone().unwrap_or_default(),
        title: item.title.clone(),
        link: item.link.clone(),
    }
}

fn bold_re() -> Option<&'static Regex> {
    static BOLD: OnceLock<Option<Regex>> = OnceLock::new();
    BOLD.get_or_init(|| Regex::new(r"\*\*(.*?)\*\*").ok()).as_ref()
}

/// 叙述文本转 HTML：转义后把 **粗体** 换成 <strong>，换行换成 <br>
pub fn render_markup(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    let bolded = match bold_re() {
        Some(re) => re.replace_all(&escaped, "<strong>$1</strong>").into_owned(),
        None => escaped,
    };

    bolded.replace("\r\n", "<br>").replace('\n', "<br>")
}
