//! 展示格式化

/// 价格，如 "$190.50"；缺失时为 "N/A"
pub fn format_price(price: Option<f64>) -> String {
    match price.filter(|p| p.is_finite()) {
        Some(p) => format!("${:.2}", p),
        None => "N/A".to_string(),
    }
}

/// 市值，按 T/B/M 缩写
pub fn format_market_cap(cap: Option<f64>) -> String {
    let Some(num) = cap.filter(|c| c.is_finite() && *c != 0.0) else {
        return "N/A".to_string();
    };

    if num >= 1e12 {
        format!("${:.2}T", num / 1e12)
    } else if num >= 1e9 {
        format!("${:.2}B", num / 1e9)
    } else if num >= 1e6 {
        format!("${:.2}M", num / 1e6)
    } else {
        format!("${:.2}", num)
    }
}

/// 文本字段缺失时的占位
pub fn or_na(text: Option<&str>) -> String {
    text.filter(|t| !t.trim().is_empty())
        .unwrap_or("N/A")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_market_cap() {
        assert_eq!(format_market_cap(Some(2.95e12)), "$2.95T");
        assert_eq!(format_market_cap(Some(4.1e9)), "$4.10B");
        assert_eq!(format_market_cap(Some(7.5e6)), "$7.50M");
        assert_eq!(format_market_cap(Some(950.0)), "$950.00");
        assert_eq!(format_market_cap(None), "N/A");
        assert_eq!(format_market_cap(Some(0.0)), "N/A");
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Some(190.5)), "$190.50");
        assert_eq!(format_price(None), "N/A");
        assert_eq!(format_price(Some(f64::NAN)), "N/A");
        assert_eq!(or_na(Some("  ")), "N/A");
        assert_eq!(or_na(Some("1.2")), "1.2");
    }
}
