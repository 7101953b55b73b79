use crate::domain::promotion::{Platform, Promotion};
use serde::Serialize;

pub const MAX_CHART_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub platform: Platform,
    pub label: &'static str,
    pub discount: u32,
    pub full_discount: String,
    pub title: String,
    pub color: &'static str,
}

/// First run of ASCII digits in the discount text: "50% OFF" -> 50. Runs too long for a
/// `u32` saturate at `u32::MAX`.
pub fn extract_discount(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    // A non-empty all-digit run only fails to parse on overflow.
    Some(digits[..end].parse().unwrap_or(u32::MAX))
}

/// Bars for the discount comparison. Promotions without a positive number are skipped and
/// at most [`MAX_CHART_POINTS`] are kept, in input order.
pub fn chart_data(promotions: &[Promotion]) -> Vec<ChartPoint> {
    promotions
        .iter()
        .filter_map(|p| {
            let discount = extract_discount(&p.discount).filter(|v| *v > 0)?;
            Some(ChartPoint {
                platform: p.platform,
                label: p.platform.short_label(),
                discount,
                full_discount: p.discount.clone(),
                title: p.title.clone(),
                color: p.platform.brand_color(),
            })
        })
        .take(MAX_CHART_POINTS)
        .collect()
}
