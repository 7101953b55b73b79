use promoscout_core::domain::promotion::{ActionType, Platform};
use promoscout_core::view::{ChartPoint, DashboardView};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};
use thiserror::Error;

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("../templates/dashboard.html");

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("dashboard template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to encode dashboard view: {0}")]
    Encode(#[from] serde_json::Error),
}

// Bar widths are relative to the largest discount on the chart.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartBar<'a> {
    label: &'a str,
    width: u64,
    color: &'a str,
    full_discount: &'a str,
}

fn chart_bars(chart: &[ChartPoint]) -> Vec<ChartBar<'_>> {
    let max = chart.iter().map(|p| p.discount).max().unwrap_or(1).max(1);
    chart
        .iter()
        .map(|point| ChartBar {
            label: point.label,
            width: (u64::from(point.discount) * 100 / u64::from(max)).max(1),
            color: point.color,
            full_discount: &point.full_discount,
        })
        .collect()
}

/// Renders the dashboard page. The template name ends in `.html`, so tera autoescapes every
/// interpolated model string.
pub fn render_dashboard(view: &DashboardView) -> Result<String, RenderError> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
    tera.register_filter("brand_color", brand_color);
    tera.register_filter("action_icon", action_icon);

    let mut context = Context::from_value(serde_json::to_value(view)?)?;
    context.insert("bars", &chart_bars(&view.chart));

    Ok(tera.render(TEMPLATE_NAME, &context)?)
}

fn brand_color(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let name = tera::try_get_value!("brand_color", "value", String, value);
    let platform = Platform::from_name(&name)
        .ok_or_else(|| tera::Error::msg(format!("unknown platform {name:?}")))?;
    Ok(Value::from(platform.brand_color()))
}

fn action_icon(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let wire = tera::try_get_value!("action_icon", "value", String, value);
    let icon = match ActionType::from_wire(&wire) {
        ActionType::LoginTime => "\u{23F0}",
        ActionType::SpecificDate => "\u{1F4C5}",
        ActionType::AppOnly => "\u{1F4F1}",
        ActionType::CouponCode => "\u{1F3F7}",
        ActionType::NoAction => "\u{279C}",
    };
    Ok(Value::from(icon))
}
