use promoscout_core::view::DashboardView;
use std::fmt::Write;

const BAR_WIDTH: u32 = 40;

pub fn render_text(view: &DashboardView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} | {}", view.title, view.subtitle);
    if let Some(updated) = &view.last_updated {
        let _ = writeln!(out, "Updated: {updated}");
    }
    if let Some(error) = &view.error {
        let _ = writeln!(out, "\n! Connection Error: {error}");
    }

    if !view.chart.is_empty() {
        let max = view.chart.iter().map(|p| p.discount).max().unwrap_or(1).max(1);
        let _ = writeln!(out, "\nMax Discount Comparison (%)");
        for point in &view.chart {
            let len =
                (u64::from(point.discount) * u64::from(BAR_WIDTH) / u64::from(max)).max(1) as usize;
            let _ = writeln!(
                out,
                "  {:<10} {} {}",
                point.label,
                "#".repeat(len),
                point.full_discount
            );
        }
    }

    let tabs: Vec<String> = view
        .tabs
        .iter()
        .map(|t| {
            if t.active {
                format!("[{}]", t.label)
            } else {
                t.label.to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "\n{}", tabs.join("  "));

    if let Some(empty) = &view.empty_state {
        let _ = writeln!(out, "\n{}\n{}", empty.title, empty.hint);
    }
    for promo in &view.cards {
        let _ = writeln!(out, "\n[{}] {} ({})", promo.platform, promo.title, promo.discount);
        if !promo.description.is_empty() {
            let _ = writeln!(out, "  {}", promo.description);
        }
        if !promo.period.is_empty() {
            let _ = writeln!(out, "  Period: {}", promo.period);
        }
        if !promo.tags.is_empty() {
            let _ = writeln!(out, "  Tags: {}", promo.tags.join(", "));
        }
        for action in &promo.actions {
            let _ = writeln!(
                out,
                "  - {}: {}",
                action.action_type.wire_name(),
                action.description
            );
        }
        if let Some(link) = &promo.link {
            let _ = writeln!(out, "  {link}");
        }
    }

    let _ = writeln!(out, "\nAction Plan");
    if let Some(message) = view.timeline_empty_message {
        let _ = writeln!(out, "  {message}");
    } else {
        let _ = writeln!(out, "  Critical Actions ({} Upcoming)", view.timeline.len());
        for entry in &view.timeline {
            let _ = writeln!(out, "  {} {} - {}", entry.platform, entry.discount, entry.title);
            for action in &entry.actions {
                let when = action
                    .target_time
                    .as_deref()
                    .map(|t| format!(" @ {t}"))
                    .unwrap_or_default();
                let _ = writeln!(out, "    * {}{when}", action.description);
            }
        }
    }

    if !view.sources.is_empty() {
        let _ = writeln!(out, "\nIntelligence Sources");
        for source in &view.sources {
            let _ = writeln!(out, "  {} <{}>", source.title, source.uri);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use promoscout_core::domain::promotion::{
        ActionType, Platform, PromoDataState, Promotion, PromotionAction,
    };
    use promoscout_core::store::dashboard::DashboardSnapshot;
    use promoscout_core::view::Tab;

    #[test]
    fn renders_cards_chart_and_timeline() {
        let snapshot = DashboardSnapshot {
            data: PromoDataState {
                promotions: vec![Promotion {
                    id: "aa".to_string(),
                    platform: Platform::AirAsia,
                    title: "Super Sale".to_string(),
                    description: "Free seats".to_string(),
                    discount: "80% OFF".to_string(),
                    period: "1 Nov - 7 Nov".to_string(),
                    tags: vec!["Flight".to_string()],
                    actions: vec![PromotionAction {
                        action_type: ActionType::LoginTime,
                        description: "Login at midnight".to_string(),
                        target_time: Some("00:00".to_string()),
                        is_completed: None,
                    }],
                    link: None,
                }],
                sources: Vec::new(),
                last_updated: Some(Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap()),
            },
            loading: false,
            error: None,
        };
        let view = DashboardView::build(&snapshot, Tab::All, FixedOffset::east_opt(0).unwrap());
        let text = render_text(&view);

        assert!(text.contains("Updated: 09:30"));
        assert!(text.contains("[All]"));
        assert!(text.contains("[AirAsia] Super Sale (80% OFF)"));
        assert!(text.contains(&format!("{} 80% OFF", "#".repeat(BAR_WIDTH as usize))));
        assert!(text.contains("Login at midnight @ 00:00"));
    }
}
