use crate::domain::promotion::{Platform, Promotion, PromotionAction};
use serde::Serialize;

pub const EMPTY_TIMELINE_MESSAGE: &str =
    "No time-sensitive actions detected right now. Check back later!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub promotion_id: String,
    pub platform: Platform,
    pub title: String,
    pub discount: String,
    /// Only the login-time and specific-date actions.
    pub actions: Vec<PromotionAction>,
}

/// Promotions that need the user at a given time or date, in input order.
pub fn action_timeline(promotions: &[Promotion]) -> Vec<TimelineEntry> {
    promotions
        .iter()
        .filter_map(|p| {
            let actions: Vec<_> = p
                .actions
                .iter()
                .filter(|a| a.action_type.is_time_sensitive())
                .cloned()
                .collect();
            if actions.is_empty() {
                return None;
            }
            Some(TimelineEntry {
                promotion_id: p.id.clone(),
                platform: p.platform,
                title: p.title.clone(),
                discount: p.discount.clone(),
                actions,
            })
        })
        .collect()
}
