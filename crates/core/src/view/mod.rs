use crate::domain::promotion::{GroundingSource, Promotion};
use crate::store::dashboard::DashboardSnapshot;
use crate::time::clock::format_updated_at;
use chrono::FixedOffset;
use serde::Serialize;

pub mod chart;
pub mod filter;
pub mod timeline;

pub use chart::ChartPoint;
pub use filter::Tab;
pub use timeline::TimelineEntry;

pub const TITLE: &str = "Travel Promo Scout";
pub const SUBTITLE: &str = "Automated Deal Aggregator";
pub const MAX_DISPLAYED_SOURCES: usize = 5;

const EMPTY_TITLE: &str = "No promotions found";
const EMPTY_HINT: &str = "Try clicking \"Scan Now\" to fetch the latest deals.";

/// Everything a shell needs to draw the dashboard, already filtered and derived.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub tabs: Vec<TabView>,
    pub active_tab: &'static str,
    pub loading: bool,
    pub error: Option<String>,
    pub cards: Vec<Promotion>,
    pub empty_state: Option<EmptyState>,
    pub chart: Vec<ChartPoint>,
    pub timeline: Vec<TimelineEntry>,
    pub timeline_empty_message: Option<&'static str>,
    pub sources: Vec<GroundingSource>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabView {
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptyState {
    pub title: &'static str,
    pub hint: &'static str,
}

impl DashboardView {
    pub fn build(snapshot: &DashboardSnapshot, tab: Tab, offset: FixedOffset) -> Self {
        let data = &snapshot.data;
        let loading = snapshot.loading;

        let tabs = Tab::all()
            .into_iter()
            .map(|t| TabView {
                label: t.label(),
                active: t == tab,
            })
            .collect();

        // Skeletons while loading: nothing derived from stale data is shown.
        let (cards, empty_state, chart, timeline, sources) = if loading {
            (Vec::new(), None, Vec::new(), Vec::new(), Vec::new())
        } else {
            let cards: Vec<Promotion> = filter::filter_promotions(&data.promotions, tab)
                .into_iter()
                .cloned()
                .collect();
            let empty_state = cards.is_empty().then_some(EmptyState {
                title: EMPTY_TITLE,
                hint: EMPTY_HINT,
            });
            (
                cards,
                empty_state,
                chart::chart_data(&data.promotions),
                timeline::action_timeline(&data.promotions),
                data.sources
                    .iter()
                    .take(MAX_DISPLAYED_SOURCES)
                    .cloned()
                    .collect(),
            )
        };

        let timeline_empty_message =
            (!loading && timeline.is_empty()).then_some(timeline::EMPTY_TIMELINE_MESSAGE);

        Self {
            title: TITLE,
            subtitle: SUBTITLE,
            tabs,
            active_tab: tab.label(),
            loading,
            error: snapshot.error.clone(),
            cards,
            empty_state,
            chart,
            timeline,
            timeline_empty_message,
            sources,
            last_updated: data.last_updated.map(|ts| format_updated_at(ts, offset)),
        }
    }
}
