use crate::domain::promotion::PromoDataState;
use crate::llm::error::FetchError;
use crate::llm::PromotionSource;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// The single in-memory slot behind the dashboard: current data, error banner and a loading
/// flag that keeps at most one scan in flight.
#[derive(Debug, Default)]
pub struct Dashboard {
    slot: RwLock<Slot>,
    loading: AtomicBool,
}

#[derive(Debug, Default)]
struct Slot {
    data: PromoDataState,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Updated { promotions: usize, sources: usize },
    /// Another scan was already running; the source was not called.
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub data: PromoDataState,
    pub loading: bool,
    pub error: Option<String>,
}

struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Runs one scan. On success the whole state is replaced and the banner cleared; on
    /// failure the previous data stays and the banner shows the error's user message.
    pub async fn refresh(
        &self,
        source: &dyn PromotionSource,
    ) -> Result<RefreshOutcome, FetchError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!(source = source.name(), "scan already in flight");
            return Ok(RefreshOutcome::Busy);
        }
        let _guard = LoadingGuard(&self.loading);

        self.slot.write().await.error = None;

        match source.fetch_promotions().await {
            Ok(data) => {
                let outcome = RefreshOutcome::Updated {
                    promotions: data.promotions.len(),
                    sources: data.sources.len(),
                };
                let mut slot = self.slot.write().await;
                slot.data = data;
                slot.error = None;
                Ok(outcome)
            }
            Err(err) => {
                tracing::warn!(source = source.name(), error = %err, "scan failed; keeping previous data");
                self.slot.write().await.error = Some(err.user_message().to_string());
                Err(err)
            }
        }
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        let slot = self.slot.read().await;
        DashboardSnapshot {
            data: slot.data.clone(),
            loading: self.is_loading(),
            error: slot.error.clone(),
        }
    }
}
