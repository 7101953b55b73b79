use crate::domain::promotion::PromoDataState;
use crate::llm::error::FetchError;

pub mod error;
pub mod gemini;
pub mod json;
pub mod reply_file;

/// Anything that can produce a fresh set of promotions.
#[async_trait::async_trait]
pub trait PromotionSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError>;
}
