use crate::domain::promotion::PromoDataState;
use crate::llm::error::FetchError;
use crate::llm::gemini::GenerateContentResponse;
use crate::llm::json;
use crate::llm::PromotionSource;
use chrono::Utc;
use std::path::PathBuf;

/// Replays a saved model reply from disk instead of calling the API.
///
/// The file may hold either a full `generateContent` response body (grounding sources are
/// read from it too) or just the model's text reply.
#[derive(Debug, Clone)]
pub struct ReplyFileSource {
    path: PathBuf,
}

impl ReplyFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl PromotionSource for ReplyFileSource {
    fn name(&self) -> &'static str {
        "reply-file"
    }

    async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| FetchError::ReplyFile {
                path: self.path.clone(),
                source,
            })?;

        Ok(state_from_saved_reply(&raw))
    }
}

fn state_from_saved_reply(raw: &str) -> PromoDataState {
    let now = Utc::now();
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) if value.get("candidates").is_some() => {
            match serde_json::from_value::<GenerateContentResponse>(value) {
                Ok(res) => return res.into_state(now),
                Err(err) => {
                    tracing::warn!(error = %err, "saved response envelope is malformed; treating file as reply text");
                }
            }
        }
        _ => {}
    }

    PromoDataState {
        promotions: json::parse_promotions(raw),
        sources: Vec::new(),
        last_updated: Some(now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_full_response_envelope() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "[{\"id\":\"t\",\"platform\":\"Trip.com\",\"title\":\"Trip deals\"}]"}]},
                "groundingMetadata": {"groundingChunks": [{"web": {"uri": "https://trip.example", "title": "trip.com"}}]}
            }]
        })
        .to_string();

        let state = state_from_saved_reply(&raw);
        assert_eq!(state.promotions.len(), 1);
        assert_eq!(state.sources.len(), 1);
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn reads_bare_reply_text() {
        let raw = "Here are the deals:\n```json\n[{\"id\":\"b\",\"platform\":\"Booking.com\",\"title\":\"Late Escape\"}]\n```";
        let state = state_from_saved_reply(raw);
        assert_eq!(state.promotions.len(), 1);
        assert_eq!(state.promotions[0].id, "b");
        assert!(state.sources.is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let source = ReplyFileSource::new("/definitely/not/here/reply.txt");
        let err = source.fetch_promotions().await.unwrap_err();
        assert!(matches!(err, FetchError::ReplyFile { .. }));
    }
}
