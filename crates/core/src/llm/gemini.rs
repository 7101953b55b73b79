use crate::config::Settings;
use crate::domain::promotion::{Platform, PromoDataState};
use crate::llm::error::FetchError;
use crate::llm::json;
use crate::llm::PromotionSource;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 90;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    // The key is checked on every fetch so a missing key surfaces as a scan error, not a
    // startup crash.
    settings: Settings,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> Result<Self, FetchError> {
        let timeout_secs = settings.gemini_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            http,
            settings: settings.clone(),
            base_url: settings
                .gemini_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: settings
                .gemini_model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, FetchError> {
        let api_key = self.settings.require_gemini_api_key()?;

        let res = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(req)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        let text = check_status(status, text)?;

        Ok(serde_json::from_str::<GenerateContentResponse>(&text)?)
    }

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: scout_prompt(),
                }],
            }],
            // No response mime type: JSON mode cannot be combined with the search tool.
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
        }
    }
}

#[async_trait::async_trait]
impl PromotionSource for GeminiClient {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn fetch_promotions(&self) -> Result<PromoDataState, FetchError> {
        let res = self.generate_content(&Self::request()).await.map_err(|err| {
            tracing::error!(model = %self.model, error = %err, "error fetching promotions");
            err
        })?;

        let state = res.into_state(Utc::now());
        tracing::info!(
            model = %self.model,
            promotions = state.promotions.len(),
            sources = state.sources.len(),
            "fetched promotions"
        );
        Ok(state)
    }
}

/// Maps a non-2xx status to the matching error and hands the body back otherwise.
fn check_status(status: StatusCode, body: String) -> Result<String, FetchError> {
    if status == StatusCode::FORBIDDEN {
        return Err(FetchError::Forbidden { body });
    }
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

pub fn scout_prompt() -> String {
    let platforms = Platform::ALL
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(", ");

    [
        "I need you to act as a travel deal aggregator.".to_string(),
        format!(
            "Search for the current and upcoming major promotional campaigns for the following websites: {platforms}."
        ),
        String::new(),
        "Specifically look for:".to_string(),
        "1. \"Double Digit\" sales (e.g., 11.11, 12.12).".to_string(),
        "2. \"Flash Sales\" that require login at specific times (e.g., after 12:00 PM).".to_string(),
        "3. Bank promotions or App-exclusive deals.".to_string(),
        String::new(),
        "Return the data as a STRICT JSON array of objects inside a markdown code block (```json ... ```).".to_string(),
        "Each object should have the following structure:".to_string(),
        "{".to_string(),
        "  \"id\": \"unique_string\",".to_string(),
        format!("  \"platform\": \"One of [{platforms}]\","),
        "  \"title\": \"Short catchy title\",".to_string(),
        "  \"description\": \"Brief details\",".to_string(),
        "  \"discount\": \"e.g. 50% OFF\",".to_string(),
        "  \"period\": \"e.g. 10 Dec - 12 Dec\",".to_string(),
        "  \"tags\": [\"Flight\", \"Hotel\", \"Flash Sale\"],".to_string(),
        "  \"link\": \"Optional URL of the campaign page\",".to_string(),
        "  \"actions\": [".to_string(),
        "    {".to_string(),
        "      \"type\": \"LOGIN_TIME\" | \"SPECIFIC_DATE\" | \"APP_ONLY\" | \"COUPON_CODE\" | \"NONE\",".to_string(),
        "      \"description\": \"What the user must do, e.g. 'Login after 12:00 PM'\",".to_string(),
        "      \"targetTime\": \"Optional ISO date or time string\"".to_string(),
        "    }".to_string(),
        "  ]".to_string(),
        "}".to_string(),
        String::new(),
        format!(
            "Ensure you cover all {} platforms. If no specific live data is found for a platform, provide the most common recurring deal for that platform (e.g. AirAsia Super Sale).",
            Platform::ALL.len()
        ),
    ]
    .join("\n")
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    tools: Vec<Tool>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Clone, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,

    // Kept untyped: grounding chunks come in several shapes and only `web` matters here.
    #[serde(default)]
    grounding_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate that carries any.
    fn reply_text(&self) -> &str {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .find(|t| !t.is_empty())
            })
            .unwrap_or("")
    }

    pub(crate) fn into_state(self, now: DateTime<Utc>) -> PromoDataState {
        let text = self.reply_text();
        if text.is_empty() {
            tracing::warn!("model response carried no text");
        }
        let promotions = json::parse_promotions(text);
        let sources = json::parse_grounding_sources(
            self.candidates
                .first()
                .and_then(|c| c.grounding_metadata.as_ref()),
        );

        PromoDataState {
            promotions,
            sources,
            last_updated: Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn response(value: serde_json::Value) -> GenerateContentResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn request_enables_google_search() {
        let body = serde_json::to_value(GeminiClient::request()).unwrap();
        assert_eq!(body["tools"], json!([{"google_search": {}}]));
        assert_eq!(body["contents"][0]["role"], json!("user"));
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        for platform in Platform::ALL {
            assert!(prompt.contains(platform.name()));
        }
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn check_status_translates_403() {
        let err = check_status(StatusCode::FORBIDDEN, "denied".to_string()).unwrap_err();
        assert!(err.is_permission_denied());

        let err = check_status(StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()).unwrap_err();
        assert!(matches!(err, FetchError::Http { status: 500, .. }));
        assert_ne!(
            err.user_message(),
            FetchError::Forbidden {
                body: String::new()
            }
            .user_message()
        );

        assert_eq!(check_status(StatusCode::OK, "{}".to_string()).unwrap(), "{}");
    }

    #[test]
    fn into_state_reads_first_text_part_and_sources() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 4, 30, 0).unwrap();
        let res = response(json!({
            "candidates": [{
                "content": {"parts": [
                    {"thought": true},
                    {"text": "```json\n[{\"id\":\"a\",\"platform\":\"Agoda\",\"title\":\"Agoda VIP\",\"discount\":\"25% OFF\"}]\n```"},
                    {"text": "ignored trailing part"}
                ]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://agoda.example", "title": "agoda.com"}},
                    {"web": {"title": "missing uri"}}
                ]}
            }]
        }));

        let state = res.into_state(now);
        assert_eq!(state.promotions.len(), 1);
        assert_eq!(state.promotions[0].id, "a");
        assert_eq!(state.sources.len(), 1);
        assert_eq!(state.sources[0].uri, "https://agoda.example");
        assert_eq!(state.last_updated, Some(now));
    }

    #[test]
    fn into_state_tolerates_empty_response() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 4, 30, 0).unwrap();
        let state = response(json!({})).into_state(now);
        assert!(state.promotions.is_empty());
        assert!(state.sources.is_empty());
        assert_eq!(state.last_updated, Some(now));
    }

    #[tokio::test]
    async fn fetch_without_key_fails_fast() {
        let settings = Settings {
            gemini_api_key: None,
            // Unroutable; the request must never be attempted.
            gemini_base_url: Some("http://127.0.0.1:9".to_string()),
            ..Settings::default()
        };
        let client = GeminiClient::from_settings(&settings).unwrap();
        let err = client.fetch_promotions().await.unwrap_err();
        assert!(matches!(err, FetchError::MissingCredential));
    }
}
