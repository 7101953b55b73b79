pub mod domain;
pub mod llm;
pub mod store;
pub mod time;
pub mod view;

pub mod config {
    use crate::llm::error::FetchError;

    // Baked in at compile time, mirroring a build-time substituted key.
    const BUILD_TIME_API_KEY: Option<&str> = option_env!("GEMINI_API_KEY");

    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub gemini_base_url: Option<String>,
        pub gemini_model: Option<String>,
        pub gemini_timeout_secs: Option<u64>,
        pub display_utc_offset_minutes: Option<i32>,
        pub sentry_dsn: Option<String>,
        pub port: Option<u16>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
            let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let gemini_api_key = var("GEMINI_API_KEY")
                .or_else(|| var("API_KEY"))
                .or_else(|| {
                    BUILD_TIME_API_KEY
                        .filter(|v| !v.trim().is_empty())
                        .map(str::to_string)
                });

            let display_utc_offset_minutes = match var("DISPLAY_UTC_OFFSET_MINUTES") {
                Some(s) => Some(s.trim().parse::<i32>().map_err(|e| {
                    anyhow::anyhow!("DISPLAY_UTC_OFFSET_MINUTES must be an integer (got {s:?}): {e}")
                })?),
                None => None,
            };

            Ok(Self {
                gemini_api_key,
                gemini_base_url: var("GEMINI_BASE_URL"),
                gemini_model: var("GEMINI_MODEL"),
                gemini_timeout_secs: var("GEMINI_TIMEOUT_SECS").and_then(|s| s.parse().ok()),
                display_utc_offset_minutes,
                sentry_dsn: var("SENTRY_DSN"),
                port: var("PORT").and_then(|s| s.parse().ok()),
            })
        }

        pub fn require_gemini_api_key(&self) -> Result<&str, FetchError> {
            self.gemini_api_key
                .as_deref()
                .ok_or(FetchError::MissingCredential)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::collections::HashMap;

        fn settings(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
            let env: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            Settings::from_lookup(|key| env.get(key).cloned())
        }

        #[test]
        fn prefers_gemini_api_key_over_api_key() {
            let s = settings(&[("GEMINI_API_KEY", "g-key"), ("API_KEY", "plain")]).unwrap();
            assert_eq!(s.require_gemini_api_key().unwrap(), "g-key");
        }

        #[test]
        fn falls_back_to_api_key() {
            let s = settings(&[("API_KEY", "plain")]).unwrap();
            assert_eq!(s.gemini_api_key.as_deref(), Some("plain"));
        }

        #[test]
        fn blank_values_count_as_missing() {
            let s = settings(&[("GEMINI_MODEL", "   "), ("PORT", "8080")]).unwrap();
            assert!(s.gemini_model.is_none());
            assert_eq!(s.port, Some(8080));
        }

        #[test]
        fn rejects_non_numeric_display_offset() {
            assert!(settings(&[("DISPLAY_UTC_OFFSET_MINUTES", "UTC+7")]).is_err());
            let s = settings(&[("DISPLAY_UTC_OFFSET_MINUTES", "420")]).unwrap();
            assert_eq!(s.display_utc_offset_minutes, Some(420));
        }
    }
}
