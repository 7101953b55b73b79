use std::path::PathBuf;
use thiserror::Error;

const GENERIC_MESSAGE: &str =
    "Failed to fetch latest promotions. Please try again or check your connection.";
const MISSING_CREDENTIAL_MESSAGE: &str =
    "API key is missing. Please set GEMINI_API_KEY in your environment.";
const FORBIDDEN_MESSAGE: &str = "Permission denied (403). Check that the API key is valid and \
that its HTTP referrer/origin restrictions allow this dashboard.";

/// Why a scan failed. Malformed model output is not an error: it yields an empty list.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GEMINI_API_KEY is required")]
    MissingCredential,

    #[error("Gemini rejected the request (status 403): {body}")]
    Forbidden { body: String },

    #[error("Gemini HTTP error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("Gemini request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode Gemini response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to read saved reply {path}: {source}")]
    ReplyFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Text for the dashboard's error banner.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::MissingCredential => MISSING_CREDENTIAL_MESSAGE,
            FetchError::Forbidden { .. } => FORBIDDEN_MESSAGE,
            _ => GENERIC_MESSAGE,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, FetchError::Forbidden { .. })
    }
}
