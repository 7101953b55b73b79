use crate::domain::contract::LlmPromotion;
use crate::domain::promotion::{GroundingSource, Promotion};
use serde_json::Value;

/// Returns the body of the first ```json fence, else of the first plain ``` fence, else the
/// whole text.
pub fn extract_json(text: &str) -> &str {
    if let Some(body) = fenced_body(text, "```json") {
        return body;
    }
    if let Some(body) = fenced_body(text, "```") {
        return strip_info_string(body);
    }
    text.trim()
}

fn fenced_body<'a>(text: &'a str, opener: &str) -> Option<&'a str> {
    let start = text.find(opener)? + opener.len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

// A plain fence may still carry a language tag on its first line ("```JSON", "```js").
fn strip_info_string(body: &str) -> &str {
    match body.split_once('\n') {
        Some((first, rest))
            if !first.is_empty() && first.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            rest.trim()
        }
        _ => body,
    }
}

/// Parses the model's reply into promotions. Never fails: a reply that is not a JSON array
/// yields an empty list, and individual items that cannot be normalised are skipped.
pub fn parse_promotions(text: &str) -> Vec<Promotion> {
    let json_str = extract_json(text);
    let items = match serde_json::from_str::<Vec<Value>>(json_str) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(
                error = %err,
                raw_text = %text,
                "failed to parse model JSON response; falling back to empty list"
            );
            return Vec::new();
        }
    };

    let total = items.len();
    let promotions: Vec<Promotion> = items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let decoded = serde_json::from_value::<LlmPromotion>(item)
                .map_err(anyhow::Error::from)
                .and_then(LlmPromotion::validate_and_into_promotion);
            match decoded {
                Ok(promotion) => Some(promotion),
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping malformed promotion");
                    None
                }
            }
        })
        .collect();

    if promotions.len() < total {
        tracing::info!(total, kept = promotions.len(), "dropped malformed promotions");
    }
    promotions
}

/// Reads `groundingChunks[].web.{uri,title}` out of a candidate's grounding metadata.
/// Chunks without a web entry, a uri or a title are dropped; order is preserved.
pub fn parse_grounding_sources(grounding_metadata: Option<&Value>) -> Vec<GroundingSource> {
    let Some(chunks) = grounding_metadata
        .and_then(|m| m.get("groundingChunks"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.get("web")?;
            let uri = non_empty_str(web.get("uri"))?;
            let title = non_empty_str(web.get("title"))?;
            Some(GroundingSource {
                title: title.to_string(),
                uri: uri.to_string(),
            })
        })
        .collect()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
