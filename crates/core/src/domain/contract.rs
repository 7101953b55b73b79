use crate::domain::promotion::{ActionType, Platform, Promotion, PromotionAction};
use anyhow::anyhow;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// Loosely-typed shape of one item in the model's JSON array. Null or missing keys decode to
// defaults, and scalars of the wrong type are coerced rather than failing the item. Only the
// platform is mandatory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmPromotion {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub platform: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub discount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub period: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_actions")]
    pub actions: Vec<LlmPromotionAction>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmPromotionAction {
    #[serde(default, rename = "type", deserialize_with = "lenient_string")]
    pub action_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_completed: Option<bool>,
}

impl LlmPromotion {
    pub fn validate_and_into_promotion(self) -> anyhow::Result<Promotion> {
        let raw_platform = self
            .platform
            .ok_or_else(|| anyhow!("promotion is missing a platform"))?;
        let platform = Platform::from_name(&raw_platform)
            .ok_or_else(|| anyhow!("unknown platform: {raw_platform:?}"))?;

        let id = non_blank(self.id).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let tags: Vec<String> = self
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        let actions = self
            .actions
            .into_iter()
            .map(LlmPromotionAction::into_action)
            .collect();

        Ok(Promotion {
            id,
            platform,
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default().trim().to_string(),
            discount: self.discount.unwrap_or_default().trim().to_string(),
            period: self.period.unwrap_or_default().trim().to_string(),
            tags,
            actions,
            link: non_blank(self.link),
        })
    }
}

impl LlmPromotionAction {
    fn into_action(self) -> PromotionAction {
        PromotionAction {
            action_type: self
                .action_type
                .as_deref()
                .map(ActionType::from_wire)
                .unwrap_or(ActionType::NoAction),
            description: self.description.unwrap_or_default().trim().to_string(),
            target_time: non_blank(self.target_time),
            is_completed: self.is_completed,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

// Non-scalar entries are skipped one at a time; a non-array decodes as empty.
fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.into_iter().filter_map(scalar_to_string).collect(),
        _ => Vec::new(),
    })
}

fn lenient_actions<'de, D>(deserializer: D) -> Result<Vec<LlmPromotionAction>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
