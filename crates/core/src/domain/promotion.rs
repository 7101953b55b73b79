use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Travel booking sites the scout knows about. The display name doubles as the wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    Traveloka,
    #[serde(rename = "Trip.com")]
    TripCom,
    Agoda,
    #[serde(rename = "Booking.com")]
    BookingCom,
    AirAsia,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Traveloka,
        Platform::TripCom,
        Platform::Agoda,
        Platform::BookingCom,
        Platform::AirAsia,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Platform::Traveloka => "Traveloka",
            Platform::TripCom => "Trip.com",
            Platform::Agoda => "Agoda",
            Platform::BookingCom => "Booking.com",
            Platform::AirAsia => "AirAsia",
        }
    }

    /// Case-insensitive match on the display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    /// Chart axis label: the name up to its first '.' ("Trip.com" -> "Trip").
    pub fn short_label(self) -> &'static str {
        let name = self.name();
        name.split('.').next().unwrap_or(name)
    }

    pub fn brand_color(self) -> &'static str {
        match self {
            Platform::Traveloka => "#3b82f6",
            Platform::TripCom => "#2563eb",
            Platform::Agoda => "#9333ea",
            Platform::BookingCom => "#1e3a8a",
            Platform::AirAsia => "#dc2626",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    /// Log in at (or after) a given time, e.g. a noon flash sale.
    LoginTime,
    SpecificDate,
    AppOnly,
    CouponCode,
    #[serde(rename = "NONE")]
    NoAction,
}

impl ActionType {
    /// Lenient decoding of model output. Unknown values collapse to `NoAction`.
    pub fn from_wire(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_uppercase(),
            })
            .collect();

        match normalized.as_str() {
            "LOGIN_TIME" | "REQUIRES_LOGIN_AT_TIME" => ActionType::LoginTime,
            "SPECIFIC_DATE" | "REQUIRES_SPECIFIC_DATE" => ActionType::SpecificDate,
            "APP_ONLY" => ActionType::AppOnly,
            "COUPON_CODE" | "REQUIRES_COUPON_CODE" => ActionType::CouponCode,
            _ => ActionType::NoAction,
        }
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            ActionType::LoginTime => "LOGIN_TIME",
            ActionType::SpecificDate => "SPECIFIC_DATE",
            ActionType::AppOnly => "APP_ONLY",
            ActionType::CouponCode => "COUPON_CODE",
            ActionType::NoAction => "NONE",
        }
    }

    pub fn is_time_sensitive(self) -> bool {
        matches!(self, ActionType::LoginTime | ActionType::SpecificDate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    // Carried through from the model; nothing reads it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: String,
    pub platform: Platform,
    pub title: String,
    pub description: String,
    /// Free text, e.g. "50% OFF".
    pub discount: String,
    pub period: String,
    pub tags: Vec<String>,
    pub actions: Vec<PromotionAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

/// Everything one scan produces. Replaced wholesale on every successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoDataState {
    pub promotions: Vec<Promotion>,
    pub sources: Vec<GroundingSource>,
    pub last_updated: Option<DateTime<Utc>>,
}
