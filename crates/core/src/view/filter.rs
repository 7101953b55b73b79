use crate::domain::promotion::{Platform, Promotion};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const ALL_TAB: &str = "All";

/// Active platform filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    All,
    Platform(Platform),
}

#[derive(Debug, Clone, Error)]
#[error("unknown tab {0:?}; expected All or one of the platform names")]
pub struct UnknownTab(pub String);

impl Tab {
    /// `All` followed by every platform in declaration order.
    pub fn all() -> Vec<Tab> {
        std::iter::once(Tab::All)
            .chain(Platform::ALL.into_iter().map(Tab::Platform))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::All => ALL_TAB,
            Tab::Platform(p) => p.name(),
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL_TAB) {
            return Ok(Tab::All);
        }
        Platform::from_name(s)
            .map(Tab::Platform)
            .ok_or_else(|| UnknownTab(s.to_string()))
    }
}

pub fn filter_promotions(promotions: &[Promotion], tab: Tab) -> Vec<&Promotion> {
    match tab {
        Tab::All => promotions.iter().collect(),
        Tab::Platform(platform) => promotions
            .iter()
            .filter(|p| p.platform == platform)
            .collect(),
    }
}
