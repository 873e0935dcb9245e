//! Subscription plan model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable plan identifier. Accounts and subscriptions reference plans by
/// tier, never by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Basic => "basic",
            PlanTier::Premium => "premium",
            PlanTier::Enterprise => "enterprise",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "free" => Some(PlanTier::Free),
            "basic" => Some(PlanTier::Basic),
            "premium" => Some(PlanTier::Premium),
            "enterprise" => Some(PlanTier::Enterprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily request allotment. `Unlimited` serializes as JSON `null`, a
/// counted allotment as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestAllowance {
    Unlimited,
    Remaining(u32),
}

impl RequestAllowance {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, RequestAllowance::Unlimited)
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, RequestAllowance::Remaining(0))
    }
}

/// Subscription plan.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub tier: PlanTier,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub features: Vec<String>,
    pub requests_per_day: RequestAllowance,
    pub providers: Vec<String>,
}
