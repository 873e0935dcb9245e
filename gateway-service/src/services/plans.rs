//! Plan catalog. The registry is the single source of truth for what each
//! tier costs, allows, and exposes; quota resets and subscription changes
//! both read from it.

use anyhow::anyhow;
use gateway_core::error::AppError;
use rust_decimal::Decimal;

use crate::models::{Plan, PlanTier, RequestAllowance};

pub struct PlanRegistry {
    plans: Vec<Plan>,
}

impl PlanRegistry {
    /// Build a registry from a plan list. Rejects an empty catalog and
    /// duplicate tiers, so lookups by tier are unambiguous.
    pub fn new(plans: Vec<Plan>) -> Result<Self, AppError> {
        if plans.is_empty() {
            return Err(AppError::ConfigError(anyhow!(
                "plan catalog must not be empty"
            )));
        }
        for (i, plan) in plans.iter().enumerate() {
            if plans[..i].iter().any(|p| p.tier == plan.tier) {
                return Err(AppError::ConfigError(anyhow!(
                    "duplicate plan for tier: {}",
                    plan.tier
                )));
            }
        }
        Ok(Self { plans })
    }

    /// The built-in catalog, ordered cheapest first.
    pub fn builtin() -> Self {
        Self::new(vec![
            Plan {
                tier: PlanTier::Free,
                name: "Free".to_string(),
                price: Decimal::ZERO,
                currency: "USD".to_string(),
                features: vec![
                    "5 requests per day".to_string(),
                    "OpenAI and Gemini models".to_string(),
                    "Community support".to_string(),
                ],
                requests_per_day: RequestAllowance::Remaining(5),
                providers: vec!["openai".to_string(), "gemini".to_string()],
            },
            Plan {
                tier: PlanTier::Basic,
                name: "Basic".to_string(),
                price: Decimal::new(999, 2),
                currency: "USD".to_string(),
                features: vec![
                    "100 requests per day".to_string(),
                    "OpenAI, Gemini and DeepSeek models".to_string(),
                    "Email support".to_string(),
                ],
                requests_per_day: RequestAllowance::Remaining(100),
                providers: vec![
                    "openai".to_string(),
                    "gemini".to_string(),
                    "deepseek".to_string(),
                ],
            },
            Plan {
                tier: PlanTier::Premium,
                name: "Premium".to_string(),
                price: Decimal::new(2999, 2),
                currency: "USD".to_string(),
                features: vec![
                    "1000 requests per day".to_string(),
                    "All supported providers, including Anthropic".to_string(),
                    "Priority support".to_string(),
                ],
                requests_per_day: RequestAllowance::Remaining(1000),
                providers: vec![
                    "openai".to_string(),
                    "gemini".to_string(),
                    "deepseek".to_string(),
                    "anthropic".to_string(),
                ],
            },
            Plan {
                tier: PlanTier::Enterprise,
                name: "Enterprise".to_string(),
                price: Decimal::new(9999, 2),
                currency: "USD".to_string(),
                features: vec![
                    "Unlimited requests".to_string(),
                    "All supported providers, including Anthropic".to_string(),
                    "Dedicated support".to_string(),
                ],
                requests_per_day: RequestAllowance::Unlimited,
                providers: vec![
                    "openai".to_string(),
                    "gemini".to_string(),
                    "deepseek".to_string(),
                    "anthropic".to_string(),
                ],
            },
        ])
        .expect("built-in plan catalog is valid")
    }

    /// All plans, in catalog order.
    pub fn list(&self) -> &[Plan] {
        &self.plans
    }

    /// Look up the plan for a tier.
    pub fn get(&self, tier: PlanTier) -> Option<&Plan> {
        self.plans.iter().find(|p| p.tier == tier)
    }

    /// The plan new accounts start on.
    pub fn default_plan(&self) -> &Plan {
        // new() guarantees the catalog is non-empty
        &self.plans[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_has_one_plan_per_tier() {
        let registry = PlanRegistry::builtin();
        assert_eq!(registry.list().len(), 4);
        assert_eq!(registry.default_plan().tier, PlanTier::Free);

        for tier in [
            PlanTier::Free,
            PlanTier::Basic,
            PlanTier::Premium,
            PlanTier::Enterprise,
        ] {
            let plan = registry.get(tier).unwrap();
            assert_eq!(plan.tier, tier);
        }
    }

    #[test]
    fn builtin_catalog_is_ordered_cheapest_first() {
        let registry = PlanRegistry::builtin();
        let prices: Vec<Decimal> = registry.list().iter().map(|p| p.price).collect();
        let mut sorted = prices.clone();
        sorted.sort();
        assert_eq!(prices, sorted);
    }

    #[test]
    fn rejects_duplicate_tiers() {
        let plan = PlanRegistry::builtin().get(PlanTier::Free).unwrap().clone();
        let result = PlanRegistry::new(vec![plan.clone(), plan]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_empty_catalog() {
        assert!(PlanRegistry::new(vec![]).is_err());
    }
}
