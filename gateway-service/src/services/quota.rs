//! Quota gate. Decides whether an account may spend one request, applying
//! lazy daily resets: nothing runs on a timer, the window rolls over when
//! an exhausted account next shows up after its reset time.

use chrono::{DateTime, Duration, Utc};
use gateway_core::error::AppError;

use crate::models::{Account, RequestAllowance};
use crate::services::plans::PlanRegistry;

/// Evaluate one request against the account's allowance, mutating the
/// record in place. Must run inside an atomic store update so the
/// read-decide-write sequence cannot interleave with another request for
/// the same account.
///
/// An unlimited allowance passes through untouched. A counted allowance
/// is decremented; when it hits zero the first time, the reset timestamp
/// is scheduled 24 hours out. An exhausted allowance is refilled from the
/// plan once the reset time has passed, otherwise the request is denied
/// with the time the caller can retry.
pub fn evaluate(
    account: &mut Account,
    registry: &PlanRegistry,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    if let RequestAllowance::Remaining(remaining) = account.requests_remaining {
        if remaining == 0 {
            match account.requests_reset_at {
                Some(reset_at) if now >= reset_at => {
                    let plan = registry
                        .get(account.tier)
                        .ok_or_else(|| AppError::PlanNotFound(account.tier.to_string()))?;
                    account.requests_remaining = plan.requests_per_day;
                    account.requests_reset_at = Some(now + Duration::hours(24));
                }
                Some(reset_at) => {
                    return Err(AppError::QuotaExceeded {
                        tier: account.tier.to_string(),
                        next_reset: reset_at,
                    });
                }
                None => {
                    // Exhausted with no reset scheduled only happens when a
                    // plan seeds a zero allowance. Schedule the first window
                    // so the denial carries a concrete retry time.
                    let next_reset = now + Duration::hours(24);
                    account.requests_reset_at = Some(next_reset);
                    return Err(AppError::QuotaExceeded {
                        tier: account.tier.to_string(),
                        next_reset,
                    });
                }
            }
        }
    }

    if let RequestAllowance::Remaining(remaining) = &mut account.requests_remaining {
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 && account.requests_reset_at.is_none() {
            account.requests_reset_at = Some(now + Duration::hours(24));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PlanTier, RequestAllowance};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn account_with(
        tier: PlanTier,
        remaining: RequestAllowance,
        reset_at: Option<DateTime<Utc>>,
    ) -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "quota@example.com".to_string(),
            password_hash: "hash".to_string(),
            display_name: None,
            tier,
            requests_remaining: remaining,
            requests_reset_at: reset_at,
            created_utc: fixed_now(),
        }
    }

    #[test]
    fn allowed_request_consumes_exactly_one() {
        let registry = PlanRegistry::builtin();
        let mut account = account_with(PlanTier::Free, RequestAllowance::Remaining(5), None);

        evaluate(&mut account, &registry, fixed_now()).unwrap();

        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(4));
        assert_eq!(account.requests_reset_at, None);
    }

    #[test]
    fn reaching_zero_schedules_the_reset() {
        let registry = PlanRegistry::builtin();
        let now = fixed_now();
        let mut account = account_with(PlanTier::Free, RequestAllowance::Remaining(1), None);

        evaluate(&mut account, &registry, now).unwrap();

        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(0));
        assert_eq!(account.requests_reset_at, Some(now + Duration::hours(24)));
    }

    #[test]
    fn exhausted_account_is_denied_before_reset_time() {
        let registry = PlanRegistry::builtin();
        let now = fixed_now();
        let reset_at = now + Duration::hours(3);
        let mut account = account_with(
            PlanTier::Free,
            RequestAllowance::Remaining(0),
            Some(reset_at),
        );

        let err = evaluate(&mut account, &registry, now).unwrap_err();

        match err {
            AppError::QuotaExceeded { tier, next_reset } => {
                assert_eq!(tier, "free");
                assert_eq!(next_reset, reset_at);
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        // Denial leaves the record untouched.
        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(0));
        assert_eq!(account.requests_reset_at, Some(reset_at));
    }

    #[test]
    fn elapsed_reset_refills_from_the_plan_and_admits() {
        let registry = PlanRegistry::builtin();
        let now = fixed_now();
        let mut account = account_with(
            PlanTier::Free,
            RequestAllowance::Remaining(0),
            Some(now - Duration::minutes(1)),
        );

        evaluate(&mut account, &registry, now).unwrap();

        // Refilled to 5, then this request consumed one.
        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(4));
        assert_eq!(account.requests_reset_at, Some(now + Duration::hours(24)));
    }

    #[test]
    fn unlimited_allowance_passes_untouched() {
        let registry = PlanRegistry::builtin();
        let mut account = account_with(PlanTier::Enterprise, RequestAllowance::Unlimited, None);

        for _ in 0..50 {
            evaluate(&mut account, &registry, fixed_now()).unwrap();
        }

        assert_eq!(account.requests_remaining, RequestAllowance::Unlimited);
        assert_eq!(account.requests_reset_at, None);
    }

    #[test]
    fn zero_seed_without_reset_is_denied_and_scheduled() {
        let registry = PlanRegistry::builtin();
        let now = fixed_now();
        let mut account = account_with(PlanTier::Free, RequestAllowance::Remaining(0), None);

        let err = evaluate(&mut account, &registry, now).unwrap_err();

        match err {
            AppError::QuotaExceeded { next_reset, .. } => {
                assert_eq!(next_reset, now + Duration::hours(24));
            }
            other => panic!("expected QuotaExceeded, got {other:?}"),
        }
        assert_eq!(account.requests_reset_at, Some(now + Duration::hours(24)));
    }

    #[test]
    fn missing_plan_denies_the_refill() {
        let free = PlanRegistry::builtin().get(PlanTier::Free).unwrap().clone();
        let registry = PlanRegistry::new(vec![free]).unwrap();
        let now = fixed_now();
        let mut account = account_with(
            PlanTier::Premium,
            RequestAllowance::Remaining(0),
            Some(now - Duration::minutes(1)),
        );

        let err = evaluate(&mut account, &registry, now).unwrap_err();
        assert!(matches!(err, AppError::PlanNotFound(_)));
    }

    #[test]
    fn free_plan_runs_through_a_full_day_cycle() {
        let registry = PlanRegistry::builtin();
        let now = fixed_now();
        let mut account = account_with(PlanTier::Free, RequestAllowance::Remaining(5), None);

        for _ in 0..5 {
            evaluate(&mut account, &registry, now).unwrap();
        }
        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(0));
        let reset_at = account.requests_reset_at.unwrap();
        assert_eq!(reset_at, now + Duration::hours(24));

        // Sixth call inside the window is denied.
        let err = evaluate(&mut account, &registry, now).unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded { .. }));

        // Past the reset the allowance refills and the call goes through.
        let later = reset_at + Duration::minutes(1);
        evaluate(&mut account, &registry, later).unwrap();
        assert_eq!(account.requests_remaining, RequestAllowance::Remaining(4));
        assert_eq!(account.requests_reset_at, Some(later + Duration::hours(24)));
    }
}
