//! Subscription lifecycle.
//!
//! Selecting a paid plan creates a subscription awaiting payment plus a
//! pending payment record; the plan is applied to the account only once the
//! payment settles (card webhook or bitcoin deposit check). Selecting the
//! free plan applies immediately and creates no subscription record.
//! Subscriptions are never deleted, only moved to canceled.

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use gateway_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Account, Payment, PaymentMethod, PaymentReference, PaymentStatus, PlanTier, Subscription,
    SubscriptionStatus,
};
use crate::services::payments::{BitcoinClient, StripeClient};
use crate::services::plans::PlanRegistry;
use crate::services::store::AccountStore;

/// Length of one billing period.
const PERIOD_DAYS: i64 = 30;

#[derive(Clone)]
pub struct SubscriptionService {
    accounts: Arc<dyn AccountStore>,
    plans: Arc<PlanRegistry>,
    subscriptions: Arc<DashMap<Uuid, Subscription>>,
    payments: Arc<DashMap<Uuid, Payment>>,
    stripe: StripeClient,
    bitcoin: BitcoinClient,
}

/// Result of a plan selection.
#[derive(Debug)]
pub enum SubscribeOutcome {
    /// Free plan: applied to the account immediately.
    Applied(Account),
    /// Paid plan: a payment must settle before the plan takes effect.
    PaymentRequired {
        subscription: Subscription,
        payment: Payment,
        client_secret: Option<String>,
    },
}

impl SubscriptionService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        plans: Arc<PlanRegistry>,
        stripe: StripeClient,
        bitcoin: BitcoinClient,
    ) -> Self {
        Self {
            accounts,
            plans,
            subscriptions: Arc::new(DashMap::new()),
            payments: Arc::new(DashMap::new()),
            stripe,
            bitcoin,
        }
    }

    /// Select a plan for an account.
    pub async fn subscribe(
        &self,
        account_id: Uuid,
        tier: PlanTier,
        method: Option<PaymentMethod>,
    ) -> Result<SubscribeOutcome, AppError> {
        let account = self
            .accounts
            .find(account_id)
            .await?
            .ok_or(AppError::AccountNotFound(account_id))?;

        if account.tier == tier {
            return Err(AppError::Conflict(anyhow!(
                "account is already on the {} plan",
                tier
            )));
        }

        let plan = self
            .plans
            .get(tier)
            .ok_or_else(|| AppError::PlanNotFound(tier.to_string()))?;

        if plan.price.is_zero() {
            self.cancel_active_subscriptions(account_id);
            let account = self.apply_plan(account_id, tier).await?;
            return Ok(SubscribeOutcome::Applied(account));
        }

        let method = method.ok_or_else(|| {
            AppError::BadRequest(anyhow!("payment_method is required for paid plans"))
        })?;

        let now = Utc::now();
        let subscription = Subscription {
            id: Uuid::new_v4(),
            account_id,
            tier,
            status: SubscriptionStatus::PastDue,
            current_period_start: now,
            current_period_end: now + Duration::days(PERIOD_DAYS),
            payment_method: method,
            created_utc: now,
            updated_utc: now,
        };

        let (reference, client_secret) = match method {
            PaymentMethod::Card => {
                let intent = self
                    .stripe
                    .create_payment_intent(&plan.price, &plan.currency)
                    .await?;
                (
                    PaymentReference::CardIntent {
                        intent_id: intent.id,
                    },
                    Some(intent.client_secret),
                )
            }
            PaymentMethod::Bitcoin => {
                let quote = self.bitcoin.quote_deposit(&plan.price)?;
                (
                    PaymentReference::BitcoinDeposit {
                        address: quote.address,
                        amount_btc: quote.amount_btc,
                    },
                    None,
                )
            }
        };

        let payment = Payment {
            id: Uuid::new_v4(),
            account_id,
            subscription_id: subscription.id,
            amount: plan.price,
            currency: plan.currency.clone(),
            status: PaymentStatus::Pending,
            method,
            reference,
            created_utc: now,
            updated_utc: now,
        };

        self.subscriptions
            .insert(subscription.id, subscription.clone());
        self.payments.insert(payment.id, payment.clone());

        tracing::info!(
            account_id = %account_id,
            tier = %tier,
            method = method.as_str(),
            "Subscription created, awaiting payment"
        );

        Ok(SubscribeOutcome::PaymentRequired {
            subscription,
            payment,
            client_secret,
        })
    }

    /// The account's newest non-canceled subscription, if any.
    pub fn current_subscription(&self, account_id: Uuid) -> Option<Subscription> {
        self.subscriptions
            .iter()
            .filter(|entry| {
                entry.account_id == account_id && entry.status != SubscriptionStatus::Canceled
            })
            .max_by_key(|entry| entry.created_utc)
            .map(|entry| entry.value().clone())
    }

    /// Cancel the account's current subscription and drop back to the free
    /// plan. The subscription record is kept with canceled status.
    pub async fn cancel(&self, account_id: Uuid) -> Result<Subscription, AppError> {
        let current = self
            .current_subscription(account_id)
            .ok_or_else(|| AppError::NotFound(anyhow!("no subscription to cancel")))?;

        let now = Utc::now();
        if let Some(mut sub) = self.subscriptions.get_mut(&current.id) {
            sub.status = SubscriptionStatus::Canceled;
            sub.updated_utc = now;
        }

        self.apply_plan(account_id, PlanTier::Free).await?;

        tracing::info!(
            account_id = %account_id,
            subscription_id = %current.id,
            "Subscription canceled"
        );

        Ok(self
            .subscriptions
            .get(&current.id)
            .map(|entry| entry.value().clone())
            .unwrap_or(current))
    }

    /// Fetch a payment, scoped to its owner.
    pub fn get_payment(&self, payment_id: Uuid, account_id: Uuid) -> Result<Payment, AppError> {
        self.payments
            .get(&payment_id)
            .filter(|entry| entry.account_id == account_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::NotFound(anyhow!("payment not found")))
    }

    /// Handle a card webhook delivery: verify the signature, then settle or
    /// fail the referenced payment.
    pub async fn handle_card_webhook(
        &self,
        signature: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        let valid = self.stripe.verify_webhook_signature(payload, signature)?;
        if !valid {
            return Err(AppError::Unauthorized(anyhow!("invalid webhook signature")));
        }

        let event = self
            .stripe
            .parse_webhook_event(payload)
            .map_err(|e| AppError::BadRequest(anyhow!("malformed webhook payload: {}", e)))?;

        match event.event_type.as_str() {
            "payment_intent.succeeded" => self.complete_card_payment(&event.data.object.id).await,
            "payment_intent.payment_failed" => self.fail_card_payment(&event.data.object.id),
            other => {
                tracing::debug!(event_type = other, "Ignoring webhook event");
                Ok(())
            }
        }
    }

    /// Settle the payment referencing a card intent.
    pub async fn complete_card_payment(&self, intent_id: &str) -> Result<(), AppError> {
        match self.payment_for_intent(intent_id) {
            Some(payment_id) => self.activate_payment(payment_id).await,
            None => Err(AppError::NotFound(anyhow!(
                "no payment for intent {}",
                intent_id
            ))),
        }
    }

    /// Mark the payment referencing a card intent as failed. The
    /// subscription stays past_due; the payer can retry from the client.
    pub fn fail_card_payment(&self, intent_id: &str) -> Result<(), AppError> {
        let payment_id = self.payment_for_intent(intent_id).ok_or_else(|| {
            AppError::NotFound(anyhow!("no payment for intent {}", intent_id))
        })?;

        if let Some(mut payment) = self.payments.get_mut(&payment_id) {
            if payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Failed;
                payment.updated_utc = Utc::now();
                tracing::warn!(payment_id = %payment_id, "Card payment failed");
            }
        }
        Ok(())
    }

    /// Poll the deposit address of a bitcoin payment. When the quoted
    /// amount has arrived, the payment settles and the plan is applied.
    pub async fn check_bitcoin_payment(
        &self,
        payment_id: Uuid,
        account_id: Uuid,
    ) -> Result<Payment, AppError> {
        let payment = self.get_payment(payment_id, account_id)?;

        let (address, amount_btc) = match &payment.reference {
            PaymentReference::BitcoinDeposit {
                address,
                amount_btc,
            } => (address.clone(), *amount_btc),
            _ => {
                return Err(AppError::BadRequest(anyhow!(
                    "payment is not a bitcoin deposit"
                )));
            }
        };

        if payment.status == PaymentStatus::Completed {
            return Ok(payment);
        }

        let funded = self.bitcoin.address_funded(&address, &amount_btc).await?;
        if funded {
            self.activate_payment(payment_id).await?;
        }

        self.get_payment(payment_id, account_id)
    }

    fn payment_for_intent(&self, intent_id: &str) -> Option<Uuid> {
        self.payments.iter().find_map(|entry| match &entry.reference {
            PaymentReference::CardIntent { intent_id: id } if id == intent_id => Some(entry.id),
            _ => None,
        })
    }

    /// Settle a pending payment: activate its subscription, retire any
    /// competing ones, and apply the plan to the account. Idempotent.
    async fn activate_payment(&self, payment_id: Uuid) -> Result<(), AppError> {
        let (account_id, subscription_id, already_completed) = {
            let payment = self
                .payments
                .get(&payment_id)
                .ok_or_else(|| AppError::NotFound(anyhow!("payment not found")))?;
            (
                payment.account_id,
                payment.subscription_id,
                payment.status == PaymentStatus::Completed,
            )
        };

        if already_completed {
            return Ok(());
        }

        let tier = {
            let subscription = self
                .subscriptions
                .get(&subscription_id)
                .ok_or_else(|| AppError::NotFound(anyhow!("subscription not found")))?;
            subscription.tier
        };

        // Retire whatever was active before this one takes over.
        self.cancel_active_subscriptions(account_id);

        let now = Utc::now();
        if let Some(mut subscription) = self.subscriptions.get_mut(&subscription_id) {
            subscription.status = SubscriptionStatus::Active;
            subscription.current_period_start = now;
            subscription.current_period_end = now + Duration::days(PERIOD_DAYS);
            subscription.updated_utc = now;
        }
        if let Some(mut payment) = self.payments.get_mut(&payment_id) {
            payment.status = PaymentStatus::Completed;
            payment.updated_utc = now;
        }

        self.apply_plan(account_id, tier).await?;

        tracing::info!(
            payment_id = %payment_id,
            account_id = %account_id,
            tier = %tier,
            "Payment completed, subscription activated"
        );

        Ok(())
    }

    fn cancel_active_subscriptions(&self, account_id: Uuid) {
        let now = Utc::now();
        for mut entry in self.subscriptions.iter_mut() {
            if entry.account_id == account_id && entry.is_active() {
                entry.status = SubscriptionStatus::Canceled;
                entry.updated_utc = now;
            }
        }
    }

    /// Re-seed the account from a plan: tier, fresh allowance, and no
    /// scheduled reset until the new allowance is first exhausted.
    async fn apply_plan(&self, account_id: Uuid, tier: PlanTier) -> Result<Account, AppError> {
        let plan = self
            .plans
            .get(tier)
            .ok_or_else(|| AppError::PlanNotFound(tier.to_string()))?;
        let allowance = plan.requests_per_day;

        let account = self
            .accounts
            .update(account_id, &mut |account| {
                account.tier = tier;
                account.requests_remaining = allowance;
                account.requests_reset_at = None;
            })
            .await?;

        tracing::info!(account_id = %account_id, tier = %tier, "Plan applied to account");
        Ok(account)
    }
}
