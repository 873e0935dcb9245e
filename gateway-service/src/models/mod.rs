//! Domain models for gateway-service.

mod account;
mod payment;
mod plan;
mod subscription;

pub use account::{
    Account, AccountResponse, AuthResponse, LoginRequest, RegisterRequest, TokenResponse,
};
pub use payment::{Payment, PaymentMethod, PaymentReference, PaymentStatus};
pub use plan::{Plan, PlanTier, RequestAllowance};
pub use subscription::{Subscription, SubscriptionStatus};
