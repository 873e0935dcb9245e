//! Services layer for gateway-service.
//!
//! Business logic for the quota gate, plan catalog, provider dispatch,
//! and subscription billing.

pub mod dispatcher;
pub mod jwt;
pub mod metrics;
pub mod payments;
pub mod plans;
pub mod providers;
pub mod quota;
pub mod store;
pub mod subscriptions;

pub use dispatcher::ProviderDispatcher;
pub use jwt::{AccessTokenClaims, JwtService};
pub use metrics::{
    get_metrics, init_metrics, record_prompt, record_provider_error, record_provider_latency,
    record_quota_denied, track_http_metrics,
};
pub use plans::PlanRegistry;
pub use store::{AccountStore, InMemoryAccountStore};
pub use subscriptions::{SubscribeOutcome, SubscriptionService};
