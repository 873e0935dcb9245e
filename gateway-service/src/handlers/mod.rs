//! HTTP handlers for the gateway.

pub mod auth;
pub mod catalog;
pub mod metrics;
pub mod payments;
pub mod prompt;
pub mod subscriptions;

pub use auth::*;
pub use catalog::*;
pub use payments::*;
pub use prompt::*;
pub use subscriptions::*;
