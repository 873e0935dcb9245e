//! Payment rail clients.

pub mod bitcoin;
pub mod stripe;

pub use bitcoin::{BitcoinClient, BitcoinConfig, BitcoinQuote};
pub use stripe::{StripeClient, StripeConfig};
