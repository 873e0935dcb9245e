use gateway_core::config as core_config;
use gateway_core::error::AppError;
use rust_decimal::Decimal;
use secrecy::Secret;
use std::env;
use std::str::FromStr;

const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 24;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub auth: AuthConfig,
    pub providers: ProviderConfig,
    pub payments: PaymentConfig,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_expiry_hours: i64,
    /// Allowed register/login attempts per IP within the window.
    pub rate_limit_attempts: u32,
    pub rate_limit_window_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub openai_api_key: Secret<String>,
    pub gemini_api_key: Secret<String>,
    pub deepseek_api_key: Secret<String>,
    pub anthropic_api_key: Secret<String>,
    /// Registers the in-process mock provider alongside the real ones.
    pub mock_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct PaymentConfig {
    pub stripe: crate::services::payments::StripeConfig,
    pub bitcoin: crate::services::payments::BitcoinConfig,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let btc_usd_rate = get_env("BITCOIN_USD_RATE", Some("65000"), is_prod)?;
        let btc_usd_rate = Decimal::from_str(&btc_usd_rate).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("BITCOIN_USD_RATE is not a number: {}", e))
        })?;

        Ok(GatewayConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("gateway-service"), is_prod)?,
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env(
                    "JWT_SECRET",
                    Some("dev-jwt-secret-change-me"),
                    is_prod,
                )?),
                token_expiry_hours: get_env(
                    "TOKEN_EXPIRY_HOURS",
                    Some(&DEFAULT_TOKEN_EXPIRY_HOURS.to_string()),
                    is_prod,
                )?
                .parse()
                .unwrap_or(DEFAULT_TOKEN_EXPIRY_HOURS),
                rate_limit_attempts: get_env("AUTH_RATE_LIMIT_ATTEMPTS", Some("10"), is_prod)?
                    .parse()
                    .unwrap_or(10),
                rate_limit_window_seconds: get_env(
                    "AUTH_RATE_LIMIT_WINDOW_SECONDS",
                    Some("60"),
                    is_prod,
                )?
                .parse()
                .unwrap_or(60),
            },
            providers: ProviderConfig {
                // Provider keys are optional: an adapter with no key stays
                // listed in the catalog and fails only when dispatched to.
                openai_api_key: Secret::new(env::var("OPENAI_API_KEY").unwrap_or_default()),
                gemini_api_key: Secret::new(env::var("GEMINI_API_KEY").unwrap_or_default()),
                deepseek_api_key: Secret::new(env::var("DEEPSEEK_API_KEY").unwrap_or_default()),
                anthropic_api_key: Secret::new(env::var("ANTHROPIC_API_KEY").unwrap_or_default()),
                mock_enabled: env::var("MOCK_PROVIDER_ENABLED").unwrap_or_default() == "true",
            },
            payments: PaymentConfig {
                stripe: crate::services::payments::StripeConfig {
                    secret_key: Secret::new(env::var("STRIPE_SECRET_KEY").unwrap_or_default()),
                    webhook_secret: Secret::new(
                        env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                    ),
                    api_base_url: get_env(
                        "STRIPE_API_BASE",
                        Some("https://api.stripe.com/v1"),
                        is_prod,
                    )?,
                },
                bitcoin: crate::services::payments::BitcoinConfig {
                    receive_address: env::var("BITCOIN_RECEIVE_ADDRESS").unwrap_or_default(),
                    explorer_api_base: get_env(
                        "BITCOIN_EXPLORER_API",
                        Some("https://blockstream.info/api"),
                        is_prod,
                    )?,
                    btc_usd_rate,
                },
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
