//! Application startup and lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;

use gateway_core::error::AppError;
use gateway_core::middleware::rate_limit::{create_ip_rate_limiter, IpRateLimiter};
use tokio::net::TcpListener;

use crate::build_router;
use crate::config::GatewayConfig;
use crate::services::payments::{BitcoinClient, StripeClient};
use crate::services::providers::{
    AnthropicAdapter, DeepSeekAdapter, GeminiAdapter, MockAdapter, OpenAiAdapter, ProviderAdapter,
};
use crate::services::{
    init_metrics, AccountStore, InMemoryAccountStore, JwtService, PlanRegistry, ProviderDispatcher,
    SubscriptionService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub accounts: Arc<dyn AccountStore>,
    pub plans: Arc<PlanRegistry>,
    pub dispatcher: Arc<ProviderDispatcher>,
    pub subscriptions: SubscriptionService,
    pub jwt: JwtService,
    pub auth_rate_limiter: IpRateLimiter,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: GatewayConfig) -> Result<Self, AppError> {
        init_metrics();

        let plans = Arc::new(PlanRegistry::builtin());
        let accounts: Arc<dyn AccountStore> = Arc::new(InMemoryAccountStore::new());

        // Adapters are registered whether or not their key is set: the
        // model catalog stays browsable and dispatch reports the missing
        // key per call.
        let mut adapters: Vec<Arc<dyn ProviderAdapter>> = vec![
            Arc::new(OpenAiAdapter::new(config.providers.openai_api_key.clone())),
            Arc::new(GeminiAdapter::new(config.providers.gemini_api_key.clone())),
            Arc::new(DeepSeekAdapter::new(
                config.providers.deepseek_api_key.clone(),
            )),
            Arc::new(AnthropicAdapter::new(
                config.providers.anthropic_api_key.clone(),
            )),
        ];
        if config.providers.mock_enabled {
            adapters.push(Arc::new(MockAdapter::new()));
        }
        let dispatcher = Arc::new(ProviderDispatcher::new(adapters));

        let stripe = StripeClient::new(config.payments.stripe.clone());
        let bitcoin = BitcoinClient::new(config.payments.bitcoin.clone());
        let subscriptions =
            SubscriptionService::new(accounts.clone(), plans.clone(), stripe, bitcoin);

        let jwt = JwtService::new(&config.auth.jwt_secret, config.auth.token_expiry_hours);

        let auth_rate_limiter = create_ip_rate_limiter(
            config.auth.rate_limit_attempts,
            config.auth.rate_limit_window_seconds,
        );

        let state = AppState {
            config: config.clone(),
            accounts,
            plans,
            dispatcher,
            subscriptions,
            jwt,
            auth_rate_limiter,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port = port, "Gateway listener bound");

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Get a handle to the account store, for test harnesses.
    pub fn accounts(&self) -> Arc<dyn AccountStore> {
        self.state.accounts.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state);

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
