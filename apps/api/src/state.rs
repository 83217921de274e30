use std::sync::Arc;

use sqlx::PgPool;

use crate::billing::checkout::CheckoutClient;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::oauth::provider::ProviderRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Shared HTTP client for provider token endpoints, calendar reads,
    /// and token revocation.
    pub http: reqwest::Client,
    pub llm: LlmClient,
    pub checkout: CheckoutClient,
    /// OAuth provider endpoint configuration, built once at startup.
    pub providers: Arc<ProviderRegistry>,
    pub config: Config,
}
