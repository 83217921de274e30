use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Public base URL of this API, used to build OAuth redirect URIs.
    pub app_base_url: String,
    /// Frontend URL the OAuth callbacks redirect back to (settings page).
    pub frontend_base_url: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub linkedin_client_id: String,
    pub linkedin_client_secret: String,
    pub anthropic_api_key: String,
    pub checkout_api_base: String,
    pub checkout_secret_key: String,
    pub checkout_webhook_secret: String,
    /// Shared secret for the external scheduler that triggers jobs.
    pub job_trigger_secret: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            app_base_url: require_env("APP_BASE_URL")?,
            frontend_base_url: require_env("FRONTEND_BASE_URL")?,
            google_client_id: require_env("GOOGLE_CLIENT_ID")?,
            google_client_secret: require_env("GOOGLE_CLIENT_SECRET")?,
            linkedin_client_id: require_env("LINKEDIN_CLIENT_ID")?,
            linkedin_client_secret: require_env("LINKEDIN_CLIENT_SECRET")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            checkout_api_base: std::env::var("CHECKOUT_API_BASE")
                .unwrap_or_else(|_| "https://api.stripe.com".to_string()),
            checkout_secret_key: require_env("CHECKOUT_SECRET_KEY")?,
            checkout_webhook_secret: require_env("CHECKOUT_WEBHOOK_SECRET")?,
            job_trigger_secret: require_env("JOB_TRIGGER_SECRET")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// URL of the settings page the OAuth callbacks land on.
    pub fn settings_url(&self) -> String {
        format!("{}/settings", self.frontend_base_url)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
