//! Provider endpoint configuration for the generic OAuth handshake.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Config;

/// Supported external providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    GoogleCalendar,
    Linkedin,
}

impl Provider {
    /// Canonical identifier, used in route paths and as the DB key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GoogleCalendar => "google_calendar",
            Provider::Linkedin => "linkedin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "google_calendar" => Some(Provider::GoogleCalendar),
            "linkedin" => Some(Provider::Linkedin),
            _ => None,
        }
    }

    /// Short name used in user-facing redirect query parameters,
    /// e.g. `error=calendar_auth_failed`.
    pub fn error_slug(&self) -> &'static str {
        match self {
            Provider::GoogleCalendar => "calendar",
            Provider::Linkedin => "linkedin",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the handshake needs to know about one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: Provider,
    /// Parsed once at startup so the connect path never re-parses it.
    pub auth_url: Url,
    pub token_url: String,
    pub revoke_url: Option<String>,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// Extra query parameters for the authorization redirect
    /// (e.g. `access_type=offline` so Google issues a refresh token).
    pub extra_auth_params: &'static [(&'static str, &'static str)],
}

impl ProviderConfig {
    /// The redirect URI registered with the provider for this deployment.
    pub fn redirect_uri(&self, app_base_url: &str) -> String {
        format!(
            "{}/api/v1/oauth/{}/callback",
            app_base_url,
            self.provider.as_str()
        )
    }
}

/// Provider configurations built once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    google_calendar: ProviderConfig,
    linkedin: ProviderConfig,
}

impl ProviderRegistry {
    pub fn from_config(config: &Config) -> Self {
        Self {
            google_calendar: ProviderConfig {
                provider: Provider::GoogleCalendar,
                auth_url: Url::parse("https://accounts.google.com/o/oauth2/v2/auth")
                    .expect("static authorize URL"),
                token_url: "https://oauth2.googleapis.com/token".to_string(),
                revoke_url: Some("https://oauth2.googleapis.com/revoke".to_string()),
                client_id: config.google_client_id.clone(),
                client_secret: config.google_client_secret.clone(),
                scope: "https://www.googleapis.com/auth/calendar.readonly".to_string(),
                // Offline access + forced consent so a refresh token is issued.
                extra_auth_params: &[("access_type", "offline"), ("prompt", "consent")],
            },
            linkedin: ProviderConfig {
                provider: Provider::Linkedin,
                auth_url: Url::parse("https://www.linkedin.com/oauth/v2/authorization")
                    .expect("static authorize URL"),
                token_url: "https://www.linkedin.com/oauth/v2/accessToken".to_string(),
                revoke_url: Some("https://www.linkedin.com/oauth/v2/revoke".to_string()),
                client_id: config.linkedin_client_id.clone(),
                client_secret: config.linkedin_client_secret.clone(),
                scope: "openid profile email".to_string(),
                extra_auth_params: &[],
            },
        }
    }

    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::GoogleCalendar => &self.google_calendar,
            Provider::Linkedin => &self.linkedin,
        }
    }
}

/// Builds the provider consent-screen URL with the CSRF state embedded.
pub fn build_authorize_url(cfg: &ProviderConfig, redirect_uri: &str, state: &str) -> String {
    let mut url = cfg.auth_url.clone();
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("response_type", "code")
            .append_pair("client_id", &cfg.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("scope", &cfg.scope)
            .append_pair("state", state);
        for (k, v) in cfg.extra_auth_params {
            pairs.append_pair(k, v);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            provider: Provider::GoogleCalendar,
            auth_url: Url::parse("https://accounts.google.com/o/oauth2/v2/auth").unwrap(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            revoke_url: None,
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            scope: "https://www.googleapis.com/auth/calendar.readonly".to_string(),
            extra_auth_params: &[("access_type", "offline")],
        }
    }

    #[test]
    fn test_provider_round_trip() {
        assert_eq!(
            Provider::from_str("google_calendar"),
            Some(Provider::GoogleCalendar)
        );
        assert_eq!(Provider::from_str("linkedin"), Some(Provider::Linkedin));
        assert_eq!(Provider::from_str("github"), None);
        assert_eq!(Provider::GoogleCalendar.as_str(), "google_calendar");
    }

    #[test]
    fn test_authorize_url_carries_state_and_extras() {
        let cfg = test_config();
        let url = build_authorize_url(&cfg, "https://app.example.com/cb", "nonce-abc");

        let parsed = url::Url::parse(&url).unwrap();
        let params: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(params.contains(&("response_type".into(), "code".into())));
        assert!(params.contains(&("client_id".into(), "client-123".into())));
        assert!(params.contains(&("state".into(), "nonce-abc".into())));
        assert!(params.contains(&("access_type".into(), "offline".into())));
        assert!(params.contains(&(
            "redirect_uri".into(),
            "https://app.example.com/cb".into()
        )));
    }

    #[test]
    fn test_registry_parses_endpoints_at_construction() {
        let config = Config {
            database_url: "postgres://localhost/test".to_string(),
            app_base_url: "https://api.example.com".to_string(),
            frontend_base_url: "https://app.example.com".to_string(),
            google_client_id: "gid".to_string(),
            google_client_secret: "gsecret".to_string(),
            linkedin_client_id: "lid".to_string(),
            linkedin_client_secret: "lsecret".to_string(),
            anthropic_api_key: "key".to_string(),
            checkout_api_base: "https://api.stripe.com".to_string(),
            checkout_secret_key: "sk".to_string(),
            checkout_webhook_secret: "whsec".to_string(),
            job_trigger_secret: "job".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        };

        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(
            registry.get(Provider::GoogleCalendar).auth_url.host_str(),
            Some("accounts.google.com")
        );
        assert_eq!(
            registry.get(Provider::Linkedin).auth_url.host_str(),
            Some("www.linkedin.com")
        );
    }

    #[test]
    fn test_redirect_uri_shape() {
        let cfg = test_config();
        assert_eq!(
            cfg.redirect_uri("https://api.example.com"),
            "https://api.example.com/api/v1/oauth/google_calendar/callback"
        );
    }
}
