//! OAuth connections to external providers.
//!
//! One generic handshake (redirect + callback) serves every provider; the
//! per-provider differences live entirely in `ProviderRegistry`. Token
//! records are persisted one-per-(user, provider) with upsert-on-reconnect
//! semantics, and reads go through `ensure_fresh_access_token` so an
//! expired-within-buffer token is never presented to a provider API.

pub mod handshake;
pub mod provider;
pub mod tokens;
