//! Application sessions.
//!
//! Identity comes from the hosted auth provider; this module only maps an
//! external identity onto a local user row and a session cookie. Handlers
//! receive the session explicitly as a `CurrentUser` extractor argument;
//! nothing resolves the "current user" ambiently mid-function.

pub mod handlers;
pub mod session;

pub use session::CurrentUser;
