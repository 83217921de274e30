//! Google Calendar integration: event listing and disconnect.

pub mod client;
pub mod handlers;
