//! Coaching session bookings paid through a hosted checkout.

pub mod checkout;
pub mod handlers;
