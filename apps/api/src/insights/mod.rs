//! LLM-backed career insights: Q&A over the user's own data and next-step
//! recommendations for a process.

pub mod handlers;
pub mod prompts;
