pub mod achievement;
pub mod billing;
pub mod contact;
pub mod pipeline;
pub mod token;
pub mod user;
