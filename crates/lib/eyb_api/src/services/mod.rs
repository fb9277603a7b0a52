//! Helpers shared by handlers.

pub mod cookies;
pub mod token_client;
