//! Request handlers.

pub mod applications;
pub mod callback;
pub mod health;
pub mod jobs;
pub mod oauth;
