//! Domain models shared by the core services and the HTTP layer.

pub mod application;
pub mod auth;
pub mod job;
