//! # eyb_core
//!
//! Core domain logic for End Your Bias: the OAuth2 authorization-code
//! machinery, the application review state machine, and the persistence and
//! anonymization collaborators the recruiting API relies on.

pub mod applications;
pub mod auth;
pub mod censor;
pub mod db;
pub mod ids;
pub mod jobs;
pub mod models;
pub mod review;
