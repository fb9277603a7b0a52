//! # eyb_api
//!
//! HTTP surface for End Your Bias. Two routers share this crate: the
//! authorization server (login page, login submission, token exchange) and
//! the recruiting API (applications, jobs, OAuth callback).

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use eyb_core::applications::ApplicationRepository;
use eyb_core::auth::codes::{AuthorizationCodeStore, MemoryCodeStore};
use eyb_core::auth::jwt::TokenIssuer;
use eyb_core::auth::registry::Registry;
use eyb_core::auth::sessions::{MemorySessionStore, SessionStore};
use eyb_core::censor::Anonymizer;
use eyb_core::jobs::JobRepository;
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{applications, callback, health, jobs, oauth};

/// Route paths served by the two routers.
pub mod routes {
    pub const GET_LOGIN: &str = "/login";
    pub const POST_OAUTH_LOGIN: &str = "/api/oauth/login";
    pub const POST_OAUTH_TOKEN: &str = "/api/oauth/token";
    pub const GET_HEALTH: &str = "/health";

    pub const GET_AUTH_CALLBACK: &str = "/auth/callback";
    pub const APPLICATION: &str = "/api/application";
    pub const GET_APPLICATION_CENSORED: &str = "/api/application/censored";
    pub const GET_APPLICATION_VIEWED: &str = "/api/application/viewed";
    pub const GET_APPLICATION_UNCENSORED: &str = "/api/application/uncensored";
    pub const GET_APPLICATION_CANDIDATE: &str = "/api/application/candidate";
    pub const GET_JOB: &str = "/api/job";
    pub const GET_JOB_AVAILABLE: &str = "/api/job/available";
    pub const GET_JOB_RECRUITER: &str = "/api/job/recruiter";
}

/// State of the authorization server.
#[derive(Clone)]
pub struct AuthState {
    pub config: ApiConfig,
    pub registry: Arc<Registry>,
    pub sessions: Arc<dyn SessionStore>,
    pub codes: Arc<dyn AuthorizationCodeStore>,
    pub tokens: TokenIssuer,
}

impl AuthState {
    /// Authorization server state backed by fresh in-memory stores.
    pub fn in_memory(config: ApiConfig, registry: Registry, codes: Arc<MemoryCodeStore>) -> Self {
        let tokens = TokenIssuer::new(config.jwt_secret.as_bytes(), &config.issuer);
        Self {
            config,
            registry: Arc::new(registry),
            sessions: Arc::new(MemorySessionStore::new()),
            codes,
            tokens,
        }
    }
}

/// State of the recruiting API.
#[derive(Clone)]
pub struct ApiState {
    pub config: ApiConfig,
    pub applications: Arc<dyn ApplicationRepository>,
    pub jobs: Arc<dyn JobRepository>,
    pub anonymizer: Arc<dyn Anonymizer>,
    /// Verifies access tokens minted by the authorization server.
    pub tokens: TokenIssuer,
    /// Client for the token exchange made by the OAuth callback.
    pub http: reqwest::Client,
}

/// Run embedded database migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    eyb_core::db::migrate(pool).await
}

/// Builds the authorization server router.
pub fn auth_router(state: AuthState) -> Router {
    Router::new()
        .route(routes::GET_LOGIN, get(oauth::login_page))
        .route(routes::POST_OAUTH_LOGIN, post(oauth::login_submit))
        .route(routes::POST_OAUTH_TOKEN, post(oauth::token))
        .route(routes::GET_HEALTH, get(health::auth_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the recruiting API router.
pub fn api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::api_health))
        .route(routes::GET_AUTH_CALLBACK, get(callback::oauth_callback))
        .route(routes::GET_JOB, get(jobs::get_job))
        .route(routes::GET_JOB_AVAILABLE, get(jobs::available_jobs));

    // Protected routes (valid access token; roles checked per handler)
    let protected = Router::new()
        .route(
            routes::APPLICATION,
            post(applications::submit_application_handler)
                .put(applications::change_state_handler),
        )
        .route(
            routes::GET_APPLICATION_CENSORED,
            get(applications::censored_handler),
        )
        .route(
            routes::GET_APPLICATION_VIEWED,
            get(applications::viewed_handler),
        )
        .route(
            routes::GET_APPLICATION_UNCENSORED,
            get(applications::uncensored_handler),
        )
        .route(
            routes::GET_APPLICATION_CANDIDATE,
            get(applications::candidate_handler),
        )
        .route(routes::GET_JOB_RECRUITER, get(jobs::recruiter_jobs))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
