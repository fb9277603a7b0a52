//! Server configuration.

use std::time::Duration;

use eyb_core::auth::registry::FRONTEND_CLIENT_ID;
use thiserror::Error;

/// Configuration errors, raised at startup only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Configuration shared by the authorization server and the recruiting API.
#[derive(Clone)]
pub struct ApiConfig {
    pub environment: Environment,
    /// Address of the authorization server listener (e.g. "127.0.0.1:4000").
    pub auth_bind_addr: String,
    /// Address of the recruiting API listener (e.g. "127.0.0.1:3000").
    pub api_bind_addr: String,
    /// Public base URL of the authorization server; the `iss` of every token.
    pub issuer: String,
    pub jwt_secret: String,
    pub database_url: String,
    pub censor_host: String,
    pub censor_port: u16,
    pub censor_timeout: Duration,
    pub frontend_client_id: String,
    pub frontend_redirect_uri: String,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("environment", &self.environment)
            .field("auth_bind_addr", &self.auth_bind_addr)
            .field("api_bind_addr", &self.api_bind_addr)
            .field("issuer", &self.issuer)
            .field("jwt_secret", &"***REDACTED***")
            .field("database_url", &"***REDACTED***")
            .field("censor_host", &self.censor_host)
            .field("censor_port", &self.censor_port)
            .field("censor_timeout", &self.censor_timeout)
            .field("frontend_client_id", &self.frontend_client_id)
            .field("frontend_redirect_uri", &self.frontend_redirect_uri)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from the process environment.
    ///
    /// | Variable                | Default                                  |
    /// |-------------------------|------------------------------------------|
    /// | `EYB_ENV`               | `development`                            |
    /// | `AUTH_BIND_ADDR`        | `127.0.0.1:4000`                         |
    /// | `API_BIND_ADDR`         | `127.0.0.1:3000`                         |
    /// | `AUTH_ISSUER`           | `http://localhost:4000`                  |
    /// | `AUTH_JWT_SECRET`       | dev secret (required in production)      |
    /// | `DATABASE_URL`          | built from `POSTGRES_*` (required in production) |
    /// | `CENSOR_HOST` / `CENSOR_PORT` | `localhost` / `8000` (required in production) |
    /// | `CENSOR_TIMEOUT_SECS`   | `30`                                     |
    /// | `FRONTEND_CLIENT_ID`    | `eyb-frontend`                           |
    /// | `FRONTEND_REDIRECT_URI` | `http://localhost:3000/auth/callback`    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ApiConfig::from_env`] but reading variables through `lookup`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get("EYB_ENV").as_deref() {
            None | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "EYB_ENV",
                    value: other.to_string(),
                });
            }
        };
        let production = environment == Environment::Production;

        // Required in production, defaulted in development.
        let required = |key: &'static str, dev_default: &str| -> Result<String, ConfigError> {
            match get(key) {
                Some(v) => Ok(v),
                None if production => Err(ConfigError::Missing(key)),
                None => Ok(dev_default.to_string()),
            }
        };

        let jwt_secret = required("AUTH_JWT_SECRET", "dev-secret-change-me")?;
        let database_url = match get("DATABASE_URL") {
            Some(url) => url,
            None => postgres_url(&get, production)?,
        };
        let censor_host = required("CENSOR_HOST", "localhost")?;
        let censor_port = parse_port("CENSOR_PORT", &required("CENSOR_PORT", "8000")?)?;
        let censor_timeout = match get("CENSOR_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(v.parse().map_err(|_| ConfigError::Invalid {
                var: "CENSOR_TIMEOUT_SECS",
                value: v.clone(),
            })?),
            None => Duration::from_secs(30),
        };

        Ok(Self {
            environment,
            auth_bind_addr: get("AUTH_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:4000".into()),
            api_bind_addr: get("API_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into()),
            issuer: get("AUTH_ISSUER")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:4000".into()),
            jwt_secret,
            database_url,
            censor_host,
            censor_port,
            censor_timeout,
            frontend_client_id: get("FRONTEND_CLIENT_ID")
                .unwrap_or_else(|| FRONTEND_CLIENT_ID.into()),
            frontend_redirect_uri: get("FRONTEND_REDIRECT_URI")
                .unwrap_or_else(|| "http://localhost:3000/auth/callback".into()),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Cookies are `Secure` only when served over HTTPS in production.
    pub fn secure_cookies(&self) -> bool {
        self.is_production()
    }

    /// Token endpoint of the authorization server, as called by the callback.
    pub fn token_endpoint(&self) -> String {
        format!("{}/api/oauth/token", self.issuer)
    }
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        var,
        value: value.to_string(),
    })
}

/// Compose a connection URL from the `POSTGRES_*` variables.
fn postgres_url<G>(get: &G, production: bool) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let part = |key: &'static str, dev_default: &str| match get(key) {
        Some(v) => Ok(v),
        None if production => Err(ConfigError::Missing(key)),
        None => Ok(dev_default.to_string()),
    };
    let user = part("POSTGRES_USER", "postgres")?;
    let password = part("POSTGRES_PASSWORD", "postgres")?;
    let host = part("POSTGRES_HOST", "localhost")?;
    let port = parse_port("POSTGRES_PORT", &part("POSTGRES_PORT", "5432")?)?;
    let db = part("POSTGRES_DB", "eyb")?;
    Ok(format!("postgres://{user}:{password}@{host}:{port}/{db}"))
}
