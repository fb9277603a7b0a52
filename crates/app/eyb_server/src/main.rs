//! End Your Bias server binary.
//!
//! Serves the authorization server and the recruiting API on two listeners
//! from one process; either one exiting shuts the other down.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyb_api::config::ApiConfig;
use eyb_api::{ApiState, AuthState};
use eyb_core::auth::codes::MemoryCodeStore;
use eyb_core::auth::jwt::TokenIssuer;
use eyb_core::auth::registry::Registry;
use eyb_core::censor::CensorClient;
use eyb_core::db::PgStore;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How often expired authorization codes are swept from memory.
const CODE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// CLI arguments. Everything else comes from the environment.
#[derive(Parser, Debug)]
#[command(
    name = "eyb_server",
    about = "End Your Bias authorization server and recruiting API"
)]
struct Args {
    /// Authorization server port; overrides the port of `AUTH_BIND_ADDR`.
    #[arg(long, env = "AUTH_PORT")]
    auth_port: Option<u16>,

    /// Recruiting API port; overrides the port of `API_BIND_ADDR`.
    #[arg(long, env = "API_PORT")]
    api_port: Option<u16>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,eyb_api=debug,eyb_core=debug")
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env()?;
    if let Some(port) = args.auth_port {
        config.auth_bind_addr = with_port(&config.auth_bind_addr, port);
    }
    if let Some(port) = args.api_port {
        config.api_bind_addr = with_port(&config.api_bind_addr, port);
    }
    if !config.is_production() {
        warn!("development mode: insecure defaults may be in use");
    }

    info!(
        environment = ?config.environment,
        issuer = %config.issuer,
        max_connections = args.max_connections,
        "starting eyb_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database_url)
        .await?;

    info!("running database migrations");
    eyb_api::migrate(&pool).await?;

    // Authorization server.
    let registry = Registry::demo(&config.frontend_client_id, &config.frontend_redirect_uri)?;
    let codes = Arc::new(MemoryCodeStore::new());
    let sweeper = codes.spawn_cleanup_task(CODE_SWEEP_INTERVAL);
    let auth_app = eyb_api::auth_router(AuthState::in_memory(config.clone(), registry, codes));

    // Recruiting API.
    let store = Arc::new(PgStore::new(pool));
    let anonymizer = CensorClient::from_host_port(
        &config.censor_host,
        config.censor_port,
        config.censor_timeout,
    )?;
    info!(endpoint = %anonymizer.endpoint(), "censor service configured");
    let api_state = ApiState {
        config: config.clone(),
        applications: store.clone(),
        jobs: store,
        anonymizer: Arc::new(anonymizer),
        tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), &config.issuer),
        http: reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?,
    };
    let api_app = eyb_api::api_router(api_state);

    let auth_listener = tokio::net::TcpListener::bind(&config.auth_bind_addr).await?;
    let api_listener = tokio::net::TcpListener::bind(&config.api_bind_addr).await?;
    info!(addr = %auth_listener.local_addr()?, "authorization server listening");
    info!(addr = %api_listener.local_addr()?, "recruiting API listening");

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
            }
            shutdown.cancel();
        }
    });

    let auth_server = {
        let shutdown = shutdown.clone();
        async move {
            axum::serve(auth_listener, auth_app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    };
    let api_server = {
        let shutdown = shutdown.clone();
        async move {
            axum::serve(api_listener, api_app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
        }
    };

    let result = run_servers(auth_server, api_server, shutdown).await;
    sweeper.abort();
    result?;

    Ok(())
}

/// Run the authorization server on its own task and the API on this one.
/// Whichever exits first cancels `shutdown` so the other drains too; an error
/// from either is logged and returned.
async fn run_servers<A, B>(auth: A, api: B, shutdown: CancellationToken) -> std::io::Result<()>
where
    A: Future<Output = std::io::Result<()>> + Send + 'static,
    B: Future<Output = std::io::Result<()>>,
{
    let auth_handle = tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let result = auth.await;
            if let Err(e) = &result {
                error!(error = %e, "authorization server failed");
            }
            shutdown.cancel();
            result
        }
    });

    let api_result = api.await;
    if let Err(e) = &api_result {
        error!(error = %e, "recruiting API failed");
    }
    shutdown.cancel();

    let auth_result = auth_handle.await.map_err(std::io::Error::other)?;
    api_result.and(auth_result)
}

/// Replace the port of a `host:port` bind address.
fn with_port(addr: &str, port: u16) -> String {
    match addr.rsplit_once(':') {
        Some((host, _)) => format!("{host}:{port}"),
        None => format!("{addr}:{port}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_port_replaces_only_the_port() {
        assert_eq!(with_port("127.0.0.1:4000", 4100), "127.0.0.1:4100");
        assert_eq!(with_port("[::1]:3000", 8080), "[::1]:8080");
        assert_eq!(with_port("0.0.0.0", 80), "0.0.0.0:80");
    }

    #[tokio::test]
    async fn auth_server_failure_stops_the_api() {
        let shutdown = CancellationToken::new();
        let api = {
            let shutdown = shutdown.clone();
            async move {
                shutdown.cancelled().await;
                Ok::<(), std::io::Error>(())
            }
        };
        let auth = async { Err::<(), _>(std::io::Error::other("listener closed")) };

        let result = run_servers(auth, api, shutdown.clone()).await;
        assert_eq!(result.unwrap_err().to_string(), "listener closed");
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn api_exit_stops_the_auth_server() {
        let shutdown = CancellationToken::new();
        let auth = {
            let shutdown = shutdown.clone();
            async move {
                shutdown.cancelled().await;
                Ok::<(), std::io::Error>(())
            }
        };
        let api = async { Ok::<(), std::io::Error>(()) };

        run_servers(auth, api, shutdown.clone()).await.unwrap();
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn args_parse() {
        let args = Args::parse_from(["eyb_server", "--auth-port", "4100", "--max-connections", "2"]);
        assert_eq!(args.auth_port, Some(4100));
        assert_eq!(args.max_connections, 2);
    }
}
