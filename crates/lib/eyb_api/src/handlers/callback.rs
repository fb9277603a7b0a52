//! OAuth redirect target on the recruiting API.

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use eyb_core::auth::jwt::TOKEN_EXPIRY_SECS;
use serde::Deserialize;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::ApiState;
use crate::services::cookies::{ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE, token_cookie};
use crate::services::token_client::exchange_code;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// `GET /auth/callback?code=`: redeem the code at the authorization server
/// and hand the tokens to the browser as cookies.
pub async fn oauth_callback(
    State(state): State<ApiState>,
    jar: CookieJar,
    Query(q): Query<CallbackQuery>,
) -> Response {
    let Some(code) = q.code.filter(|c| !c.is_empty()) else {
        return redirect_home_with_error("missing_code");
    };

    let config = &state.config;
    let tokens = match exchange_code(
        &state.http,
        &config.token_endpoint(),
        &code,
        &config.frontend_client_id,
        &config.frontend_redirect_uri,
    )
    .await
    {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "authorization code exchange failed");
            return redirect_home_with_error(e.redirect_reason());
        }
    };

    info!("signed in through OAuth callback");

    let secure = config.secure_cookies();
    let jar = jar
        .add(token_cookie(
            ACCESS_TOKEN_COOKIE,
            &tokens.access_token,
            TOKEN_EXPIRY_SECS,
            secure,
        ))
        .add(token_cookie(
            ID_TOKEN_COOKIE,
            &tokens.id_token,
            TOKEN_EXPIRY_SECS,
            secure,
        ));
    (StatusCode::FOUND, jar, [(header::LOCATION, "/")]).into_response()
}

fn redirect_home_with_error(reason: &str) -> Response {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("error", reason)
        .finish();
    (StatusCode::FOUND, [(header::LOCATION, format!("/?{query}"))]).into_response()
}
