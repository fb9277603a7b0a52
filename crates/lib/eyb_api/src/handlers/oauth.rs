//! Authorization server endpoints: login page, login submission, token exchange.

use std::sync::Arc;

use askama::Template;
use axum::Json;
use axum::body::Bytes;
use axum::extract::{Form, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use eyb_core::auth::codes::{consume_authorization_code, create_authorization_code};
use eyb_core::auth::jwt::TOKEN_EXPIRY_SECS;
use eyb_core::auth::registry::Registry;
use eyb_core::models::auth::User;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::AuthState;
use crate::error::{OAuthError, OAuthErrorCode};
use crate::routes;
use crate::services::cookies::session_cookie;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// OAuth parameters carried through the login page.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginPageQuery {
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
    pub error: String,
}

/// Body of `POST /api/oauth/login`. Missing fields deserialize empty.
#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub state: String,
}

/// Successful token exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub id_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// `GET /login`: the HTML login form.
pub async fn login_page(Query(q): Query<LoginPageQuery>) -> Response {
    match LoginTemplate::from(&q).render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "failed to render login template");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

/// `POST /api/oauth/login`: check client, redirect URI and credentials,
/// then send the browser back to the client with a fresh code.
pub async fn login_submit(
    State(state): State<AuthState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let Some(client) = state.registry.find_client(&form.client_id) else {
        warn!(client_id = %form.client_id, "login for unknown client");
        return redirect_to_login(&form, "Unknown client");
    };

    if !client.allows_redirect(&form.redirect_uri) {
        warn!(client_id = %form.client_id, "login with unregistered redirect_uri");
        return redirect_to_login(&form, "Invalid redirect_uri");
    }

    let Some(user) = authenticate(&state.registry, &form.email, &form.password).await else {
        info!(client_id = %form.client_id, "login failed");
        return redirect_to_login(&form, "Invalid email or password");
    };

    let sid = state.sessions.create_session(&user.id);
    let code = create_authorization_code(
        state.codes.as_ref(),
        &user.id,
        &form.client_id,
        &form.redirect_uri,
    );

    let mut params = vec![("code", code.as_str())];
    if !form.state.is_empty() {
        params.push(("state", form.state.as_str()));
    }
    let location = append_query(&form.redirect_uri, &params);

    info!(user_id = %user.id, client_id = %form.client_id, "authorization code issued");

    let jar = jar.add(session_cookie(&sid, state.config.secure_cookies()));
    found(jar, &location)
}

/// `POST /api/oauth/token`: exchange an authorization code for tokens.
pub async fn token(
    State(state): State<AuthState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, OAuthError> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.get(..FORM_CONTENT_TYPE.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
        });
    if !is_form {
        return Err(OAuthError::invalid_request(
            "Content-Type must be application/x-www-form-urlencoded",
        ));
    }

    let req = TokenRequest::parse(&body);

    if req.grant_type != "authorization_code" {
        return Err(OAuthError::new(
            OAuthErrorCode::UnsupportedGrantType,
            "Only authorization_code is supported",
        ));
    }

    let Some(client) = state.registry.find_client(&req.client_id) else {
        return Err(OAuthError::invalid_client("Unknown client_id"));
    };

    if !client.allows_redirect(&req.redirect_uri) {
        return Err(OAuthError::invalid_request(
            "redirect_uri is not allowed for this client",
        ));
    }

    if let Some(secret) = req.client_secret.as_deref() {
        let registry = Arc::clone(&state.registry);
        let client_id = req.client_id.clone();
        let secret = secret.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            registry.verify_client_secret(&client_id, &secret)
        })
        .await
        .unwrap_or(false);
        if !verified {
            warn!(client_id = %req.client_id, "client secret mismatch");
            return Err(OAuthError::invalid_client("Invalid client credentials"));
        }
    }

    if req.code.is_empty() {
        return Err(OAuthError::invalid_request("Missing authorization code"));
    }

    let Some(grant) = consume_authorization_code(
        state.codes.as_ref(),
        &req.code,
        &req.client_id,
        &req.redirect_uri,
    ) else {
        warn!(client_id = %req.client_id, "rejected authorization code");
        return Err(OAuthError::invalid_grant(
            "Invalid or expired authorization code",
        ));
    };

    let Some(user) = state.registry.find_user_by_id(&grant.user_id) else {
        error!(user_id = %grant.user_id, "authorization code for unknown user");
        return Err(OAuthError::invalid_grant(
            "User not found for this authorization code",
        ));
    };

    let access_token = state.tokens.create_access_token(&user, &req.client_id)?;
    let id_token = state.tokens.create_id_token(&user, &req.client_id)?;

    info!(user_id = %user.id, client_id = %req.client_id, "tokens issued");

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(TokenResponse {
            access_token,
            id_token,
            token_type: "Bearer".to_string(),
            expires_in: TOKEN_EXPIRY_SECS,
        }),
    ))
}

/// Token request fields; absent fields are empty.
#[derive(Debug, Default)]
struct TokenRequest {
    grant_type: String,
    code: String,
    client_id: String,
    redirect_uri: String,
    client_secret: Option<String>,
}

impl TokenRequest {
    fn parse(body: &[u8]) -> Self {
        let mut req = TokenRequest::default();
        for (key, value) in form_urlencoded::parse(body) {
            match key.as_ref() {
                "grant_type" => req.grant_type = value.into_owned(),
                "code" => req.code = value.into_owned(),
                "client_id" => req.client_id = value.into_owned(),
                "redirect_uri" => req.redirect_uri = value.into_owned(),
                "client_secret" if !value.is_empty() => {
                    req.client_secret = Some(value.into_owned())
                }
                _ => {}
            }
        }
        req
    }
}

/// Credential check off the async workers (bcrypt is deliberately slow).
async fn authenticate(registry: &Arc<Registry>, email: &str, password: &str) -> Option<User> {
    let registry = Arc::clone(registry);
    let email = email.to_string();
    let password = password.to_string();
    match tokio::task::spawn_blocking(move || {
        registry.find_user_by_email_and_password(&email, &password)
    })
    .await
    {
        Ok(user) => user,
        Err(e) => {
            error!(error = %e, "credential check panicked");
            None
        }
    }
}

/// 302 keeps the next hop a browser GET.
fn found(jar: CookieJar, location: &str) -> Response {
    (StatusCode::FOUND, jar, [(header::LOCATION, location.to_string())]).into_response()
}

/// Back to the login page with the OAuth parameters and an error message.
fn redirect_to_login(form: &LoginForm, error: &str) -> Response {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in [
        ("client_id", form.client_id.as_str()),
        ("redirect_uri", form.redirect_uri.as_str()),
        ("state", form.state.as_str()),
    ] {
        if !value.is_empty() {
            query.append_pair(key, value);
        }
    }
    query.append_pair("error", error);
    let location = format!("{}?{}", routes::GET_LOGIN, query.finish());
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Login page template. Values are HTML-escaped by askama.
#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate<'a> {
    action: &'a str,
    client_id: &'a str,
    redirect_uri: &'a str,
    state: &'a str,
    error: Option<&'a str>,
}

impl<'a> From<&'a LoginPageQuery> for LoginTemplate<'a> {
    fn from(q: &'a LoginPageQuery) -> Self {
        Self {
            action: routes::POST_OAUTH_LOGIN,
            client_id: &q.client_id,
            redirect_uri: &q.redirect_uri,
            state: &q.state,
            error: Some(q.error.as_str()).filter(|e| !e.is_empty()),
        }
    }
}

/// `redirect_uri` as registered, with `pairs` appended to its query.
fn append_query(redirect_uri: &str, pairs: &[(&str, &str)]) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        query.append_pair(key, value);
    }
    let separator = if redirect_uri.contains('?') { '&' } else { '?' };
    format!("{redirect_uri}{separator}{}", query.finish())
}
