//! Cookie builders for the login session and the tokens handed to the frontend.
//!
//! Every cookie is httpOnly, `SameSite=Lax`, scoped to `/`, and `Secure`
//! only when the caller says the deployment is served over HTTPS.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Login session on the authorization server's origin.
pub const SESSION_COOKIE: &str = "sid";
/// Access token on the recruiting API's origin.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
/// Identity token on the recruiting API's origin.
pub const ID_TOKEN_COOKIE: &str = "id_token";

fn base(name: &'static str, value: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value.to_string()))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Session cookie for `sid`; lives until the browser closes.
pub fn session_cookie(sid: &str, secure: bool) -> Cookie<'static> {
    base(SESSION_COOKIE, sid, secure)
}

/// Cookie carrying a token, expiring with it.
pub fn token_cookie(
    name: &'static str,
    token: &str,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = base(name, token, secure);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}
