use chrono::{DateTime, Utc};
use tower_cookies::cookie::time::{Duration, OffsetDateTime};
use tower_cookies::cookie::{Expiration, SameSite};
use tower_cookies::{Cookie, Cookies};

use crate::error::{AppError, Result};

/// Cookie carrying the signed token.
pub const JWT_COOKIE: &str = "jwt";
/// Cookie carrying the session identifier.
pub const SESSION_COOKIE: &str = "sessionId";

fn base_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_http_only(true);
    if secure {
        cookie.set_secure(true);
    }
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

/// A cookie that lives for `max_age` from the moment the browser receives it.
pub fn max_age_cookie(
    name: &'static str,
    value: String,
    max_age: chrono::Duration,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = base_cookie(name, value, secure);
    cookie.set_max_age(Duration::seconds(max_age.num_seconds()));
    cookie
}

/// A cookie that expires at an absolute instant.
pub fn expiring_cookie(
    name: &'static str,
    value: String,
    expires_at: DateTime<Utc>,
    secure: bool,
) -> Result<Cookie<'static>> {
    let expires = OffsetDateTime::from_unix_timestamp(expires_at.timestamp())
        .map_err(|e| AppError::Internal(format!("Cookie expiry out of range: {}", e)))?;

    let mut cookie = base_cookie(name, value, secure);
    cookie.set_expires(Expiration::DateTime(expires));
    Ok(cookie)
}

/// Reads a cookie value. An empty value counts as absent.
pub fn read(cookies: &Cookies, name: &str) -> Option<String> {
    cookies
        .get(name)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Tells the browser to drop a cookie.
pub fn remove(cookies: &Cookies, name: &'static str) {
    let mut cookie = Cookie::new(name, "");
    cookie.set_max_age(Duration::seconds(0));
    cookie.set_path("/");
    cookies.remove(cookie);
}
