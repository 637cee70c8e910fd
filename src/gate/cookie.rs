use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue};

use crate::errors::AppError;
use crate::jwt::SESSION_TTL_HOURS;

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_MAX_AGE_SECS: i64 = SESSION_TTL_HOURS * 60 * 60;

/// Finds a cookie by name across every `Cookie` header on the request.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

fn build(value: &str, max_age: i64, secure: bool) -> Result<HeaderValue, AppError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={value}; Path=/; Max-Age={max_age}; HttpOnly; SameSite=Strict"
    );
    if secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie).map_err(|err| AppError::internal(format!("invalid cookie value: {err}")))
}

/// `Set-Cookie` value carrying a freshly issued session token.
pub fn session_cookie(token: &str, secure: bool) -> Result<HeaderValue, AppError> {
    build(token, SESSION_MAX_AGE_SECS, secure)
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_session_cookie(secure: bool) -> Result<HeaderValue, AppError> {
    build("", 0, secure)
}
