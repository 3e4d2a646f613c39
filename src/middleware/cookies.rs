use time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::config;
use crate::services::IssuedSession;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

fn session_cookie(name: &'static str, value: String, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config::config().security.cookie_secure)
        .max_age(max_age)
        .build()
}

pub fn set_session_cookies(cookies: &Cookies, session: &IssuedSession) {
    let security = &config::config().security;
    cookies.add(session_cookie(
        ACCESS_COOKIE,
        session.access_token.clone(),
        Duration::minutes(security.access_token_minutes),
    ));
    cookies.add(session_cookie(
        REFRESH_COOKIE,
        session.refresh_token.clone(),
        Duration::days(security.refresh_token_days),
    ));
}

pub fn clear_session_cookies(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        cookies.remove(Cookie::build((name, "")).path("/").build());
    }
}

pub fn refresh_token(cookies: &Cookies) -> Option<String> {
    cookies
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
