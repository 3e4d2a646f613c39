// handlers/public/sso/mod.rs - Single sign-on companion
//
// A relying app sends the browser to /sso/authorize (or shows the /sso/login
// form), receives `?ticket=…` on its redirect URL and trades the ticket at
// /sso/exchange for a portal session of its own.

pub mod authorize;
pub mod exchange;
pub mod login;

pub use authorize::get as authorize_get;
pub use exchange::post as exchange_post;
pub use login::post as login_post;

use url::Url;

use crate::config::config;
use crate::error::ApiError;

/// Parse `redirect` and require its origin (scheme, host, port) to be allow-listed
pub fn allowed_redirect(redirect: &str) -> Result<Url, ApiError> {
    let target = Url::parse(redirect.trim()).map_err(|_| ApiError::bad_request("redirect must be an absolute URL"))?;
    let permitted = config()
        .sso
        .allowed_origins
        .iter()
        .filter_map(|origin| Url::parse(origin).ok())
        .any(|origin| origin.origin() == target.origin());
    if !permitted {
        return Err(ApiError::bad_request(format!("redirect origin not allowed: {}", target.origin().ascii_serialization())));
    }
    Ok(target)
}

/// `redirect` with `ticket=<ticket>` appended to its query
pub fn with_ticket(mut target: Url, ticket: &str) -> String {
    target.query_pairs_mut().append_pair("ticket", ticket);
    target.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configured_origins_are_accepted() {
        // Development preset allows localhost:3000 and :3001
        assert!(allowed_redirect("http://localhost:3001/after-login?x=1").is_ok());
        assert!(allowed_redirect("http://localhost:4000/").is_err());
        assert!(allowed_redirect("https://localhost:3001/").is_err());
        assert!(allowed_redirect("/relative/path").is_err());
    }

    #[test]
    fn ticket_is_appended_to_existing_query() {
        let target = Url::parse("http://localhost:3001/cb?next=%2Fhome").unwrap();
        assert_eq!(with_ticket(target, "abc"), "http://localhost:3001/cb?next=%2Fhome&ticket=abc");
    }
}
