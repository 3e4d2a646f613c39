// handlers/public/auth/mod.rs - Session acquisition endpoints
//
// Login issues an access JWT plus a rotating refresh token, both set as
// HttpOnly cookies. The access token is also returned in the body for
// clients that prefer the Authorization header.

pub mod login;
pub mod logout;
pub mod refresh;

pub use login::post as login_post;
pub use logout::post as logout_post;
pub use refresh::post as refresh_post;
