// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition and service discovery. Everything here must be safe to
// call anonymously; credentials arrive in the request body or cookies.

pub mod auth;   // Login, refresh, logout
pub mod health; // Service descriptor and database health
pub mod sso;    // Single sign-on login and ticket exchange
