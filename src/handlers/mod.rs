// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth + permission allow-list)
//
pub mod public;    // Tier 1: No authentication required (/, /health, /auth/*, /sso/*)
pub mod protected; // Tier 2: JWT authentication required (/api/*, /sso/authorize)
