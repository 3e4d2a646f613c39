// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Route Prefix: /api/*
// Middleware: jwt_auth_middleware puts an AuthUser in the request extensions
//
// Every handler checks its `domain:action` permission with
// `AuthUser::require` before touching the database, so a missing
// permission is a 403 even when the database is down.
//
// Resource modules share one shape: list (paginated `{pagination, items}`),
// show, create (201), update (PATCH), delete (soft).

pub mod approvals;
pub mod auth;
pub mod clients;
pub mod employees;
pub mod files;
pub mod invoices;
pub mod notices;
pub mod orders;
pub mod reports;
pub mod roles;
pub mod schedules;
pub mod users;
pub mod utils;
