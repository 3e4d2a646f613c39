//! Route table. Public routes first, then everything behind the JWT layer.

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let settings = config();

    let open = Router::new()
        .route("/", get(public::health::root))
        .route("/health", get(public::health::health))
        .merge(auth_public_routes())
        .merge(sso_public_routes());

    let guarded = Router::new()
        .merge(account_routes())
        .merge(resource_routes())
        .merge(approval_routes())
        .merge(file_routes(settings.server.max_upload_bytes))
        // The SSO handshake rides on the portal session cookie
        .route("/sso/authorize", get(public::sso::authorize_get))
        .route_layer(from_fn(jwt_auth_middleware));

    let app = open
        .merge(guarded)
        .with_state(state)
        // CORS outermost so preflights never reach the cookie jar
        .layer(
            ServiceBuilder::new()
                .layer(cors_layer(&settings.security.cors_origins))
                .layer(CookieManagerLayer::new()),
        );

    if settings.server.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login", post(auth::login_post))
        .route("/auth/refresh", post(auth::refresh_post))
        .route("/auth/logout", post(auth::logout_post))
}

fn sso_public_routes() -> Router<AppState> {
    use public::sso;

    Router::new()
        .route("/sso/login", post(sso::login_post))
        .route("/sso/exchange", post(sso::exchange_post))
}

fn account_routes() -> Router<AppState> {
    use protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/auth/password", put(auth::change_password))
}

fn resource_routes() -> Router<AppState> {
    use protected::{clients, employees, invoices, notices, orders, reports, roles, schedules, users};

    Router::new()
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/:id", get(clients::show).patch(clients::update).delete(clients::delete))
        .route("/api/employees", get(employees::list).post(employees::create))
        .route(
            "/api/employees/:id",
            get(employees::show).patch(employees::update).delete(employees::delete),
        )
        .route("/api/employees/:id/payroll", get(employees::payroll))
        .route("/api/employees/:id/provident-fund", post(employees::add_contribution))
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/:id", get(users::show).patch(users::update).delete(users::delete))
        .route("/api/roles", get(roles::list).post(roles::create))
        .route("/api/roles/permissions", get(roles::catalog))
        .route("/api/roles/:id", get(roles::show).patch(roles::update).delete(roles::delete))
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/:id", get(orders::show).patch(orders::update).delete(orders::delete))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/:id", get(invoices::show).patch(invoices::update).delete(invoices::delete))
        .route("/api/notices", get(notices::list).post(notices::create))
        .route("/api/notices/:id", get(notices::show).patch(notices::update).delete(notices::delete))
        .route("/api/schedules", get(schedules::list).post(schedules::create))
        .route(
            "/api/schedules/:id",
            get(schedules::show).patch(schedules::update).delete(schedules::delete),
        )
        .route("/api/reports", get(reports::list).post(reports::create))
        .route("/api/reports/stats", get(reports::stats))
        .route("/api/reports/:id", get(reports::show).patch(reports::update).delete(reports::delete))
}

fn approval_routes() -> Router<AppState> {
    use protected::approvals;

    Router::new()
        .route("/api/approvals", get(approvals::list).post(approvals::create))
        .route("/api/approvals/:id", get(approvals::show))
        .route("/api/approvals/:id/approve", post(approvals::approve))
        .route("/api/approvals/:id/reject", post(approvals::reject))
}

fn file_routes(max_upload_bytes: usize) -> Router<AppState> {
    use protected::files;

    Router::new()
        .route("/api/files/:folder", get(files::list))
        .route(
            "/api/files/:folder/:name",
            get(files::download).put(files::upload).delete(files::delete),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Credentialed CORS for the configured front-end origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}
