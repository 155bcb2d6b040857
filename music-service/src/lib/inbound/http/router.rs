use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::AllowOrigin;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::current_user::current_user;
use super::handlers::list_users::list_users;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::refresh::refresh;
use super::handlers::register::register;
use super::handlers::session::session;
use super::handlers::update_user_status::update_user_status;
use super::handlers::ApiError;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::user::ports::UserServicePort;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServicePort>,
    pub user_service: Arc<dyn UserServicePort>,
    /// Whether 500 responses may carry the underlying cause.
    pub expose_internal_errors: bool,
}

impl AppState {
    pub fn new(
        auth_service: Arc<dyn AuthServicePort>,
        user_service: Arc<dyn UserServicePort>,
    ) -> Self {
        Self {
            auth_service,
            user_service,
            expose_internal_errors: false,
        }
    }

    pub fn with_internal_errors_exposed(mut self, expose: bool) -> Self {
        self.expose_internal_errors = expose;
        self
    }

    /// Convert a domain error into its HTTP form, honouring the exposure setting.
    pub fn api_error(&self, err: impl Into<ApiError>) -> ApiError {
        let err = err.into();
        if self.expose_internal_errors {
            err
        } else {
            err.redacted()
        }
    }
}

/// Build the CORS layer from configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(session));

    let user_routes = Router::new()
        .route("/api/users", get(list_users))
        .route("/api/users/me", get(current_user))
        .route("/api/users/:user_id/status", patch(update_user_status));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .layer(ServiceBuilder::new().layer(trace_layer).layer(cors))
        .with_state(state)
}
