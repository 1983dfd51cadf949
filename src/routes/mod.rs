use std::{sync::Arc, time::Duration};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{
        auth::auth_handler,
        posts::{posts_handler, saves_handler},
        user::users_handler,
    },
    AppState,
};

/// Slack on top of the file limit for the other multipart fields.
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_routes(app_state: Arc<AppState>) -> Router {
    let body_limit = app_state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler())
        .nest("/posts", posts_handler())
        .nest("/saves", saves_handler())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new().nest("/api", api_route)
}

pub fn configure_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}
