use std::sync::Arc;

use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};
use axum_extra::extract::CookieJar;

use crate::{models::users::User, AppState, Error, Result};

pub const SESSION_COOKIE: &str = "session";

/// Signed-in caller, placed in request extensions by [`auth`].
#[derive(Debug, Clone)]
pub struct SessionAuth {
    pub user: User,
    pub session: String,
}

/// Session secret from the cookie, or from an `Authorization: Bearer` header.
pub fn session_from_headers(headers: &header::HeaderMap) -> Option<String> {
    let cookies = CookieJar::from_headers(headers);

    cookies
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    auth_value
                        .strip_prefix("Bearer ")
                        .map(|stripped| stripped.to_string())
                })
        })
}

pub async fn auth(mut req: Request, next: Next) -> Result<impl IntoResponse> {
    let app_state = req
        .extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or(Error::InternalServerError)?;

    let session = session_from_headers(req.headers()).ok_or(Error::Unauthorized)?;

    let user = app_state
        .account_service
        .get_current_user(&session)
        .await?
        .ok_or(Error::Unauthorized)?;

    req.extensions_mut().insert(SessionAuth { user, session });

    Ok(next.run(req).await)
}
