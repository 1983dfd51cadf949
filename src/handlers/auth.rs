use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use tower_cookies::Cookie;
use validator::Validate;

use crate::{
    middleware::{auth, session_from_headers, SessionAuth, SESSION_COOKIE},
    models::{
        response::Response,
        users::{
            FilterUserDto, LoginUserDto, RegisterUserDto, UserData, UserLoginResponseDto,
            UserResponseDto,
        },
    },
    AppState, Error, Result,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout).layer(middleware::from_fn(auth)))
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(new_user): Json<RegisterUserDto>,
) -> Result<impl IntoResponse> {
    new_user.validate()?;

    let user = app_state
        .account_service
        .create_user_account(new_user.into())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            status: "success".to_string(),
            data: UserData {
                user: FilterUserDto::filter_user(&user),
            },
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(user): Json<LoginUserDto>,
) -> Result<impl IntoResponse> {
    user.validate()?;

    let existing = session_from_headers(&headers);
    let session = app_state
        .account_service
        .sign_in_account(existing.as_deref(), &user.email, &user.password)
        .await?;

    if session.secret.is_empty() {
        tracing::error!("Backend returned a session without a secret");
        return Err(Error::InternalServerError);
    }

    let cookie_duration = time::Duration::hours(app_state.config.session_maxage);
    let cookie = Cookie::build((SESSION_COOKIE, session.secret.clone()))
        .path("/")
        .max_age(cookie_duration)
        .http_only(true)
        .build();

    let mut response = Json(UserLoginResponseDto {
        status: "success".to_string(),
        session: session.secret,
    })
    .into_response();

    let cookie_header =
        HeaderValue::from_str(&cookie.to_string()).map_err(|_| Error::InternalServerError)?;
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie_header);

    Ok(response)
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<SessionAuth>,
) -> Result<impl IntoResponse> {
    app_state
        .account_service
        .sign_out_account(&auth.session)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .http_only(true)
        .build();

    let mut response = Json(Response {
        status: "success",
        message: "Signed out".to_string(),
    })
    .into_response();

    let cookie_header =
        HeaderValue::from_str(&cookie.to_string()).map_err(|_| Error::InternalServerError)?;
    response
        .headers_mut()
        .append(header::SET_COOKIE, cookie_header);

    Ok(response)
}
