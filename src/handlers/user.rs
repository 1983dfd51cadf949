use axum::{middleware, response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    middleware::{auth, SessionAuth},
    models::users::{FilterUserDto, UserData, UserResponseDto},
    Result,
};

pub fn users_handler() -> Router {
    Router::new().route("/me", get(get_me).layer(middleware::from_fn(auth)))
}

async fn get_me(Extension(auth): Extension<SessionAuth>) -> Result<impl IntoResponse> {
    let filtered_user = FilterUserDto::filter_user(&auth.user);

    let response_data = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    };

    Ok(Json(response_data))
}
