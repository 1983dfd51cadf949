use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    NotFound,
    Unauthorized,
    Forbidden,
    InternalServerError,
    BadRequest(String),
    Validation(ValidationErrors),
    Backend { status: u16, message: String },
    Http(reqwest::Error),
}

impl Error {
    /// Maps a non-2xx BaaS reply onto the crate error.
    pub fn from_backend(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            _ => Self::Backend { status, message },
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "resource not found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::InternalServerError => write!(f, "internal server error"),
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::Validation(errors) => write!(f, "validation failed: {errors}"),
            Self::Backend { status, message } => write!(f, "backend error {status}: {message}"),
            Self::Http(err) => write!(f, "http error: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            Self::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, errors.to_string()),
            Self::Backend { .. } | Self::Http(_) => (
                StatusCode::BAD_GATEWAY,
                "Something went wrong, please try again".to_string(),
            ),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        error!("Backend request failed: {:?}", err);
        Self::Http(err)
    }
}

impl From<ValidationErrors> for Error {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        error!("Malformed backend payload: {:?}", err);
        Self::InternalServerError
    }
}
