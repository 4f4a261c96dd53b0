use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cryptotrack_core::errors::Error as CoreError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("Not Found")]
    NotFound,
}

/// Error payload of every non-2xx response.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: u16,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Core(CoreError::ClientInput(_)) => StatusCode::BAD_REQUEST,
            ApiError::Core(CoreError::InvalidConfigValue(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
