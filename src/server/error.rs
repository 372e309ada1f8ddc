use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the rate proxy's API responses.
///
/// The wire body is always `{"error": <fixed message>}`; whatever upstream
/// detail led here goes to the server log instead of the client.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing params")]
    MissingParams,
    #[error("Failed to fetch currencies")]
    CurrenciesUnavailable(#[source] anyhow::Error),
    #[error("Conversion failed")]
    ConversionFailed(#[source] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingParams => StatusCode::BAD_REQUEST,
            ApiError::CurrenciesUnavailable(source) => {
                tracing::error!("Currency listing failed: {source:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ConversionFailed(source) => {
                tracing::error!("Conversion failed: {source:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
