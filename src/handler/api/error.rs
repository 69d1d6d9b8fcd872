use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::service::payment::error::PaymentError;

use super::response::ApiError;

impl IntoResponse for PaymentError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self {
            Self::InvalidParams { .. } => StatusCode::BAD_REQUEST,
            Self::ProviderRequestFailed { .. } => StatusCode::BAD_GATEWAY,
        };
        (
            status_code,
            Json(ApiError {
                message: &self.to_string(),
            }),
        )
            .into_response()
    }
}
