use aide::gen::GenContext;
use aide::openapi::{Operation, Response as ApiResponse};
use aide::OperationOutput;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required fields")]
    MissingRequiredFields,
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Internal Server Error. Please try again later.")]
    Storage(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingRequiredFields | ApiError::InvalidBody => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, JsonSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(ref error) = self {
            tracing::error!(error = ?error, "encountered storage error while handling request");
        }

        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl OperationOutput for ApiError {
    type Inner = ErrorBody;

    fn inferred_responses(
        ctx: &mut GenContext,
        operation: &mut Operation,
    ) -> Vec<(Option<u16>, ApiResponse)> {
        let Some(response) = Json::<ErrorBody>::operation_response(ctx, operation) else {
            return Vec::new();
        };

        vec![
            (Some(StatusCode::BAD_REQUEST.as_u16()), response.clone()),
            (Some(StatusCode::INTERNAL_SERVER_ERROR.as_u16()), response),
        ]
    }
}
