use aide::gen::GenContext;
use aide::openapi::Operation;
use aide::OperationInput;
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::Request;
use axum::Json;
use schemars::JsonSchema;

use crate::errors::ApiError;

pub(crate) trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

/// A JSON body that has passed [`Validate::validate`].
#[derive(Debug)]
pub(crate) struct ValidatedJson<T>(pub T);

#[async_trait::async_trait]
impl<S, B, T> FromRequest<S, B> for ValidatedJson<T>
where
    T: Validate + Send,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    S: Send + Sync,
    B: Send + 'static,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!(error = %rejection, "rejected request body");
                ApiError::InvalidBody
            })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

impl<T: JsonSchema> OperationInput for ValidatedJson<T> {
    fn operation_input(ctx: &mut GenContext, operation: &mut Operation) {
        Json::<T>::operation_input(ctx, operation);
    }
}
