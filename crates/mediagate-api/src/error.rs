//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpIngestError>`; the error renders as
//! `{error, code}` with the status its [`ErrorMetadata`] names.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediagate_core::{ErrorMetadata, IngestError, LogLevel};
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling
    pub code: String,
}

/// Wrapper type for IngestError to implement IntoResponse
/// (orphan rules: both the trait and the type are foreign here)
#[derive(Debug)]
pub struct HttpIngestError(pub IngestError);

impl From<IngestError> for HttpIngestError {
    fn from(err: IngestError) -> Self {
        HttpIngestError(err)
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpIngestError {
    fn from(rejection: JsonRejection) -> Self {
        HttpIngestError(IngestError::Validation(format!(
            "Invalid event body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that returns our ErrorResponse format (400 + JSON) on deserialization failure.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpIngestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpIngestError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &IngestError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                details = %error.detailed_message(),
                "Error occurred"
            );
        }
    }
}

impl IntoResponse for HttpIngestError {
    fn into_response(self) -> Response {
        let error = &self.0;
        let status = StatusCode::from_u16(error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(error);

        let body = Json(ErrorResponse {
            error: error.to_string(),
            code: error.error_code().to_string(),
        });

        (status, body).into_response()
    }
}
