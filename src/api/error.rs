use crate::models::REQUIRED_FIELDS;
use crate::services::image_upload::UploadError;
use crate::services::sheets::SheetError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    /// Read-side storage failure; the first field is the client-facing summary.
    #[error("{0}: {1}")]
    Storage(&'static str, #[source] anyhow::Error),

    #[error("Endpoint not found")]
    NotFound,

    #[error("Rejected request body: {0}")]
    Rejected(#[from] JsonRejection),

    #[error("Rejected query string: {0}")]
    RejectedQuery(#[from] QueryRejection),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

fn failure(status: StatusCode, error: &str, details: Option<String>) -> Response {
    let body = match details {
        Some(details) => json!({ "success": false, "error": error, "details": details }),
        None => json!({ "success": false, "error": error }),
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::MissingFields(missing) => {
                tracing::warn!("Rejected branch submission, missing: {:?}", missing);
                let body = Json(json!({
                    "success": false,
                    "error": "Missing required fields",
                    "required": REQUIRED_FIELDS,
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::BadRequest(msg) => failure(StatusCode::BAD_REQUEST, &msg, None),
            AppError::Upload(e) => {
                tracing::error!("S3 upload error: {:?}", e);
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to upload images to S3",
                    Some(e.to_string()),
                )
            }
            AppError::Sheet(e) => {
                tracing::error!("Error appending branch data: {:?}", e);
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to append branch data to sheet",
                    Some(e.to_string()),
                )
            }
            AppError::Storage(summary, e) => {
                tracing::error!("{}: {:?}", summary, e);
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    summary,
                    Some(format!("{:#}", e)),
                )
            }
            AppError::NotFound => failure(StatusCode::NOT_FOUND, "Endpoint not found", None),
            AppError::Rejected(rejection) => {
                tracing::error!("Request body rejected: {}", rejection.body_text());
                failure(
                    rejection.status(),
                    "Something went wrong!",
                    Some(rejection.body_text()),
                )
            }
            AppError::RejectedQuery(rejection) => {
                tracing::warn!("Query string rejected: {}", rejection.body_text());
                failure(
                    rejection.status(),
                    "Something went wrong!",
                    Some(rejection.body_text()),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong!",
                    Some(msg),
                )
            }
        }
    }
}

/// Router fallback for unmatched paths.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// Turns a handler panic into the generic failure envelope.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    AppError::Internal(details).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        render_response(err.into_response()).await
    }

    async fn render_response(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_missing_fields_envelope() {
        let (status, body) = render(AppError::MissingFields(vec!["latitude"])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(
            body["required"],
            json!(["branchId", "branchName", "latitude", "longitude"])
        );
    }

    #[tokio::test]
    async fn test_not_found_envelope() {
        let (status, body) = render(AppError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"success": false, "error": "Endpoint not found"}));
    }

    #[tokio::test]
    async fn test_sheet_error_carries_details() {
        let err = SheetError::Api {
            status: 403,
            message: "The caller does not have permission".to_string(),
        };
        let (status, body) = render(AppError::from(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to append branch data to sheet");
        assert_eq!(
            body["details"],
            "Failed to append to sheet: Google API returned 403: The caller does not have permission"
        );
    }

    #[tokio::test]
    async fn test_panic_payload_becomes_details() {
        let (status, body) = render_response(handle_panic(Box::new("kaboom"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["details"], "kaboom");
    }

    #[tokio::test]
    async fn test_internal_error_envelope() {
        let (status, body) = render(AppError::Internal("boom".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Something went wrong!");
        assert_eq!(body["details"], "boom");
    }
}
