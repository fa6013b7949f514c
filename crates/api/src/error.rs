//! Error to HTTP response mapping.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use todo_core::todo::TodoError;
use todo_shared::{AppError, JwtError};

/// Error returned by handlers.
///
/// Responds with `{"error": <code>, "message": <text>}`. Server-side failures
/// are logged and reported with a generic message.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<TodoError> for ApiError {
    fn from(err: TodoError) -> Self {
        Self(err.into())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(AppError::BadRequest(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_server_error() {
            error!(error = %self.0, code = self.0.error_code(), "Request failed");
            "An internal error occurred".to_string()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[rstest]
    #[case(AppError::NotFound("todo".into()), StatusCode::NOT_FOUND, "NOT_FOUND")]
    #[case(AppError::Forbidden("todo".into()), StatusCode::FORBIDDEN, "FORBIDDEN")]
    #[case(AppError::BadRequest("name".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST")]
    #[case(AppError::Unauthorized("token".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED")]
    #[tokio::test]
    async fn test_client_errors_keep_message(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let message = err.to_string();
        let response = ApiError(err).into_response();

        assert_eq!(response.status(), status);
        let body = body_json(response).await;
        assert_eq!(body["error"], code);
        assert_eq!(body["message"], message);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response =
            ApiError(AppError::Database("connection refused at 10.0.0.5".into())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "DATABASE_ERROR");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
