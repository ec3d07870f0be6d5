//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error response has the body `{"message": "..."}`.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use fieldops_core::AccessDenied;

use crate::db::RepositoryError;
use crate::models::ValidationError;
use crate::services::{AuthError, PlanError, ShopError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Shop operation failed.
    #[error("Shop error: {0}")]
    Shop(#[from] ShopError),

    /// Plan operation failed.
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Caller's role is not accepted by the route.
    #[error("{0}")]
    Forbidden(#[from] AccessDenied),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::MissingFields
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::UserAlreadyExists => StatusCode::BAD_REQUEST,
                AuthError::InvalidCredentials
                | AuthError::MissingToken
                | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenSigning(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Shop(err) => match err {
                ShopError::Validation(_) => StatusCode::BAD_REQUEST,
                ShopError::NotFound => StatusCode::NOT_FOUND,
                ShopError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Plan(err) => match err {
                PlanError::Validation(_)
                | PlanError::UnknownReference(_)
                | PlanError::InvalidStatus => StatusCode::BAD_REQUEST,
                PlanError::NotFound | PlanError::NoPlanToday => StatusCode::NOT_FOUND,
                PlanError::NotOwnPlan | PlanError::NotOwnPlanStatus => StatusCode::FORBIDDEN,
                PlanError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Message sent to the client. Internal details are never exposed.
    #[must_use]
    pub fn message(&self) -> String {
        if self.status().is_server_error() {
            return INTERNAL_MESSAGE.to_owned();
        }
        match self {
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_owned(),
            Self::Auth(AuthError::WeakPassword(msg)) | Self::BadRequest(msg) => msg.clone(),
            Self::Auth(err) => err.to_string(),
            Self::Shop(err) => err.to_string(),
            Self::Plan(err) => err.to_string(),
            Self::Validation(err) => err.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            message: self.message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `Json` extractor whose rejection is an [`AppError`], so malformed bodies
/// get the usual `{"message"}` shape.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose rejection is an [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use fieldops_core::LocationError;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::from(AccessDenied).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::from(ShopError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(PlanError::NotOwnPlan).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(PlanError::NoPlanToday).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(PlanError::InvalidStatus).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(PlanError::UnknownReference("shop 9".to_owned())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Internal("boom".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_body_is_message_json() {
        let (status, body) = body_of(AppError::from(PlanError::NotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({ "message": "Plan not found." }));

        let (_, body) = body_of(AppError::from(AccessDenied)).await;
        assert_eq!(
            body["message"],
            "Forbidden: You do not have the required role to access this resource."
        );

        let (_, body) = body_of(AppError::from(ShopError::Validation(
            ValidationError::Location(LocationError::Longitude(200.0)),
        )))
        .await;
        assert_eq!(
            body["message"],
            "longitude must be between -180 and 180 (got 200)"
        );
    }

    #[tokio::test]
    async fn test_internal_details_hidden() {
        let (status, body) = body_of(AppError::from(RepositoryError::DataCorruption(
            "invalid email in database".to_owned(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");

        let (_, body) = body_of(AppError::from(AuthError::PasswordHash)).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
