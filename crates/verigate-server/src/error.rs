use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Failure taxonomy for every account operation.
///
/// Each variant carries its HTTP status and a stable machine-readable code;
/// the JSON envelope is `{"success": false, "error": {"code", "message"}}`.
/// Internal failures are logged with context and surfaced opaquely.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("An account with this email already exists")]
    DuplicateAccount,

    #[error("Email or password is incorrect. Try again")]
    InvalidCredentials,

    #[error("Email address has not been verified")]
    NotVerified,

    #[error("An active subscription is required")]
    SubscriptionRequired,

    #[error("Verification link is invalid or may have expired; request a new one")]
    TokenNotFound,

    #[error("Email address is already verified")]
    AlreadyVerified,

    #[error("Verification resend limit reached")]
    ResendLimit,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Failed to deliver verification email")]
    Delivery(#[source] crate::mailer::MailError),

    #[error("Payment gateway request failed")]
    Gateway(#[source] crate::payments::GatewayError),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid or expired session token")]
    InvalidToken,

    #[error("Internal error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::DuplicateAccount
            | ApiError::InvalidCredentials
            | ApiError::AlreadyVerified
            | ApiError::ResendLimit => StatusCode::BAD_REQUEST,

            ApiError::NotVerified
            | ApiError::TokenNotFound
            | ApiError::Unauthenticated
            | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,

            ApiError::SubscriptionRequired => StatusCode::FORBIDDEN,

            ApiError::AccountNotFound => StatusCode::NOT_FOUND,

            ApiError::Delivery(_) | ApiError::Gateway(_) => StatusCode::BAD_GATEWAY,

            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "invalid_input",
            ApiError::DuplicateAccount => "already_registered",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::NotVerified => "not_verified",
            ApiError::SubscriptionRequired => "subscription_required",
            ApiError::TokenNotFound => "token_not_found",
            ApiError::AlreadyVerified => "already_verified",
            ApiError::ResendLimit => "resend_limit",
            ApiError::AccountNotFound => "account_not_found",
            ApiError::Delivery(_) => "delivery_failed",
            ApiError::Gateway(_) => "gateway_failed",
            ApiError::Unauthenticated => "unauthorized",
            ApiError::InvalidToken => "invalid_token",
            ApiError::Database(_) | ApiError::Internal(_) => "internal_error",
        }
    }
}

pub fn error_body(code: &str, message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": false,
        "error": {
            "code": code,
            "message": message,
        }
    }))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!(error = %e, "Database operation failed");
                "Internal server error".to_string()
            }
            ApiError::Internal(context) => {
                tracing::error!(context, "Internal error");
                "Internal server error".to_string()
            }
            ApiError::Delivery(e) => {
                tracing::warn!(error = %e, "Verification email delivery failed");
                self.to_string()
            }
            ApiError::Gateway(e) => {
                tracing::warn!(error = %e, "Payment gateway call failed");
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, error_body(self.code(), &message)).into_response()
    }
}
