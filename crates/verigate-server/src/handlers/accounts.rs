use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::error::{error_body, ApiError};
use crate::lifecycle::{self, AuthenticatedAccount};
use crate::{auth, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthenticatedAccount>), ApiError> {
    let out = lifecycle::register(
        &state.db,
        &state.config,
        state.mailer.as_ref(),
        &body.name,
        &body.email,
        &body.password,
    )
    .await?;

    tracing::info!(account_id = %out.account.id, "Account registered");
    Ok((StatusCode::CREATED, Json(out)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthenticatedAccount>, ApiError> {
    let out = auth::login(&state.db, &state.config, &body.email, &body.password).await?;
    Ok(Json(out))
}

/// Confirmation link target. The email path segment is only there to keep
/// the emailed URL shape; lookup is by token value alone.
pub async fn confirm_email(
    State(state): State<AppState>,
    Path((_email, token)): Path<(String, String)>,
) -> Response {
    match lifecycle::confirm_email(&state.db, &token).await {
        Ok(email) => Json(serde_json::json!({
            "success": true,
            "email": email,
            "message": "Email address verified",
        }))
        .into_response(),
        // A token whose owning account has vanished reads as unauthorized on
        // this path, not as a regular 404.
        Err(ApiError::AccountNotFound) => (
            StatusCode::UNAUTHORIZED,
            error_body("account_not_found", "Account not found"),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendRequest {
    #[serde(default)]
    email: String,
}

pub async fn resend_verification(
    State(state): State<AppState>,
    Json(body): Json<ResendRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    lifecycle::resend_verification(&state.db, &state.config, state.mailer.as_ref(), &body.email)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Verification email sent",
    })))
}
