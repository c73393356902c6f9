use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::auth::{self, Profile};
use crate::error::ApiError;
use crate::lifecycle::AccountSummary;
use crate::AppState;

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AccountSummary>, ApiError> {
    let account = auth::authenticate(&state.db, &state.config, &headers).await?;
    Ok(Json((&account).into()))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let profile = auth::get_profile(&state.db, &id).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    name: String,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<AccountSummary>, ApiError> {
    let caller = auth::authenticate(&state.db, &state.config, &headers).await?;
    let updated = auth::update_profile(&state.db, &caller, &id, &body.name).await?;
    Ok(Json(updated))
}
