pub mod accounts;
pub mod profile;
pub mod subscriptions;

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::AppState;

pub async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    // Liveness includes DB connectivity.
    state.db.ping().await?;

    Ok(Json(serde_json::json!({
        "ok": true,
        "service": "verigate",
    })))
}
