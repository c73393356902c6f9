use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::error::ApiError;
use crate::lifecycle;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    quantity: u32,
    #[serde(default)]
    price: String,
    #[serde(default)]
    currency: String,
}

/// Start a checkout for an existing account. The provider hosts the actual
/// payment; the client is redirected to the returned approval URL.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let order = lifecycle::begin_checkout(
        &state.db,
        state.gateway.as_ref(),
        &body.email,
        body.quantity,
        &body.price,
        &body.currency,
    )
    .await?;

    Ok(Json(serde_json::json!({
        "orderId": order.order_id,
        "approvalUrl": order.approval_url,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionCompletedRequest {
    #[serde(default)]
    payer_email: String,
    #[serde(default)]
    payment_id: String,
}

/// Gateway completion callback: flips the payer's account to subscribed.
/// Replays are harmless (monotonic flag).
pub async fn subscription_completed(
    State(state): State<AppState>,
    Json(body): Json<SubscriptionCompletedRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let summary = lifecycle::activate_subscription(&state.db, &body.payer_email).await?;

    tracing::info!(
        account_id = %summary.id,
        payment_id = %body.payment_id,
        "Subscription activated"
    );

    Ok(Json(serde_json::json!({
        "success": true,
        "account": summary,
    })))
}
