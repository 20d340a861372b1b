//! Checkout route handler.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use eglys_core::{Money, OrderId, UserId};

use crate::error::{Result, set_sentry_user};
use crate::middleware::{ValidatedJson, coerce};
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(deserialize_with = "coerce::id")]
    pub user_id: UserId,
}

/// Successful checkout response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub success: bool,
    pub order_id: OrderId,
    pub total: Money,
    /// `false` if the order was recorded but its lines are still in the cart.
    pub cart_cleared: bool,
}

/// Convert the user's cart into an order.
#[instrument(skip(state))]
pub async fn confirm(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    set_sentry_user(&request.user_id, None);

    let receipt = state.checkout().confirm_order(request.user_id).await?;

    Ok(Json(CheckoutResponse {
        success: true,
        order_id: receipt.order_id,
        total: receipt.total,
        cart_cleared: receipt.cart_cleared,
    }))
}
