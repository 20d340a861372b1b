//! Order history route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use eglys_core::{OrderId, UserId};

use crate::error::{AppError, Result};
use crate::middleware::ValidatedPath;
use crate::models::{Order, OrderDetail};
use crate::state::AppState;

/// The user's orders, newest first.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ValidatedPath(user): ValidatedPath<UserId>,
) -> Result<Json<Vec<Order>>> {
    let orders = state.backend().orders().list_orders(user).await?;
    Ok(Json(orders))
}

/// One order with its lines. Orders of other users are not found.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ValidatedPath((user, order)): ValidatedPath<(UserId, OrderId)>,
) -> Result<Json<OrderDetail>> {
    state
        .backend()
        .orders()
        .get_order(user, order)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {order}")))
}
