//! Cart route handlers.
//!
//! Every mutation answers with the resulting cart. Prices in the cart view
//! are informational; checkout re-prices from the catalog.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::instrument;

use eglys_core::{ProductId, Quantity, UserId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{ValidatedJson, ValidatedPath, coerce};
use crate::models::CartView;
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    #[serde(deserialize_with = "coerce::id")]
    pub user_id: UserId,
    #[serde(deserialize_with = "coerce::id")]
    pub product_id: ProductId,
    /// Missing, zero or negative means one.
    #[serde(default, deserialize_with = "coerce::optional_int")]
    pub qty: Option<i64>,
}

/// Remove-from-cart request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartRequest {
    #[serde(deserialize_with = "coerce::id")]
    pub user_id: UserId,
    #[serde(deserialize_with = "coerce::id")]
    pub product_id: ProductId,
}

async fn cart_view(state: &AppState, user: UserId) -> Result<Json<CartView>> {
    let lines = state.backend().carts().get_lines(user).await?;
    Ok(Json(CartView::from(lines.as_slice())))
}

/// Show the user's cart.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ValidatedPath(user): ValidatedPath<UserId>,
) -> Result<Json<CartView>> {
    cart_view(&state, user).await
}

/// Add a product to the cart, merging with an existing line.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let quantity = Quantity::from_requested(request.qty)
        .map_err(|e| AppError::InvalidRequest(e.to_string()))?;
    let backend = state.backend();

    AuthService::new(backend.users().as_ref())
        .get_user(request.user_id)
        .await?;
    if backend.catalog().get_product(request.product_id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {}", request.product_id)));
    }

    let line = backend
        .carts()
        .add_line(request.user_id, request.product_id, quantity)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", line.product_id.to_string()),
            ("qty", line.quantity.to_string()),
        ],
    );

    cart_view(&state, request.user_id).await
}

/// Remove a product's line from the cart. Removing an absent line is a no-op.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let removed = state
        .backend()
        .carts()
        .remove_line(request.user_id, request.product_id)
        .await?;
    tracing::debug!(removed, "Cart line removal");

    cart_view(&state, request.user_id).await
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    ValidatedPath(user): ValidatedPath<UserId>,
) -> Result<Json<CartView>> {
    let removed = state.backend().carts().clear(user).await?;
    tracing::debug!(removed, "Cart cleared");

    Ok(Json(CartView::empty()))
}
