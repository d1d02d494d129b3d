//! Cart endpoints, used to fill a cart before `POST /orders`.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use checkout::{CheckoutError, Phase};
use domain::{CartItem, ProductId};
use serde::Deserialize;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub quantity: u32,
}

/// GET /carts/{user_id}: lists the lines in the user's cart.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CartItem>>, ApiError> {
    let items = state
        .cart
        .get_cart(&user_id)
        .await
        .map_err(|e| CheckoutError::from_service(Phase::GetCart, e))?;
    Ok(Json(items))
}

/// POST /carts/{user_id}/items: adds a product to the user's cart.
///
/// The product must exist in the catalog. Adding a product already in the
/// cart increases its quantity.
#[tracing::instrument(skip(state, req))]
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<Vec<CartItem>>), ApiError> {
    if req.quantity == 0 {
        return Err(ApiError::BadRequest("quantity must be positive".to_string()));
    }

    let product_id = ProductId::new(req.product_id);
    state
        .catalog
        .get_product(&product_id)
        .await
        .map_err(|e| CheckoutError::from_service(Phase::GetProduct, e))?;

    state
        .cart
        .add_item(&user_id, CartItem::new(product_id, req.quantity))
        .await
        .map_err(|e| CheckoutError::from_service(Phase::GetCart, e))?;

    let items = state
        .cart
        .get_cart(&user_id)
        .await
        .map_err(|e| CheckoutError::from_service(Phase::GetCart, e))?;
    Ok((StatusCode::CREATED, Json(items)))
}
