//! Product catalog browsing.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use checkout::{CheckoutError, Phase};
use domain::Product;
use serde::Deserialize;

use super::orders::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// GET /products: lists the catalog, or searches it when `q` is given.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let result = match params.q.as_deref().map(str::trim) {
        Some(query) if !query.is_empty() => state.catalog.search_products(query).await,
        _ => state.catalog.list_products().await,
    };

    let products = result.map_err(|e| CheckoutError::from_service(Phase::GetProduct, e))?;
    Ok(Json(products))
}
