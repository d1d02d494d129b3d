//! Order placement and lookup endpoints.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use checkout::{
    CartService, CheckoutOrchestrator, OrderResult, PlaceOrderRequest, ProductCatalogService,
};
use domain::{Money, OrderItem};
use order_store::{OrderAggregate, OrderId, OrderStore, OrderStoreExt};
use serde::Serialize;
use tokio::time::Instant;

use crate::error::ApiError;

/// Header carrying the caller's deadline for `POST /orders`, in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub orchestrator: CheckoutOrchestrator,
    pub store: Arc<dyn OrderStore>,
    pub catalog: Arc<dyn ProductCatalogService>,
    pub cart: Arc<dyn CartService>,
}

// -- Response types --

#[derive(Debug, Serialize)]
pub struct MoneyResponse {
    pub currency_code: String,
    pub units: i64,
    pub nanos: i32,
    pub formatted: String,
}

impl From<&Money> for MoneyResponse {
    fn from(money: &Money) -> Self {
        Self {
            currency_code: money.currency_code().to_string(),
            units: money.units(),
            nanos: money.nanos(),
            formatted: money.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: MoneyResponse,
    pub subtotal: MoneyResponse,
}

impl OrderItemResponse {
    fn from_item(item: &OrderItem) -> Result<Self, ApiError> {
        let subtotal = item
            .subtotal()
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self {
            product_id: item.product_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            unit_price: MoneyResponse::from(&item.unit_price),
            subtotal: MoneyResponse::from(&subtotal),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct OrderPlacedResponse {
    pub order_id: String,
    pub tracking_id: String,
    pub shipping_cost: MoneyResponse,
    pub total: MoneyResponse,
    pub items: Vec<OrderItemResponse>,
}

impl TryFrom<OrderResult> for OrderPlacedResponse {
    type Error = ApiError;

    fn try_from(result: OrderResult) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: result.order_id.to_string(),
            tracking_id: result.tracking_id,
            shipping_cost: MoneyResponse::from(&result.shipping_cost),
            total: MoneyResponse::from(&result.total),
            items: result
                .items
                .iter()
                .map(OrderItemResponse::from_item)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub transaction_id: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ShipmentResponse {
    pub tracking_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
    pub items: Vec<OrderItemResponse>,
    pub payment: Option<PaymentResponse>,
    pub shipment: Option<ShipmentResponse>,
}

impl From<OrderAggregate> for OrderResponse {
    fn from(aggregate: OrderAggregate) -> Self {
        let items = aggregate
            .items
            .into_iter()
            .map(|item| OrderItemResponse {
                product_id: item.product_id.to_string(),
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: MoneyResponse::from(&item.unit_price),
                subtotal: MoneyResponse::from(&item.subtotal),
            })
            .collect();

        Self {
            id: aggregate.order.id.to_string(),
            status: aggregate.order.status.to_string(),
            created_at: aggregate.order.created_at.to_rfc3339(),
            updated_at: aggregate.order.updated_at.to_rfc3339(),
            items,
            payment: aggregate.payment.map(|p| PaymentResponse {
                transaction_id: p.transaction_id,
                status: p.status.to_string(),
            }),
            shipment: aggregate.shipment.map(|s| ShipmentResponse {
                tracking_id: s.tracking_id,
                status: s.status.to_string(),
            }),
        }
    }
}

// -- Handlers --

/// POST /orders: run the checkout saga for the user's cart.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>), ApiError> {
    let result = match request_timeout(&headers)? {
        Some(timeout) => {
            state
                .orchestrator
                .place_order_with_deadline(req, Instant::now() + timeout)
                .await?
        }
        None => state.orchestrator.place_order(req).await?,
    };

    let body = OrderPlacedResponse::try_from(result)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /orders/{id}: load every persisted row of an order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let aggregate = state
        .store
        .load_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order {id} not found")))?;

    Ok(Json(aggregate.into()))
}

fn request_timeout(headers: &HeaderMap) -> Result<Option<Duration>, ApiError> {
    let Some(value) = headers.get(REQUEST_TIMEOUT_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(|ms| Some(Duration::from_millis(ms)))
        .ok_or_else(|| {
            ApiError::BadRequest(format!(
                "{REQUEST_TIMEOUT_HEADER} must be a positive number of milliseconds"
            ))
        })
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    id.parse()
        .map_err(|e| ApiError::BadRequest(format!("Invalid order id: {e}")))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_request_timeout_header() {
        let mut headers = HeaderMap::new();
        assert!(request_timeout(&headers).unwrap().is_none());

        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("250"));
        assert_eq!(
            request_timeout(&headers).unwrap(),
            Some(Duration::from_millis(250))
        );

        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("0"));
        assert!(matches!(
            request_timeout(&headers),
            Err(ApiError::BadRequest(_))
        ));

        headers.insert(REQUEST_TIMEOUT_HEADER, HeaderValue::from_static("soon"));
        assert!(request_timeout(&headers).is_err());
    }

    #[test]
    fn test_parse_order_id() {
        let id = OrderId::new();
        assert_eq!(parse_order_id(&id.to_string()).unwrap(), id);
        assert!(matches!(
            parse_order_id("not-a-uuid"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_money_response_carries_exact_parts() {
        let money = Money::new("EUR", 22, 500_000_000).unwrap();
        let view = MoneyResponse::from(&money);
        assert_eq!(view.currency_code, "EUR");
        assert_eq!(view.units, 22);
        assert_eq!(view.nanos, 500_000_000);
        assert_eq!(view.formatted, "22.50 EUR");
    }
}
