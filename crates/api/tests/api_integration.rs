//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::DemoServices;
use api::config::Config;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::InMemoryOrderStore;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: Router,
    services: DemoServices,
    store: InMemoryOrderStore,
}

fn setup() -> TestApp {
    let store = InMemoryOrderStore::new();
    let (state, services) =
        api::create_default_state(Arc::new(store.clone()), &Config::default()).unwrap();
    let app = api::create_app(state, get_metrics_handle());
    TestApp {
        app,
        services,
        store,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn add_to_cart(&self, user_id: &str, product_id: &str, quantity: u32) {
        let (status, _) = self
            .post(
                &format!("/carts/{user_id}/items"),
                &json!({ "product_id": product_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

fn order_body(user_id: &str, currency: &str) -> Value {
    json!({
        "user_id": user_id,
        "user_currency": currency,
        "address": {
            "street_address": "1600 Amphitheatre Parkway",
            "city": "Mountain View",
            "state": "CA",
            "country": "US",
            "zip_code": 94043
        },
        "credit_card": {
            "credit_card_number": "4432801561520454",
            "credit_card_cvv": 672,
            "credit_card_expiration_year": 2099,
            "credit_card_expiration_month": 1
        },
        "email": "someone@example.com"
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();

    let (status, json) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_list_and_search_products() {
    let app = setup();

    let (status, all) = app.get("/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 8);

    let (status, found) = app.get("/products?q=SUNGLASSES").await;
    assert_eq!(status, StatusCode::OK);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], "OLJCESPC7Z");
}

#[tokio::test]
async fn test_add_to_cart_merges_quantities() {
    let app = setup();

    app.add_to_cart("alice", "OLJCESPC7Z", 1).await;
    app.add_to_cart("alice", "OLJCESPC7Z", 2).await;

    let (status, cart) = app.get("/carts/alice").await;
    assert_eq!(status, StatusCode::OK);
    let lines = cart.as_array().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], 3);
}

#[tokio::test]
async fn test_add_unknown_product_to_cart() {
    let app = setup();

    let (status, json) = app
        .post(
            "/carts/alice/items",
            &json!({ "product_id": "NOPE", "quantity": 1 }),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
    assert_eq!(app.services.cart.line_count("alice"), 0);
}

#[tokio::test]
async fn test_add_zero_quantity_rejected() {
    let app = setup();

    let (status, _) = app
        .post(
            "/carts/alice/items",
            &json!({ "product_id": "OLJCESPC7Z", "quantity": 0 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_order() {
    let app = setup();
    app.add_to_cart("alice", "OLJCESPC7Z", 2).await;

    let (status, json) = app.post("/orders", &order_body("alice", "USD")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(!json["tracking_id"].as_str().unwrap().is_empty());
    assert_eq!(json["items"][0]["subtotal"]["formatted"], "39.98 USD");
    assert_eq!(json["shipping_cost"]["formatted"], "8.99 USD");
    assert_eq!(json["total"]["formatted"], "48.97 USD");
    assert_eq!(json["total"]["units"], 48);
    assert_eq!(json["total"]["nanos"], 970_000_000);

    assert_eq!(app.services.cart.line_count("alice"), 0);
    assert_eq!(app.services.shipping.shipment_count(), 1);
    assert_eq!(app.services.email.sent().len(), 1);
}

#[tokio::test]
async fn test_place_order_in_user_currency() {
    let app = setup();
    app.add_to_cart("bob", "66VCHSJNUP", 1).await;

    let (status, json) = app.post("/orders", &order_body("bob", "EUR")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["items"][0]["unit_price"]["currency_code"], "EUR");
    assert_eq!(json["shipping_cost"]["currency_code"], "EUR");
    assert_eq!(json["total"]["currency_code"], "EUR");
}

#[tokio::test]
async fn test_place_and_get_order() {
    let app = setup();
    app.add_to_cart("carol", "1YMWWN1N4O", 1).await;

    let (_, placed) = app.post("/orders", &order_body("carol", "USD")).await;
    let order_id = placed["order_id"].as_str().unwrap();

    let (status, order) = app.get(&format!("/orders/{order_id}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["id"], order_id);
    assert_eq!(order["status"], "PROCESSING");
    assert_eq!(order["payment"]["status"], "SUCCESS");
    assert!(!order["payment"]["transaction_id"].as_str().unwrap().is_empty());
    assert_eq!(order["shipment"]["status"], "SHIPPED");
    assert_eq!(order["shipment"]["tracking_id"], placed["tracking_id"]);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);
    assert_eq!(order["items"][0]["subtotal"]["formatted"], "109.99 USD");
}

#[tokio::test]
async fn test_get_nonexistent_order() {
    let app = setup();
    let missing = order_store::OrderId::new();

    let (status, json) = app.get(&format!("/orders/{missing}")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "not_found");
}

#[tokio::test]
async fn test_get_order_with_bad_id() {
    let app = setup();

    let (status, json) = app.get("/orders/not-a-uuid").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");
}

#[tokio::test]
async fn test_place_order_with_empty_cart() {
    let app = setup();

    let (status, json) = app.post("/orders", &order_body("dave", "USD")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "empty_cart");
}

#[tokio::test]
async fn test_place_order_with_unsupported_currency() {
    let app = setup();
    app.add_to_cart("erin", "OLJCESPC7Z", 1).await;

    let (status, json) = app.post("/orders", &order_body("erin", "XYZ")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "unsupported_currency");
    assert_eq!(app.services.payment.charge_count(), 0);
}

#[tokio::test]
async fn test_place_order_with_invalid_request() {
    let app = setup();

    let (status, json) = app.post("/orders", &order_body("  ", "USD")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "invalid_request");
    assert_eq!(app.store.order_count().await, 0);
}

#[tokio::test]
async fn test_declined_payment_marks_order_failed() {
    let app = setup();
    app.add_to_cart("frank", "L9ECAV7KIM", 1).await;
    app.services.payment.set_fail_on_charge(true);

    let (status, json) = app.post("/orders", &order_body("frank", "USD")).await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(json["code"], "payment_declined");

    let ids = app.store.order_ids().await;
    assert_eq!(ids.len(), 1);
    let (_, order) = app.get(&format!("/orders/{}", ids[0])).await;
    assert_eq!(order["status"], "FAILED");
    assert_eq!(order["payment"]["status"], "FAILED");
    assert!(order["shipment"].is_null());
    assert_eq!(app.services.cart.line_count("frank"), 1);
}

#[tokio::test]
async fn test_downstream_outage_is_service_unavailable() {
    let app = setup();
    app.add_to_cart("grace", "2ZYFJ3GM2N", 1).await;
    app.services.shipping.set_fail_on_quote(true);

    let (status, json) = app.post("/orders", &order_body("grace", "USD")).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "downstream_unavailable");
    assert_eq!(app.services.payment.charge_count(), 0);
}

#[tokio::test]
async fn test_request_timeout_header() {
    let app = setup();
    app.add_to_cart("heidi", "0PUK6V6EV0", 1).await;

    let request = |timeout: &str| {
        Request::builder()
            .method("POST")
            .uri("/orders")
            .header("content-type", "application/json")
            .header("x-request-timeout-ms", timeout)
            .body(Body::from(order_body("heidi", "USD").to_string()))
            .unwrap()
    };

    let (status, json) = app.send(request("later")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "bad_request");

    let (status, _) = app.send(request("5000")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    app.add_to_cart("ivan", "9SIQT8TOJO", 1).await;
    app.post("/orders", &order_body("ivan", "USD")).await;

    let response = app
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("checkout_orders_total"));
    assert!(text.contains("checkout_duration_seconds"));
}
