//! HTTP API server with observability for the checkout service.
//!
//! Exposes order placement and lookup over REST, plus cart and catalog
//! endpoints backed by in-memory demo collaborators, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;
pub mod seed;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{
    CheckoutOrchestrator, Collaborators, InMemoryCartService, InMemoryCurrencyService,
    InMemoryEmailService, InMemoryPaymentService, InMemoryProductCatalog, InMemoryShippingService,
};
use domain::DomainError;
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Handles to the in-memory collaborators behind the default state.
///
/// Each handle shares its state with the copy wired into the orchestrator.
#[derive(Clone)]
pub struct DemoServices {
    pub cart: InMemoryCartService,
    pub catalog: InMemoryProductCatalog,
    pub currency: InMemoryCurrencyService,
    pub shipping: InMemoryShippingService,
    pub payment: InMemoryPaymentService,
    pub email: InMemoryEmailService,
}

impl DemoServices {
    /// Builds the collaborators seeded with the demo catalog and rate table.
    pub fn seeded() -> Result<Self, DomainError> {
        Ok(Self {
            cart: InMemoryCartService::new(),
            catalog: InMemoryProductCatalog::with_products(seed::demo_products()?),
            currency: InMemoryCurrencyService::with_rates(seed::DEMO_RATES),
            shipping: InMemoryShippingService::new(seed::demo_shipping_quote()?),
            payment: InMemoryPaymentService::new(),
            email: InMemoryEmailService::new(),
        })
    }

    fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Arc::new(self.cart.clone()),
            Arc::new(self.catalog.clone()),
            Arc::new(self.currency.clone()),
            Arc::new(self.shipping.clone()),
            Arc::new(self.payment.clone()),
        )
        .with_email(Arc::new(self.email.clone()))
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/products", get(routes::products::list))
        .route("/carts/{user_id}", get(routes::carts::get))
        .route("/carts/{user_id}/items", post(routes::carts::add_item))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store` with seeded demo collaborators.
pub fn create_default_state(
    store: Arc<dyn OrderStore>,
    config: &Config,
) -> Result<(Arc<AppState>, DemoServices), DomainError> {
    let services = DemoServices::seeded()?;
    let orchestrator =
        CheckoutOrchestrator::new(store.clone(), services.collaborators(), config.checkout_config());

    let state = Arc::new(AppState {
        orchestrator,
        store,
        catalog: Arc::new(services.catalog.clone()),
        cart: Arc::new(services.cart.clone()),
    });

    Ok((state, services))
}

/// Registers help text for the checkout metrics.
pub fn describe_metrics() {
    metrics::describe_counter!("checkout_orders_total", "Orders submitted to the saga");
    metrics::describe_counter!("checkout_orders_completed", "Orders placed successfully");
    metrics::describe_counter!("checkout_orders_failed", "Orders that failed, by phase");
    metrics::describe_histogram!(
        "checkout_duration_seconds",
        metrics::Unit::Seconds,
        "Wall-clock time of one place_order call"
    );
    metrics::describe_counter!(
        "checkout_compensation_failures",
        "FAILED writes that could not be recorded after a charge failure"
    );
    metrics::describe_counter!(
        "checkout_uncompensated_charges",
        "Captured charges whose order could not be completed"
    );
}
