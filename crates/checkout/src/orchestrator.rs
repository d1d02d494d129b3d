//! The order-placement saga.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use domain::{CartItem, DomainError, Money, OrderItem, OrderStatus, PaymentStatus, ShipmentStatus};
use futures_util::future::try_join_all;
use order_store::{OrderId, OrderStore, StoreError};
use tokio::time::{Instant, timeout_at};

use crate::error::{CheckoutError, Result, ServiceError};
use crate::phase::Phase;
use crate::request::{OrderResult, PlaceOrderRequest};
use crate::services::{
    CartService, CurrencyService, EmailService, PaymentService, ProductCatalogService,
    ShippingService,
};

/// Tunables for the saga.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Deadline applied by `place_order` when the caller gives none.
    pub request_timeout: Duration,

    /// Minimum time granted to the FAILED writes after a charge failure,
    /// even when the request deadline has already passed.
    pub compensation_grace: Duration,

    /// Whether to empty the user's cart after a successful order.
    pub empty_cart_on_success: bool,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            compensation_grace: Duration::from_secs(2),
            empty_cart_on_success: true,
        }
    }
}

/// The downstream services the saga talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub cart: Arc<dyn CartService>,
    pub catalog: Arc<dyn ProductCatalogService>,
    pub currency: Arc<dyn CurrencyService>,
    pub shipping: Arc<dyn ShippingService>,
    pub payment: Arc<dyn PaymentService>,
    /// Confirmation emails are skipped when no email service is wired.
    pub email: Option<Arc<dyn EmailService>>,
}

impl Collaborators {
    pub fn new(
        cart: Arc<dyn CartService>,
        catalog: Arc<dyn ProductCatalogService>,
        currency: Arc<dyn CurrencyService>,
        shipping: Arc<dyn ShippingService>,
        payment: Arc<dyn PaymentService>,
    ) -> Self {
        Self {
            cart,
            catalog,
            currency,
            shipping,
            payment,
            email: None,
        }
    }

    pub fn with_email(mut self, email: Arc<dyn EmailService>) -> Self {
        self.email = Some(email);
        self
    }
}

/// Drives `place_order` across the store and the collaborators.
///
/// Steps run strictly in sequence, except for per-item pricing which runs
/// concurrently. Persisted writes always happen in the order
/// pending rows, items, payment result, order status, shipment. A failed
/// charge marks the payment and order FAILED on a best-effort basis; a
/// failure after a successful charge is returned as-is and nothing is
/// refunded.
pub struct CheckoutOrchestrator {
    store: Arc<dyn OrderStore>,
    services: Collaborators,
    config: CheckoutConfig,
}

impl CheckoutOrchestrator {
    /// Creates a new orchestrator.
    pub fn new(store: Arc<dyn OrderStore>, services: Collaborators, config: CheckoutConfig) -> Self {
        Self {
            store,
            services,
            config,
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Gets the order store the saga writes to.
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Places an order with the configured default deadline.
    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<OrderResult> {
        let deadline = Instant::now() + self.config.request_timeout;
        self.place_order_with_deadline(request, deadline).await
    }

    /// Places an order; every collaborator call and store write must finish
    /// before `deadline`.
    #[tracing::instrument(
        skip(self, request, deadline),
        fields(
            user_id = %request.user_id,
            currency = %request.user_currency,
            order_id = tracing::field::Empty,
        )
    )]
    pub async fn place_order_with_deadline(
        &self,
        request: PlaceOrderRequest,
        deadline: Instant,
    ) -> Result<OrderResult> {
        metrics::counter!("checkout_orders_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.run(&request, deadline).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);

        match &result {
            Ok(order) => {
                metrics::counter!("checkout_orders_completed").increment(1);
                tracing::info!(
                    order_id = %order.order_id,
                    tracking_id = %order.tracking_id,
                    total = %order.total,
                    duration,
                    "order placed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_orders_failed", "phase" => e.phase().as_str())
                    .increment(1);
                tracing::error!(phase = %e.phase(), error = %e, duration, "order failed");
            }
        }

        result
    }

    async fn run(&self, request: &PlaceOrderRequest, deadline: Instant) -> Result<OrderResult> {
        request.validate()?;

        let order_id = OrderId::new();
        tracing::Span::current().record("order_id", tracing::field::display(order_id));

        // 1. Pending rows, before any money moves
        tracing::info!(step = Phase::CreatePendingOrder.as_str(), "saga step started");
        persist(
            Phase::CreatePendingOrder,
            deadline,
            self.store.create_pending_order(order_id),
        )
        .await?;
        persist(
            Phase::CreatePendingPayment,
            deadline,
            self.store.create_pending_payment(order_id),
        )
        .await?;

        // 2. Cart
        tracing::info!(step = Phase::GetCart.as_str(), "saga step started");
        let cart = call(
            Phase::GetCart,
            deadline,
            self.services.cart.get_cart(&request.user_id),
        )
        .await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // 3. Pricing
        tracing::info!(step = Phase::GetProduct.as_str(), lines = cart.len(), "saga step started");
        let items = self
            .price_items(&cart, &request.user_currency, deadline)
            .await?;

        tracing::info!(step = Phase::QuoteShipping.as_str(), "saga step started");
        let quote_usd = call(
            Phase::QuoteShipping,
            deadline,
            self.services.shipping.get_quote(&request.address, &cart),
        )
        .await?;
        let shipping_cost = call(
            Phase::ConvertShipping,
            deadline,
            self.services
                .currency
                .convert(&quote_usd, &request.user_currency),
        )
        .await?;
        ensure_currency(Phase::ConvertShipping, &shipping_cost, &request.user_currency)?;

        let total = order_total(&request.user_currency, &items, &shipping_cost).map_err(
            |source| CheckoutError::Pricing {
                phase: Phase::ConvertShipping,
                source,
            },
        )?;

        // 4. Items
        tracing::info!(step = Phase::RecordItems.as_str(), "saga step started");
        persist(
            Phase::RecordItems,
            deadline,
            self.store.add_order_items(order_id, &items),
        )
        .await?;

        // 5. Charge
        tracing::info!(step = Phase::Charge.as_str(), %total, "saga step started");
        let transaction_id = match call(
            Phase::Charge,
            deadline,
            self.services.payment.charge(&total, &request.credit_card),
        )
        .await
        {
            Ok(transaction_id) => transaction_id,
            Err(e) => {
                tracing::warn!(error = %e, "charge failed, marking order failed");
                self.record_charge_failure(order_id, deadline).await;
                return Err(e);
            }
        };

        // 6. Everything past this point has taken the user's money.
        let fulfilled = self
            .fulfil(order_id, &transaction_id, request, &cart, deadline)
            .await;

        match fulfilled {
            Ok(tracking_id) => {
                let result = OrderResult {
                    order_id,
                    tracking_id,
                    shipping_cost,
                    items,
                    total,
                };
                self.after_success(request, &result, deadline).await;
                Ok(result)
            }
            Err(e) => {
                tracing::error!(
                    %order_id,
                    %transaction_id,
                    phase = %e.phase(),
                    "payment captured but order not completed; no refund issued"
                );
                metrics::counter!("checkout_uncompensated_charges").increment(1);
                Err(e)
            }
        }
    }

    async fn price_items(
        &self,
        cart: &[CartItem],
        currency: &str,
        deadline: Instant,
    ) -> Result<Vec<OrderItem>> {
        try_join_all(
            cart.iter()
                .map(|line| self.price_item(line, currency, deadline)),
        )
        .await
    }

    async fn price_item(
        &self,
        line: &CartItem,
        currency: &str,
        deadline: Instant,
    ) -> Result<OrderItem> {
        let product = call(
            Phase::GetProduct,
            deadline,
            self.services.catalog.get_product(&line.product_id),
        )
        .await?;

        let unit_price = call(
            Phase::ConvertPrice,
            deadline,
            self.services.currency.convert(&product.price_usd, currency),
        )
        .await?;
        ensure_currency(Phase::ConvertPrice, &unit_price, currency)?;

        OrderItem::new(line.product_id.clone(), product.name, unit_price, line.quantity).map_err(
            |source| CheckoutError::Pricing {
                phase: Phase::ConvertPrice,
                source,
            },
        )
    }

    /// Records the charge, then ships and records the shipment.
    async fn fulfil(
        &self,
        order_id: OrderId,
        transaction_id: &str,
        request: &PlaceOrderRequest,
        cart: &[CartItem],
        deadline: Instant,
    ) -> Result<String> {
        tracing::info!(step = Phase::RecordPayment.as_str(), "saga step started");
        persist(
            Phase::RecordPayment,
            deadline,
            self.store
                .mark_payment_result(order_id, Some(transaction_id), PaymentStatus::Success),
        )
        .await?;
        persist(
            Phase::MarkProcessing,
            deadline,
            self.store.mark_order_status(order_id, OrderStatus::Processing),
        )
        .await?;

        tracing::info!(step = Phase::ShipOrder.as_str(), "saga step started");
        let tracking_id = call(
            Phase::ShipOrder,
            deadline,
            self.services.shipping.ship_order(&request.address, cart),
        )
        .await?;

        tracing::info!(step = Phase::RecordShipment.as_str(), "saga step started");
        persist(
            Phase::RecordShipment,
            deadline,
            self.store
                .create_shipment(order_id, &tracking_id, ShipmentStatus::Shipped),
        )
        .await?;

        Ok(tracking_id)
    }

    /// Marks the payment and the order FAILED. Errors are logged only.
    async fn record_charge_failure(&self, order_id: OrderId, deadline: Instant) {
        let deadline = deadline.max(Instant::now() + self.config.compensation_grace);

        if let Err(e) = persist(
            Phase::MarkFailed,
            deadline,
            self.store
                .mark_payment_result(order_id, None, PaymentStatus::Failed),
        )
        .await
        {
            tracing::error!(%order_id, error = %e, "failed to mark payment failed");
            metrics::counter!("checkout_compensation_failures").increment(1);
        }

        if let Err(e) = persist(
            Phase::MarkFailed,
            deadline,
            self.store.mark_order_status(order_id, OrderStatus::Failed),
        )
        .await
        {
            tracing::error!(%order_id, error = %e, "failed to mark order failed");
            metrics::counter!("checkout_compensation_failures").increment(1);
        }
    }

    /// Empties the cart and sends the confirmation. Errors are logged only.
    async fn after_success(
        &self,
        request: &PlaceOrderRequest,
        result: &OrderResult,
        deadline: Instant,
    ) {
        if self.config.empty_cart_on_success {
            let emptied = call(
                Phase::EmptyCart,
                deadline,
                self.services.cart.empty_cart(&request.user_id),
            )
            .await;
            if let Err(e) = emptied {
                tracing::warn!(order_id = %result.order_id, error = %e, "failed to empty cart");
            }
        }

        let (Some(email), Some(service)) = (request.email.as_deref(), &self.services.email) else {
            return;
        };
        if let Err(e) = call(
            Phase::SendConfirmation,
            deadline,
            service.send_order_confirmation(email, result),
        )
        .await
        {
            tracing::warn!(
                order_id = %result.order_id,
                error = %e,
                "failed to send order confirmation"
            );
        }
    }
}

/// Sums the item subtotals and the shipping cost.
fn order_total(
    currency: &str,
    items: &[OrderItem],
    shipping: &Money,
) -> std::result::Result<Money, DomainError> {
    let subtotals = items
        .iter()
        .map(OrderItem::subtotal)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Money::sum(currency, subtotals.iter().chain(std::iter::once(shipping)))
}

/// Rejects a converted amount that is not in the requested currency.
fn ensure_currency(phase: Phase, amount: &Money, currency: &str) -> Result<()> {
    if amount.currency_code() == currency {
        return Ok(());
    }
    Err(CheckoutError::Pricing {
        phase,
        source: DomainError::CurrencyMismatch {
            expected: currency.to_string(),
            actual: amount.currency_code().to_string(),
        },
    })
}

/// Awaits a collaborator call against the deadline.
async fn call<T, F>(phase: Phase, deadline: Instant, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, ServiceError>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(|e| CheckoutError::from_service(phase, e)),
        Err(_) => Err(CheckoutError::DownstreamUnavailable {
            phase,
            reason: "deadline exceeded".to_string(),
        }),
    }
}

/// Awaits a store operation against the deadline.
async fn persist<T, F>(phase: Phase, deadline: Instant, fut: F) -> Result<T>
where
    F: Future<Output = order_store::Result<T>>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(|e| CheckoutError::from_store(phase, e)),
        Err(_) => Err(CheckoutError::from_store(phase, StoreError::Timeout)),
    }
}
