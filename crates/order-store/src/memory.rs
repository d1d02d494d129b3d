use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use domain::{OrderItem, OrderStatus, PaymentStatus, ShipmentStatus};
use tokio::sync::RwLock;

use crate::{
    OrderId, OrderItemRecord, OrderRecord, PaymentRecord, Result, ShipmentRecord, StoreError,
    store::{OrderStore, validate_items_for_insert, validate_payment_result},
};

/// The write operations of [`OrderStore`], used for failure injection and
/// for inspecting the order in which writes happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    CreatePendingOrder,
    CreatePendingPayment,
    AddOrderItems,
    MarkPaymentResult,
    MarkOrderStatus,
    CreateShipment,
}

/// Default number of writes the inspection log retains.
pub const WRITE_LOG_CAPACITY: usize = 10_000;

#[derive(Debug)]
struct State {
    orders: HashMap<OrderId, OrderRecord>,
    items: HashMap<OrderId, Vec<OrderItemRecord>>,
    payments: HashMap<OrderId, PaymentRecord>,
    shipments: HashMap<OrderId, ShipmentRecord>,
    next_item_id: i64,
    failing: HashSet<StoreOperation>,
    writes: VecDeque<(OrderId, StoreOperation)>,
    write_log_capacity: usize,
}

impl Default for State {
    fn default() -> Self {
        Self {
            orders: HashMap::new(),
            items: HashMap::new(),
            payments: HashMap::new(),
            shipments: HashMap::new(),
            next_item_id: 0,
            failing: HashSet::new(),
            writes: VecDeque::new(),
            write_log_capacity: WRITE_LOG_CAPACITY,
        }
    }
}

impl State {
    /// Appends to the write log, dropping the oldest entry when full.
    fn record(&mut self, order_id: OrderId, op: StoreOperation) {
        if self.write_log_capacity == 0 {
            return;
        }
        while self.writes.len() >= self.write_log_capacity {
            self.writes.pop_front();
        }
        self.writes.push_back((order_id, op));
    }

    fn check_failure(&self, op: StoreOperation) -> Result<()> {
        if self.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn require_order(&self, order_id: OrderId) -> Result<&OrderRecord> {
        self.orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))
    }
}

/// In-memory order store implementation for testing.
///
/// This implementation keeps all rows in memory and enforces the same
/// constraints as the PostgreSQL schema: foreign keys, the quantity check,
/// derived subtotals and cascading deletes.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose write log keeps at most `capacity` entries.
    pub fn with_write_log_capacity(capacity: usize) -> Self {
        let state = State {
            write_log_capacity: capacity,
            ..State::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Makes every subsequent call of `op` fail (or succeed again).
    pub async fn set_fail_on(&self, op: StoreOperation, fail: bool) {
        let mut state = self.state.write().await;
        if fail {
            state.failing.insert(op);
        } else {
            state.failing.remove(&op);
        }
    }

    /// Returns the logged writes for an order, oldest first.
    pub async fn writes_for(&self, order_id: OrderId) -> Vec<StoreOperation> {
        self.state
            .read()
            .await
            .writes
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, op)| *op)
            .collect()
    }

    /// Returns the ids of the orders whose creation is still logged, oldest first.
    pub async fn order_ids(&self) -> Vec<OrderId> {
        self.state
            .read()
            .await
            .writes
            .iter()
            .filter(|(_, op)| *op == StoreOperation::CreatePendingOrder)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Returns the number of order headers stored.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns the number of shipment rows stored.
    pub async fn shipment_count(&self) -> usize {
        self.state.read().await.shipments.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_pending_order(&self, order_id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::CreatePendingOrder)?;

        if state.orders.contains_key(&order_id) {
            return Err(StoreError::AlreadyExists {
                entity: "order",
                order_id,
            });
        }

        let now = Utc::now();
        state.orders.insert(
            order_id,
            OrderRecord {
                id: order_id,
                status: OrderStatus::Pending,
                created_at: now,
                updated_at: now,
            },
        );
        state.record(order_id, StoreOperation::CreatePendingOrder);
        Ok(())
    }

    async fn create_pending_payment(&self, order_id: OrderId) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::CreatePendingPayment)?;
        state.require_order(order_id)?;

        if state.payments.contains_key(&order_id) {
            return Err(StoreError::AlreadyExists {
                entity: "payment",
                order_id,
            });
        }

        state.payments.insert(
            order_id,
            PaymentRecord {
                order_id,
                transaction_id: None,
                status: PaymentStatus::Pending,
                created_at: Utc::now(),
            },
        );
        state.record(order_id, StoreOperation::CreatePendingPayment);
        Ok(())
    }

    async fn add_order_items(&self, order_id: OrderId, items: &[OrderItem]) -> Result<()> {
        validate_items_for_insert(order_id, items)?;

        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::AddOrderItems)?;
        state.require_order(order_id)?;

        // Build every row first so a bad line leaves nothing behind.
        let mut next_id = state.next_item_id;
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            next_id += 1;
            rows.push(OrderItemRecord {
                id: next_id,
                order_id,
                product_id: item.product_id.clone(),
                product_name: item.product_name.clone(),
                unit_price: item.unit_price.clone(),
                quantity: item.quantity,
                subtotal: item.subtotal()?,
            });
        }

        state.next_item_id = next_id;
        state.items.entry(order_id).or_default().extend(rows);
        state.record(order_id, StoreOperation::AddOrderItems);
        Ok(())
    }

    async fn mark_payment_result(
        &self,
        order_id: OrderId,
        transaction_id: Option<&str>,
        status: PaymentStatus,
    ) -> Result<()> {
        validate_payment_result(order_id, transaction_id, status)?;

        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::MarkPaymentResult)?;

        let payment = state
            .payments
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if !payment.status.can_transition_to(status) {
            return Err(StoreError::InvalidPaymentTransition {
                order_id,
                from: payment.status,
                to: status,
            });
        }

        payment.status = status;
        if let Some(transaction_id) = transaction_id {
            payment.transaction_id = Some(transaction_id.to_string());
        }
        state.record(order_id, StoreOperation::MarkPaymentResult);
        Ok(())
    }

    async fn mark_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::MarkOrderStatus)?;

        let order = state
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;

        if !order.status.can_transition_to(status) {
            return Err(StoreError::InvalidOrderTransition {
                order_id,
                from: order.status,
                to: status,
            });
        }

        order.status = status;
        order.updated_at = Utc::now();
        state.record(order_id, StoreOperation::MarkOrderStatus);
        Ok(())
    }

    async fn create_shipment(
        &self,
        order_id: OrderId,
        tracking_id: &str,
        status: ShipmentStatus,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.check_failure(StoreOperation::CreateShipment)?;
        state.require_order(order_id)?;

        let paid = state
            .payments
            .get(&order_id)
            .is_some_and(|p| p.status == PaymentStatus::Success);
        if !paid {
            return Err(StoreError::PaymentNotSettled(order_id));
        }

        if state.shipments.contains_key(&order_id) {
            return Err(StoreError::AlreadyExists {
                entity: "shipment",
                order_id,
            });
        }

        state.shipments.insert(
            order_id,
            ShipmentRecord {
                order_id,
                tracking_id: tracking_id.to_string(),
                status,
                created_at: Utc::now(),
            },
        );
        state.record(order_id, StoreOperation::CreateShipment);
        Ok(())
    }

    async fn delete_order(&self, order_id: OrderId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.orders.remove(&order_id).is_none() {
            return Ok(false);
        }
        state.items.remove(&order_id);
        state.payments.remove(&order_id);
        state.shipments.remove(&order_id);
        state.writes.retain(|(id, _)| *id != order_id);
        Ok(true)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        Ok(self.state.read().await.orders.get(&order_id).cloned())
    }

    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>> {
        Ok(self
            .state
            .read()
            .await
            .items
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_payment(&self, order_id: OrderId) -> Result<Option<PaymentRecord>> {
        Ok(self.state.read().await.payments.get(&order_id).cloned())
    }

    async fn get_shipment(&self, order_id: OrderId) -> Result<Option<ShipmentRecord>> {
        Ok(self.state.read().await.shipments.get(&order_id).cloned())
    }
}
