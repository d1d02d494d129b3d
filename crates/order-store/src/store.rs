use async_trait::async_trait;
use domain::{OrderItem, OrderStatus, PaymentStatus, ShipmentStatus};

use crate::{
    OrderAggregate, OrderId, OrderItemRecord, OrderRecord, PaymentRecord, Result, ShipmentRecord,
    StoreError,
};

/// Core trait for order store implementations.
///
/// Every write is a single atomic statement against a single table. The
/// store never spans a transaction across writes; callers own the ordering
/// between them and the interpretation of a failure in the middle.
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts the order header in `PENDING`.
    async fn create_pending_order(&self, order_id: OrderId) -> Result<()>;

    /// Inserts the payment row in `PENDING` with no transaction id.
    async fn create_pending_payment(&self, order_id: OrderId) -> Result<()>;

    /// Inserts priced order lines in one statement.
    ///
    /// Quantities must be positive and every line must share one currency.
    /// Subtotals are derived by the store.
    async fn add_order_items(&self, order_id: OrderId, items: &[OrderItem]) -> Result<()>;

    /// Settles a pending payment.
    ///
    /// `Success` requires a non-empty transaction id.
    async fn mark_payment_result(
        &self,
        order_id: OrderId,
        transaction_id: Option<&str>,
        status: PaymentStatus,
    ) -> Result<()>;

    /// Moves the order header to `status`, rejecting non-monotonic transitions.
    async fn mark_order_status(&self, order_id: OrderId, status: OrderStatus) -> Result<()>;

    /// Inserts the shipment row. Fails unless the payment succeeded.
    async fn create_shipment(
        &self,
        order_id: OrderId,
        tracking_id: &str,
        status: ShipmentStatus,
    ) -> Result<()>;

    /// Deletes the order header; child rows cascade.
    ///
    /// Returns false if there was nothing to delete.
    async fn delete_order(&self, order_id: OrderId) -> Result<bool>;

    /// Retrieves the order header.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;

    /// Retrieves order lines in insertion order.
    async fn get_order_items(&self, order_id: OrderId) -> Result<Vec<OrderItemRecord>>;

    /// Retrieves the payment row.
    async fn get_payment(&self, order_id: OrderId) -> Result<Option<PaymentRecord>>;

    /// Retrieves the shipment row.
    async fn get_shipment(&self, order_id: OrderId) -> Result<Option<ShipmentRecord>>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Loads every row of an order, or None if the header does not exist.
    async fn load_order(&self, order_id: OrderId) -> Result<Option<OrderAggregate>> {
        let Some(order) = self.get_order(order_id).await? else {
            return Ok(None);
        };

        Ok(Some(OrderAggregate {
            order,
            items: self.get_order_items(order_id).await?,
            payment: self.get_payment(order_id).await?,
            shipment: self.get_shipment(order_id).await?,
        }))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}

/// Validates order lines before inserting them.
pub fn validate_items_for_insert(order_id: OrderId, items: &[OrderItem]) -> Result<()> {
    let Some(first) = items.first() else {
        return Ok(());
    };

    for item in items {
        if item.quantity == 0 {
            return Err(StoreError::InvalidQuantity {
                product_id: item.product_id.to_string(),
                quantity: item.quantity,
            });
        }
        // Both backends must be able to hold the derived subtotal.
        item.subtotal()?;
        if item.currency_code() != first.currency_code() {
            return Err(StoreError::CurrencyMismatch {
                order_id,
                expected: first.currency_code().to_string(),
                actual: item.currency_code().to_string(),
            });
        }
    }

    Ok(())
}

/// Validates a payment settlement before writing it.
pub fn validate_payment_result(
    order_id: OrderId,
    transaction_id: Option<&str>,
    status: PaymentStatus,
) -> Result<()> {
    if status == PaymentStatus::Success && transaction_id.is_none_or(str::is_empty) {
        return Err(StoreError::MissingTransactionId(order_id));
    }
    if !PaymentStatus::Pending.can_transition_to(status) {
        return Err(StoreError::InvalidPaymentTransition {
            order_id,
            from: PaymentStatus::Pending,
            to: status,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Money;

    fn item(product: &str, currency: &str, quantity: u32) -> OrderItem {
        OrderItem {
            product_id: product.into(),
            product_name: product.to_string(),
            unit_price: Money::from_cents(currency, 100).unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_empty_items_are_valid() {
        assert!(validate_items_for_insert(OrderId::new(), &[]).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = validate_items_for_insert(OrderId::new(), &[item("P1", "EUR", 0)]);
        assert!(matches!(result, Err(StoreError::InvalidQuantity { .. })));
    }

    #[test]
    fn test_mixed_currencies_rejected() {
        let result = validate_items_for_insert(
            OrderId::new(),
            &[item("P1", "EUR", 1), item("P2", "USD", 1)],
        );
        assert!(matches!(result, Err(StoreError::CurrencyMismatch { .. })));
    }

    #[test]
    fn test_high_denomination_amounts_accepted() {
        let line = OrderItem {
            product_id: "P1".into(),
            product_name: "Camera".to_string(),
            unit_price: Money::from_units("VND", 12_500_000_000).unwrap(),
            quantity: 3,
        };
        assert!(validate_items_for_insert(OrderId::new(), &[line]).is_ok());
    }

    #[test]
    fn test_subtotal_overflow_rejected() {
        let line = OrderItem {
            product_id: "P1".into(),
            product_name: "Camera".to_string(),
            unit_price: Money::from_units("VND", i64::MAX).unwrap(),
            quantity: 2,
        };
        assert!(matches!(
            validate_items_for_insert(OrderId::new(), &[line]),
            Err(StoreError::Domain(_))
        ));
    }

    #[test]
    fn test_success_requires_transaction_id() {
        let order_id = OrderId::new();
        assert!(matches!(
            validate_payment_result(order_id, None, PaymentStatus::Success),
            Err(StoreError::MissingTransactionId(_))
        ));
        assert!(matches!(
            validate_payment_result(order_id, Some(""), PaymentStatus::Success),
            Err(StoreError::MissingTransactionId(_))
        ));
        assert!(validate_payment_result(order_id, Some("tx"), PaymentStatus::Success).is_ok());
        assert!(validate_payment_result(order_id, None, PaymentStatus::Failed).is_ok());
    }

    #[test]
    fn test_payment_cannot_be_reset_to_pending() {
        assert!(matches!(
            validate_payment_result(OrderId::new(), None, PaymentStatus::Pending),
            Err(StoreError::InvalidPaymentTransition { .. })
        ));
    }
}
