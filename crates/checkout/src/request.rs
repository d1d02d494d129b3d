//! Input and output of `place_order`.

use domain::{Address, CreditCardInfo, Money, OrderItem};
use order_store::OrderId;
use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// A request to turn a user's cart into a paid, shipped order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrderRequest {
    pub user_id: String,
    pub user_currency: String,
    pub address: Address,
    pub credit_card: CreditCardInfo,
    #[serde(default)]
    pub email: Option<String>,
}

impl PlaceOrderRequest {
    /// Rejects requests that cannot start a saga.
    ///
    /// Currency support is not checked here; that is the currency
    /// collaborator's call and happens after the pending rows exist.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        if self.user_id.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "user_id must not be empty".to_string(),
            ));
        }
        if self.user_currency.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "user_currency must not be empty".to_string(),
            ));
        }
        if self.credit_card.credit_card_number.trim().is_empty() {
            return Err(CheckoutError::InvalidRequest(
                "credit_card_number must not be empty".to_string(),
            ));
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.contains('@')) {
            return Err(CheckoutError::InvalidRequest(format!(
                "invalid email address: {email:?}"
            )));
        }
        Ok(())
    }
}

/// The outcome of a successful `place_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub tracking_id: String,
    /// Shipping cost in the user's currency.
    pub shipping_cost: Money,
    pub items: Vec<OrderItem>,
    /// Amount charged: item subtotals plus shipping.
    pub total: Money,
}
