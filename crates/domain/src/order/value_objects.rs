//! Value objects for the checkout domain.

use serde::{Deserialize, Serialize};

use super::money::Money;
use crate::error::DomainError;

/// Product identifier (SKU).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a new product ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the product ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ProductId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProductId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shipping destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: i32,
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, {}, {}, {} {}",
            self.street_address, self.city, self.state, self.country, self.zip_code
        )
    }
}

/// Payment instrument handed to the payment collaborator.
///
/// The card number is masked in `Debug` output so it never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardInfo {
    pub credit_card_number: String,
    pub credit_card_cvv: i32,
    pub credit_card_expiration_year: i32,
    pub credit_card_expiration_month: u32,
}

impl CreditCardInfo {
    /// Returns the last four digits of the card number.
    pub fn last_four(&self) -> &str {
        let digits = self.credit_card_number.trim();
        let start = digits.len().saturating_sub(4);
        digits.get(start..).unwrap_or_default()
    }
}

impl std::fmt::Debug for CreditCardInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditCardInfo")
            .field("credit_card_number", &format_args!("****{}", self.last_four()))
            .field("credit_card_expiration_year", &self.credit_card_expiration_year)
            .field("credit_card_expiration_month", &self.credit_card_expiration_month)
            .finish_non_exhaustive()
    }
}

/// A line in a user's cart, as returned by the cart collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartItem {
    pub fn new(product_id: impl Into<ProductId>, quantity: u32) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A catalog product with its native USD price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price_usd: Money,
    pub categories: Vec<String>,
}

/// A priced order line.
///
/// The subtotal is never stored on the item; it is always derived from the
/// unit price and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// The product identifier.
    pub product_id: ProductId,

    /// Human-readable product name.
    pub product_name: String,

    /// Price per unit, in the order's currency.
    pub unit_price: Money,

    /// Quantity ordered.
    pub quantity: u32,
}

impl OrderItem {
    /// Creates a new order item, rejecting a zero quantity.
    pub fn new(
        product_id: impl Into<ProductId>,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, DomainError> {
        let item = Self {
            product_id: product_id.into(),
            product_name: product_name.into(),
            unit_price,
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    /// Checks the quantity invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.quantity == 0 {
            return Err(DomainError::InvalidQuantity {
                product_id: self.product_id.to_string(),
                quantity: self.quantity,
            });
        }
        Ok(())
    }

    /// Returns the currency of this line.
    pub fn currency_code(&self) -> &str {
        self.unit_price.currency_code()
    }

    /// Returns unit_price × quantity.
    pub fn subtotal(&self) -> Result<Money, DomainError> {
        self.unit_price.multiply(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(number: &str) -> CreditCardInfo {
        CreditCardInfo {
            credit_card_number: number.to_string(),
            credit_card_cvv: 123,
            credit_card_expiration_year: 2039,
            credit_card_expiration_month: 1,
        }
    }

    #[test]
    fn test_product_id_string_conversion() {
        let id = ProductId::new("SKU-001");
        assert_eq!(id.as_str(), "SKU-001");

        let id2: ProductId = "SKU-002".into();
        assert_eq!(id2.as_str(), "SKU-002");
    }

    #[test]
    fn test_card_debug_masks_number() {
        let debug = format!("{:?}", card("4432801561520454"));
        assert!(debug.contains("****0454"));
        assert!(!debug.contains("4432801561520454"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn test_last_four_of_short_number() {
        assert_eq!(card("12").last_four(), "12");
    }

    #[test]
    fn test_order_item_rejects_zero_quantity() {
        let price = Money::from_cents("EUR", 900).unwrap();
        let result = OrderItem::new("P1", "Widget", price, 0);
        assert!(matches!(
            result,
            Err(DomainError::InvalidQuantity { quantity: 0, .. })
        ));
    }

    #[test]
    fn test_order_item_subtotal() {
        let price = Money::from_cents("EUR", 900).unwrap();
        let item = OrderItem::new("P1", "Widget", price, 2).unwrap();
        assert_eq!(item.subtotal().unwrap(), Money::from_cents("EUR", 1800).unwrap());
        assert_eq!(item.currency_code(), "EUR");
    }

    #[test]
    fn test_address_display() {
        let address = Address {
            street_address: "1600 Amphitheatre Parkway".to_string(),
            city: "Mountain View".to_string(),
            state: "CA".to_string(),
            country: "US".to_string(),
            zip_code: 94043,
        };
        assert_eq!(
            address.to_string(),
            "1600 Amphitheatre Parkway, Mountain View, CA, US 94043"
        );
    }

    #[test]
    fn test_order_item_serialization() {
        let price = Money::from_cents("USD", 999).unwrap();
        let item = OrderItem::new("SKU-001", "Widget", price, 2).unwrap();
        let json = serde_json::to_string(&item).unwrap();
        let deserialized: OrderItem = serde_json::from_str(&json).unwrap();
        assert_eq!(item, deserialized);
    }
}
