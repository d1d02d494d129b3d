//! Status state machines for the order aggregate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order header.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Processing ──► Shipped
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order recorded, no money has moved yet.
    #[default]
    Pending,

    /// Payment captured, order is being fulfilled.
    Processing,

    /// Payment was not captured (terminal state).
    Failed,

    /// Goods handed to the carrier (terminal state).
    Shipped,
}

impl OrderStatus {
    /// Statuses an order may be in immediately before moving to `self`.
    pub fn predecessors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[],
            OrderStatus::Processing => &[OrderStatus::Pending],
            OrderStatus::Failed => &[OrderStatus::Pending],
            OrderStatus::Shipped => &[OrderStatus::Processing],
        }
    }

    /// Returns true if an order in `self` may move to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        next.predecessors().contains(self)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Failed | OrderStatus::Shipped)
    }

    /// Returns the persisted status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Failed => "FAILED",
            OrderStatus::Shipped => "SHIPPED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "FAILED" => Ok(OrderStatus::Failed),
            "SHIPPED" => Ok(OrderStatus::Shipped),
            other => Err(DomainError::UnknownStatus {
                kind: "order",
                value: other.to_string(),
            }),
        }
    }
}

/// The status of an order's payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Charge not yet attempted or still in flight.
    #[default]
    Pending,
    /// Charge accepted; a transaction id is recorded.
    Success,
    /// Charge rejected or unreachable.
    Failed,
}

impl PaymentStatus {
    /// Only a pending payment may be settled, exactly once.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Success)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "SUCCESS" => Ok(PaymentStatus::Success),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::UnknownStatus {
                kind: "payment",
                value: other.to_string(),
            }),
        }
    }
}

/// The status of an order's shipment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    #[default]
    Processing,
    Shipped,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Processing => "PROCESSING",
            ShipmentStatus::Shipped => "SHIPPED",
        }
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSING" => Ok(ShipmentStatus::Processing),
            "SHIPPED" => Ok(ShipmentStatus::Shipped),
            other => Err(DomainError::UnknownStatus {
                kind: "shipment",
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_order_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Failed));
        assert!(Processing.can_transition_to(Shipped));

        assert!(!Pending.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Processing.can_transition_to(Failed));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Shipped.can_transition_to(Processing));
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        let all = [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Failed,
            OrderStatus::Shipped,
        ];
        for terminal in all.iter().filter(|s| s.is_terminal()) {
            assert!(all.iter().all(|next| !terminal.can_transition_to(*next)));
        }
    }

    #[test]
    fn test_payment_transitions() {
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Success));
        assert!(PaymentStatus::Pending.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Success.can_transition_to(PaymentStatus::Failed));
        assert!(!PaymentStatus::Failed.can_transition_to(PaymentStatus::Success));
        assert!(!PaymentStatus::Pending.can_transition_to(PaymentStatus::Pending));
    }

    #[test]
    fn test_status_strings_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Failed,
            OrderStatus::Shipped,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!("SUCCESS".parse::<PaymentStatus>().unwrap(), PaymentStatus::Success);
        assert_eq!("SHIPPED".parse::<ShipmentStatus>().unwrap(), ShipmentStatus::Shipped);
        assert!("shipped".parse::<ShipmentStatus>().is_err());
    }

    #[test]
    fn test_serialization_matches_persisted_names() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        let json = serde_json::to_string(&PaymentStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
