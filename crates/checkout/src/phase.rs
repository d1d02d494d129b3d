//! Saga phases, used to tag errors, logs and metrics.

use serde::Serialize;

/// The step of `place_order` that was running when something happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Validate,
    CreatePendingOrder,
    CreatePendingPayment,
    GetCart,
    GetProduct,
    ConvertPrice,
    QuoteShipping,
    ConvertShipping,
    RecordItems,
    Charge,
    RecordPayment,
    MarkProcessing,
    MarkFailed,
    ShipOrder,
    RecordShipment,
    EmptyCart,
    SendConfirmation,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Validate => "validate",
            Phase::CreatePendingOrder => "create_pending_order",
            Phase::CreatePendingPayment => "create_pending_payment",
            Phase::GetCart => "get_cart",
            Phase::GetProduct => "get_product",
            Phase::ConvertPrice => "convert_price",
            Phase::QuoteShipping => "quote_shipping",
            Phase::ConvertShipping => "convert_shipping",
            Phase::RecordItems => "record_items",
            Phase::Charge => "charge",
            Phase::RecordPayment => "record_payment",
            Phase::MarkProcessing => "mark_processing",
            Phase::MarkFailed => "mark_failed",
            Phase::ShipOrder => "ship_order",
            Phase::RecordShipment => "record_shipment",
            Phase::EmptyCart => "empty_cart",
            Phase::SendConfirmation => "send_confirmation",
        }
    }

    /// Returns true for phases that run after money has been captured.
    pub fn is_post_charge(&self) -> bool {
        matches!(
            self,
            Phase::RecordPayment
                | Phase::MarkProcessing
                | Phase::ShipOrder
                | Phase::RecordShipment
                | Phase::EmptyCart
                | Phase::SendConfirmation
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
