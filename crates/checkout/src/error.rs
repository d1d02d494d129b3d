//! Checkout error types.

use domain::DomainError;
use order_store::StoreError;
use thiserror::Error;

use crate::phase::Phase;

/// Errors returned by downstream service clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service could not be reached or did not answer in time.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// The requested entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The currency code is not in the service's rate table.
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    /// The charge was refused.
    #[error("Declined: {0}")]
    Declined(String),

    /// The request itself is malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// The single terminal error of a `place_order` call.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A collaborator failed or timed out.
    #[error("{phase}: downstream unavailable: {reason}")]
    DownstreamUnavailable { phase: Phase, reason: String },

    /// A store write or read failed or timed out.
    #[error("{phase}: persistence failure: {source}")]
    PersistenceFailure { phase: Phase, source: StoreError },

    /// A collaborator reported a missing entity.
    #[error("{phase}: not found: {reason}")]
    NotFound { phase: Phase, reason: String },

    /// The requested currency cannot be priced.
    #[error("{phase}: unsupported currency {currency}")]
    UnsupportedCurrency { phase: Phase, currency: String },

    /// The payment collaborator refused the charge.
    #[error("Payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// Money arithmetic failed while pricing the order.
    #[error("{phase}: pricing failed: {source}")]
    Pricing { phase: Phase, source: DomainError },

    /// The user's cart has no items.
    #[error("Cart is empty")]
    EmptyCart,

    /// The request was rejected before any work was done.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CheckoutError {
    /// Maps a collaborator failure observed during `phase`.
    pub fn from_service(phase: Phase, error: ServiceError) -> Self {
        match error {
            ServiceError::Unavailable(reason) => Self::DownstreamUnavailable { phase, reason },
            ServiceError::NotFound(reason) => Self::NotFound { phase, reason },
            ServiceError::UnsupportedCurrency(currency) => {
                Self::UnsupportedCurrency { phase, currency }
            }
            ServiceError::Declined(reason) => Self::PaymentDeclined { reason },
            ServiceError::InvalidArgument(reason) if phase == Phase::Charge => {
                Self::PaymentDeclined { reason }
            }
            ServiceError::InvalidArgument(reason) => Self::DownstreamUnavailable { phase, reason },
        }
    }

    /// Maps a store failure observed during `phase`.
    pub fn from_store(phase: Phase, source: StoreError) -> Self {
        Self::PersistenceFailure { phase, source }
    }

    /// The phase that produced this error.
    pub fn phase(&self) -> Phase {
        match self {
            Self::DownstreamUnavailable { phase, .. }
            | Self::PersistenceFailure { phase, .. }
            | Self::NotFound { phase, .. }
            | Self::UnsupportedCurrency { phase, .. }
            | Self::Pricing { phase, .. } => *phase,
            Self::PaymentDeclined { .. } => Phase::Charge,
            Self::EmptyCart => Phase::GetCart,
            Self::InvalidRequest(_) => Phase::Validate,
        }
    }

    /// Returns true if the error was raised after the charge succeeded.
    pub fn after_charge(&self) -> bool {
        self.phase().is_post_charge()
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
