//! Shared identifiers used across the checkout workspace.

pub mod types;

pub use types::OrderId;
