//! Order confirmation email trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use order_store::OrderId;
use parking_lot::RwLock;

use crate::error::ServiceError;
use crate::request::OrderResult;

/// Trait for notifying users about placed orders.
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryEmailState {
    sent: Vec<(String, OrderId)>,
    fail_on_send: bool,
}

/// In-memory email service that records what it would have sent.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEmailService {
    state: Arc<RwLock<InMemoryEmailState>>,
}

impl InMemoryEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().fail_on_send = fail;
    }

    /// Returns `(recipient, order_id)` for every confirmation sent.
    pub fn sent(&self) -> Vec<(String, OrderId)> {
        self.state.read().sent.clone()
    }
}

#[async_trait]
impl EmailService for InMemoryEmailService {
    async fn send_order_confirmation(
        &self,
        email: &str,
        order: &OrderResult,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.write();
        if state.fail_on_send {
            return Err(ServiceError::Unavailable("email service unreachable".to_string()));
        }
        state.sent.push((email.to_string(), order.order_id));
        Ok(())
    }
}
